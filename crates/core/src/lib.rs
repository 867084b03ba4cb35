//! Nimbus core
//!
//! This crate holds the criteria-resolution engine of the Nimbus file store:
//! the logic that turns an incoming URI path plus query parameters into a
//! normalized, backend-agnostic search specification, and the router that
//! maps (HTTP verb, first URI segment) onto the storage operations.
//!
//! ## Design principles
//!
//! - All request state is an immutable [`RequestContext`] built once per
//!   incoming call; nothing here is process-global or mutated in place.
//! - Criteria and search specifications are plain values, constructed fresh
//!   per request and discarded when the request completes.
//! - Building a specification is deterministic: identical segments and
//!   parameters always produce structurally equal output.
//! - The core performs no I/O and no retries; every error is terminal for
//!   the current request and carries the offending segment, parameter or
//!   verb.
//!
//! The storage backend itself is an external collaborator reached through
//! the adapter contract in `nimbus-storage`; this crate only describes what
//! to ask it for.

pub mod builder;
pub mod config;
pub mod criteria;
pub mod error;
pub mod model;
pub mod request;
pub mod router;

pub use config::{combine_mode_from_env_value, date_column_from_env_value, ServiceConfig};
pub use criteria::{
    CombineMode, Criterion, DateColumn, DateOperator, SearchSpecification, SetKind, SetTerm,
};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use model::FileRecord;
pub use request::{ParamBag, RequestContext, Verb};
pub use router::{resolve, CreateRequest, Operation, UpdateRequest};
