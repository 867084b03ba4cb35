//! Nimbus storage
//!
//! This crate defines the contract between the Nimbus core and the
//! pluggable storage backend, and ships the pieces needed to wire one up:
//!
//! - [`StorageAdapter`]: the trait an adapter implements — a single
//!   generic search entry point plus direct key lookups and mutation
//!   entry points. All combinator semantics live in the core's criteria
//!   builder; adapters only evaluate the resolved specification.
//! - [`StorageFacade`]: a stable wrapper around exactly one adapter
//!   instance, selected once at startup and immutable for the process
//!   lifetime. It forwards each resolved operation unchanged.
//! - [`AdapterRegistry`]: maps a configuration-provided identifier to a
//!   statically known constructor, validated against an enumerated
//!   allow-list at startup. No dynamic code loading.
//! - [`MemoryAdapter`]: the built-in reference adapter, content-addressed
//!   and in-memory.
//!
//! ## Consistency
//!
//! Adapters are not assumed to provide atomic metadata-plus-content
//! updates unless they document it. The contract therefore carries an
//! update as one combined call, never as two calls whose partial failure
//! a caller could observe.

mod adapter;
mod facade;
mod memory;
mod registry;

pub use adapter::{FilePayload, StorageAdapter, StoredFile};
pub use facade::StorageFacade;
pub use memory::MemoryAdapter;
pub use registry::{AdapterFactory, AdapterRegistry};

/// Errors surfaced by a storage adapter.
///
/// Opaque from the core's perspective: passed through to the caller as a
/// generic failure, never interpreted or retried.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Failure reported by the backend itself.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// I/O error while talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
