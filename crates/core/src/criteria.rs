//! Criteria model: filter dimensions and their combinators.
//!
//! A [`Criterion`] describes one filter dimension applied to file records;
//! a [`SearchSpecification`] is the fully resolved, backend-agnostic query
//! handed to the storage adapter. These are plain values with structural
//! equality: building them from the same inputs always yields equal
//! results, which is what makes criteria resolution testable.
//!
//! # Combinator semantics
//!
//! - Inside a [`Criterion::Set`], `mode` combines the non-negated terms:
//!   AND requires all of them present, OR requires at least one. Negated
//!   terms always subtract, independent of the mode — a list containing
//!   only negated terms under OR reduces to "none of these present".
//! - Across criteria, [`SearchSpecification::mode`] combines the
//!   dimensions the same way.
//! - [`SearchSpecification::inverse`] asks the backend for the logical NOT
//!   of the whole specification.
//!
//! An empty specification means "all records"; it is never an error.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How several terms or criteria combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineMode {
    And,
    Or,
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMode::And => write!(f, "AND"),
            CombineMode::Or => write!(f, "OR"),
        }
    }
}

impl FromStr for CombineMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(CombineMode::And),
            "OR" => Ok(CombineMode::Or),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// Which record set a [`Criterion::Set`] filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetKind {
    Keyword,
    Group,
}

/// One term of a set criterion. `negated` terms must be absent from the
/// record, whatever the combination mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTerm {
    pub term: String,
    pub negated: bool,
}

impl SetTerm {
    pub fn wanted(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            negated: false,
        }
    }

    pub fn negated(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            negated: true,
        }
    }
}

/// Which date column a [`Criterion::Date`] compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateColumn {
    Created,
    Modified,
}

impl FromStr for DateColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(DateColumn::Created),
            "modified" => Ok(DateColumn::Modified),
            other => Err(CoreError::Configuration(format!(
                "invalid date column '{other}' (expected 'created' or 'modified')"
            ))),
        }
    }
}

/// Comparison applied when a date criterion carries a single bound.
/// Ignored when both bounds are present (the range is inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateOperator {
    Eq,
    Lt,
    Gt,
}

/// One filter dimension applied to file records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Match on the file name. `strict` compares for equality; otherwise
    /// the pattern is a case-insensitive substring.
    Name { pattern: String, strict: bool },

    /// Match on the storage path; `recursive` includes descendants.
    Path { path: String, recursive: bool },

    /// Match on keyword or group membership.
    Set {
        kind: SetKind,
        terms: Vec<SetTerm>,
        mode: CombineMode,
    },

    /// Exact match on the owning user.
    User { user: String },

    /// Exact match on the media type.
    Mimetype { mimetype: String },

    /// Exact match on the license.
    License { license: String },

    /// Match on a date column. With both bounds set the inclusive range
    /// `[from, to]` applies and `operator` is ignored; with a single bound
    /// the operator selects `=`, `<` or `>`.
    Date {
        column: DateColumn,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        operator: DateOperator,
    },
}

/// The fully resolved query handed to the storage adapter.
///
/// `mode` combines the criteria across dimensions (distinct from the
/// per-dimension mode inside a set criterion). `inverse` requests the
/// logical NOT of the whole specification. No criteria at all means
/// "all records".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpecification {
    pub criteria: Vec<Criterion>,
    pub mode: CombineMode,
    pub inverse: bool,
}

impl SearchSpecification {
    /// An empty specification: matches every record.
    pub fn all() -> Self {
        Self {
            criteria: Vec::new(),
            mode: CombineMode::And,
            inverse: false,
        }
    }

    /// A specification carrying exactly one criterion.
    pub fn single(criterion: Criterion) -> Self {
        Self {
            criteria: vec![criterion],
            mode: CombineMode::And,
            inverse: false,
        }
    }

    pub fn with_mode(mut self, mode: CombineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    /// Flip the inversion flag for the request being built.
    pub fn set_inverse(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_mode_parses_case_insensitively() {
        assert_eq!("AND".parse::<CombineMode>().unwrap(), CombineMode::And);
        assert_eq!("or".parse::<CombineMode>().unwrap(), CombineMode::Or);
        assert!(matches!(
            "XOR".parse::<CombineMode>(),
            Err(CoreError::InvalidMode(m)) if m == "XOR"
        ));
    }

    #[test]
    fn date_column_parses() {
        assert_eq!("created".parse::<DateColumn>().unwrap(), DateColumn::Created);
        assert_eq!("Modified".parse::<DateColumn>().unwrap(), DateColumn::Modified);
        assert!("touched".parse::<DateColumn>().is_err());
    }

    #[test]
    fn empty_specification_is_valid_and_matches_all() {
        let spec = SearchSpecification::all();
        assert!(spec.is_empty());
        assert!(!spec.inverse);
    }

    #[test]
    fn specifications_compare_structurally() {
        let a = SearchSpecification::single(Criterion::Name {
            pattern: "report".into(),
            strict: false,
        });
        let b = SearchSpecification::single(Criterion::Name {
            pattern: "report".into(),
            strict: false,
        });
        assert_eq!(a, b);

        let c = SearchSpecification::single(Criterion::Name {
            pattern: "report".into(),
            strict: true,
        });
        assert_ne!(a, c);
    }
}
