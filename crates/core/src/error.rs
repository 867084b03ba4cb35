//! Core error types.
//!
//! Every failure in the criteria engine is terminal for the current request
//! and carries enough detail to reproduce it: the offending segment,
//! parameter or verb. Transports map [`ErrorKind`] onto status codes; the
//! core never retries.

/// Broad classification of a [`CoreError`], used by transports to pick a
/// status code without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required configuration missing or invalid; fatal at startup.
    Configuration,
    /// Malformed request input; the request is aborted with no partial
    /// results.
    Input,
    /// Empty resource path, or zero matching records for a direct lookup.
    NotFound,
    /// HTTP verb outside the recognised set.
    Method,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Startup configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A dispatch keyword was given without its required segment,
    /// e.g. `by-name` with nothing after it.
    #[error("'{keyword}' requires a {expected} segment")]
    MissingSegment {
        keyword: &'static str,
        expected: &'static str,
    },

    /// A date segment or parameter did not parse.
    #[error("unparseable date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// `BEFORE` and `AFTER` were supplied together on a single-date query.
    #[error("the BEFORE and AFTER flags are mutually exclusive")]
    ConflictingDateFlags,

    /// A cross-dimension mode value other than `AND` or `OR`.
    #[error("invalid combination mode '{0}' (expected AND or OR)")]
    InvalidMode(String),

    /// An advanced-search parameter name outside the recognised set.
    #[error("unknown search parameter '{0}'")]
    UnknownParameter(String),

    /// The free-form `meta` parameter was not valid JSON.
    #[error("invalid 'meta' parameter: {0}")]
    InvalidMeta(#[source] serde_json::Error),

    /// A mutating verb arrived without the positional key segment.
    #[error("{verb} requires a key segment")]
    MissingKey { verb: &'static str },

    /// A read arrived with no URI segments at all.
    #[error("empty resource path")]
    EmptyResourcePath,

    /// A direct (path, key) lookup matched nothing.
    #[error("no file at path '{path}' with key '{key}'")]
    NoSuchFile { path: String, key: String },

    /// The HTTP method is not one of GET, POST, PUT, DELETE, OPTIONS.
    #[error("unrecognized method: {0}")]
    UnrecognizedMethod(String),
}

impl CoreError {
    /// The broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Configuration(_) => ErrorKind::Configuration,
            CoreError::MissingSegment { .. }
            | CoreError::InvalidDate(_)
            | CoreError::ConflictingDateFlags
            | CoreError::InvalidMode(_)
            | CoreError::UnknownParameter(_)
            | CoreError::InvalidMeta(_)
            | CoreError::MissingKey { .. } => ErrorKind::Input,
            CoreError::EmptyResourcePath | CoreError::NoSuchFile { .. } => ErrorKind::NotFound,
            CoreError::UnrecognizedMethod(_) => ErrorKind::Method,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_follow_classification() {
        assert_eq!(
            CoreError::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            CoreError::MissingSegment {
                keyword: "by-name",
                expected: "name"
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(CoreError::EmptyResourcePath.kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::NoSuchFile {
                path: "a/b".into(),
                key: "k".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::UnrecognizedMethod("PATCH".into()).kind(),
            ErrorKind::Method
        );
    }

    #[test]
    fn messages_carry_the_offending_detail() {
        let err = CoreError::InvalidDate("not-a-date".into());
        assert!(err.to_string().contains("not-a-date"));

        let err = CoreError::UnknownParameter("colour".into());
        assert!(err.to_string().contains("colour"));

        let err = CoreError::UnrecognizedMethod("PATCH".into());
        assert!(err.to_string().contains("PATCH"));
    }
}
