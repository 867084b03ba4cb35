//! Stored-file metadata as seen by the core.
//!
//! Records are owned by the storage adapter; the core only reads them and
//! serialises them into responses. The `(path, key)` pair uniquely
//! identifies a record within a store.

use chrono::{DateTime, Utc};

/// Metadata describing one stored file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileRecord {
    /// Key, unique within `path`.
    pub key: String,

    /// Slash-delimited hierarchical location, without leading or trailing
    /// slashes. The store root is the empty string.
    pub path: String,

    /// Human-readable file name, usually the uploaded filename.
    pub name: String,

    /// Detected media type, if any.
    ///
    /// Best-effort detection; not authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    /// License identifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Owning user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Groups this file belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Keywords attached to this file.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// UTC timestamp when the file was first stored.
    pub created: DateTime<Utc>,

    /// UTC timestamp of the last content or metadata change.
    pub modified: DateTime<Utc>,

    /// Size of the stored content in bytes.
    pub size_bytes: u64,

    /// Free-form metadata supplied by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_absent_optionals() {
        let record = FileRecord {
            key: "report-2015".into(),
            path: "docs/report".into(),
            name: "report-2015.pdf".into(),
            mimetype: None,
            license: None,
            owner: None,
            groups: vec![],
            keywords: vec!["annual".into()],
            created: "2015-02-04T10:00:00Z".parse().unwrap(),
            modified: "2015-02-04T10:00:00Z".parse().unwrap(),
            size_bytes: 12,
            meta: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["key"], "report-2015");
        assert_eq!(json["path"], "docs/report");
        assert!(json.get("mimetype").is_none());
        assert!(json.get("meta").is_none());
    }
}
