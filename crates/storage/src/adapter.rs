//! The storage adapter contract.

use async_trait::async_trait;
use nimbus_core::{CreateRequest, FileRecord, SearchSpecification, UpdateRequest};

use crate::AdapterError;

/// A file payload travelling with a create or update operation.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    /// Uploaded filename, when the transport knows one (multipart field).
    pub filename: Option<String>,
}

impl FilePayload {
    pub fn new(bytes: Vec<u8>, filename: Option<String>) -> Self {
        Self { bytes, filename }
    }
}

/// A record together with its stored content.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub record: FileRecord,
    pub bytes: Vec<u8>,
}

/// The contract every storage backend implements.
///
/// Direct lookups return `None` when `(path, key)` matches nothing; the
/// caller decides how "not found" is reported. `search` accepts any
/// specification, including the empty one (all records), and returns
/// records in a stable order.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Retrieve one file and its content by `(path, key)`.
    async fn get_by_key(&self, path: &str, key: &str)
        -> Result<Option<StoredFile>, AdapterError>;

    /// Evaluate a resolved search specification.
    async fn search(&self, spec: &SearchSpecification) -> Result<Vec<FileRecord>, AdapterError>;

    /// Store a new file. When the request carries no key the adapter
    /// assigns one; the returned record carries the final key.
    async fn add_file(
        &self,
        payload: FilePayload,
        request: &CreateRequest,
    ) -> Result<FileRecord, AdapterError>;

    /// Replace content (when a payload is present) and/or metadata of an
    /// existing file, as one combined operation. Returns the updated
    /// record, or `None` when `(path, key)` matches nothing.
    async fn update_by_key(
        &self,
        payload: Option<FilePayload>,
        request: &UpdateRequest,
    ) -> Result<Option<FileRecord>, AdapterError>;

    /// Remove a file reference. With `keep_bytes` the stored content
    /// survives; otherwise it is removed once no other record refers to
    /// it. Returns the removed record, or `None` when nothing matched.
    async fn delete_by_key(
        &self,
        path: &str,
        key: &str,
        keep_bytes: bool,
    ) -> Result<Option<FileRecord>, AdapterError>;

    /// Metadata-only read: the record without its content.
    async fn attributes_by_key(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Option<FileRecord>, AdapterError>;
}
