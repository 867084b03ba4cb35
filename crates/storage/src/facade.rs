//! Stable facade over exactly one storage adapter.

use std::sync::Arc;

use nimbus_core::{CreateRequest, FileRecord, SearchSpecification, UpdateRequest};

use crate::adapter::{FilePayload, StorageAdapter, StoredFile};
use crate::AdapterError;

/// Wraps the adapter chosen at startup and forwards each resolved
/// operation unchanged. The facade performs no filtering of its own —
/// combinator semantics are settled before a specification reaches it —
/// and the adapter choice is immutable for the process lifetime.
#[derive(Clone)]
pub struct StorageFacade {
    adapter: Arc<dyn StorageAdapter>,
}

impl StorageFacade {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn get_by_key(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Option<StoredFile>, AdapterError> {
        self.adapter.get_by_key(path, key).await
    }

    pub async fn search(
        &self,
        spec: &SearchSpecification,
    ) -> Result<Vec<FileRecord>, AdapterError> {
        self.adapter.search(spec).await
    }

    pub async fn add_file(
        &self,
        payload: FilePayload,
        request: &CreateRequest,
    ) -> Result<FileRecord, AdapterError> {
        self.adapter.add_file(payload, request).await
    }

    pub async fn update_by_key(
        &self,
        payload: Option<FilePayload>,
        request: &UpdateRequest,
    ) -> Result<Option<FileRecord>, AdapterError> {
        self.adapter.update_by_key(payload, request).await
    }

    pub async fn delete_by_key(
        &self,
        path: &str,
        key: &str,
        keep_bytes: bool,
    ) -> Result<Option<FileRecord>, AdapterError> {
        self.adapter.delete_by_key(path, key, keep_bytes).await
    }

    pub async fn attributes_by_key(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Option<FileRecord>, AdapterError> {
        self.adapter.attributes_by_key(path, key).await
    }
}
