//! Built-in in-memory storage adapter.
//!
//! Records are keyed by `(path, key)`; content is held in a separate
//! content-addressed blob store (SHA-256), so identical payloads are
//! stored once and a reference-only delete (`keep_bytes`) can drop the
//! record while the bytes survive.
//!
//! This adapter also serves as the reference implementation of the
//! search semantics: per-dimension AND/OR with negation always
//! subtracting, inclusive date ranges, cross-dimension combination,
//! "empty specification means all records", and whole-specification
//! inversion.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};

use nimbus_core::{
    CombineMode, CreateRequest, Criterion, DateColumn, DateOperator, FileRecord,
    SearchSpecification, SetKind, UpdateRequest,
};

use crate::adapter::{FilePayload, StorageAdapter, StoredFile};
use crate::AdapterError;

struct Entry {
    record: FileRecord,
    hash: String,
}

#[derive(Default)]
struct Store {
    /// Records ordered by (path, key); search results inherit this order.
    records: BTreeMap<(String, String), Entry>,
    /// Content-addressed blobs: SHA-256 hex digest → bytes.
    blobs: HashMap<String, Vec<u8>>,
}

impl Store {
    fn store_blob(&mut self, bytes: Vec<u8>) -> String {
        let hash = hex::encode(Sha256::digest(&bytes));
        self.blobs.entry(hash.clone()).or_insert(bytes);
        hash
    }

    /// Drop a blob unless another record still references it.
    fn release_blob(&mut self, hash: &str) {
        let referenced = self.records.values().any(|e| e.hash == hash);
        if !referenced {
            self.blobs.remove(hash);
        }
    }
}

/// In-memory storage adapter.
#[derive(Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        // Lock poisoning only happens after a panic in this module; the
        // store contains no invariants a read could observe broken.
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn get_by_key(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Option<StoredFile>, AdapterError> {
        let store = self.read();
        let Some(entry) = store.records.get(&(path.to_string(), key.to_string())) else {
            return Ok(None);
        };
        let bytes = store.blobs.get(&entry.hash).cloned().ok_or_else(|| {
            AdapterError::Backend(format!("missing blob {} for {}/{}", entry.hash, path, key))
        })?;
        Ok(Some(StoredFile {
            record: entry.record.clone(),
            bytes,
        }))
    }

    async fn search(&self, spec: &SearchSpecification) -> Result<Vec<FileRecord>, AdapterError> {
        let store = self.read();
        Ok(store
            .records
            .values()
            .filter(|e| record_matches(&e.record, spec))
            .map(|e| e.record.clone())
            .collect())
    }

    async fn add_file(
        &self,
        payload: FilePayload,
        request: &CreateRequest,
    ) -> Result<FileRecord, AdapterError> {
        let mut store = self.write();

        let key = request
            .key
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let slot = (request.path.clone(), key.clone());
        if store.records.contains_key(&slot) {
            return Err(AdapterError::Backend(format!(
                "a file already exists at '{}' with key '{}'",
                request.path, key
            )));
        }

        let name = request
            .name
            .clone()
            .or_else(|| payload.filename.clone())
            .unwrap_or_else(|| key.clone());
        let mimetype = detect_mimetype(&payload.bytes);
        let size_bytes = payload.bytes.len() as u64;
        let hash = store.store_blob(payload.bytes);
        let now = Utc::now();

        let record = FileRecord {
            key,
            path: request.path.clone(),
            name,
            mimetype,
            license: request.license.clone(),
            owner: None,
            groups: request.groups.clone(),
            keywords: request.keywords.clone(),
            created: now,
            modified: now,
            size_bytes,
            meta: request.meta.clone(),
        };

        store.records.insert(
            slot,
            Entry {
                record: record.clone(),
                hash,
            },
        );
        Ok(record)
    }

    async fn update_by_key(
        &self,
        payload: Option<FilePayload>,
        request: &UpdateRequest,
    ) -> Result<Option<FileRecord>, AdapterError> {
        let mut store = self.write();
        let slot = (request.path.clone(), request.key.clone());
        if !store.records.contains_key(&slot) {
            return Ok(None);
        }

        // Content replacement first, so a dropped old blob can be released.
        let mut new_content: Option<(String, u64, Option<String>)> = None;
        if let Some(payload) = payload {
            let mimetype = detect_mimetype(&payload.bytes);
            let size = payload.bytes.len() as u64;
            let hash = store.store_blob(payload.bytes);
            new_content = Some((hash, size, mimetype));
        }

        let mut released: Option<String> = None;
        let record = {
            // Still under the same write lock, so the slot is still there.
            let Some(entry) = store.records.get_mut(&slot) else {
                return Ok(None);
            };

            if let Some((hash, size, mimetype)) = new_content {
                if entry.hash != hash {
                    released = Some(entry.hash.clone());
                }
                entry.hash = hash;
                entry.record.size_bytes = size;
                entry.record.mimetype = mimetype;
            }
            if let Some(name) = &request.name {
                entry.record.name = name.clone();
            }
            if let Some(keywords) = &request.keywords {
                entry.record.keywords = keywords.clone();
            }
            if let Some(groups) = &request.groups {
                entry.record.groups = groups.clone();
            }
            if let Some(license) = &request.license {
                entry.record.license = Some(license.clone());
            }
            if let Some(meta) = &request.meta {
                entry.record.meta = Some(meta.clone());
            }
            entry.record.modified = Utc::now();
            entry.record.clone()
        };

        if let Some(old_hash) = released {
            store.release_blob(&old_hash);
        }
        Ok(Some(record))
    }

    async fn delete_by_key(
        &self,
        path: &str,
        key: &str,
        keep_bytes: bool,
    ) -> Result<Option<FileRecord>, AdapterError> {
        let mut store = self.write();
        let Some(entry) = store.records.remove(&(path.to_string(), key.to_string())) else {
            return Ok(None);
        };
        if !keep_bytes {
            store.release_blob(&entry.hash);
        }
        Ok(Some(entry.record))
    }

    async fn attributes_by_key(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Option<FileRecord>, AdapterError> {
        let store = self.read();
        Ok(store
            .records
            .get(&(path.to_string(), key.to_string()))
            .map(|e| e.record.clone()))
    }
}

/// Best-effort media type detection from content.
fn detect_mimetype(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|t| t.mime_type().to_string())
}

/// Evaluate a whole specification against one record.
fn record_matches(record: &FileRecord, spec: &SearchSpecification) -> bool {
    // No criteria at all means "all records".
    let base = if spec.criteria.is_empty() {
        true
    } else {
        match spec.mode {
            CombineMode::And => spec.criteria.iter().all(|c| criterion_matches(record, c)),
            CombineMode::Or => spec.criteria.iter().any(|c| criterion_matches(record, c)),
        }
    };

    if spec.inverse {
        !base
    } else {
        base
    }
}

fn criterion_matches(record: &FileRecord, criterion: &Criterion) -> bool {
    match criterion {
        Criterion::Name { pattern, strict } => {
            if *strict {
                record.name == *pattern
            } else {
                record
                    .name
                    .to_lowercase()
                    .contains(&pattern.to_lowercase())
            }
        }
        Criterion::Path { path, recursive } => {
            if record.path == *path {
                return true;
            }
            if !recursive {
                return false;
            }
            path.is_empty() || record.path.starts_with(&format!("{path}/"))
        }
        Criterion::Set { kind, terms, mode } => {
            let values = match kind {
                SetKind::Keyword => &record.keywords,
                SetKind::Group => &record.groups,
            };
            set_matches(values, terms, *mode)
        }
        Criterion::User { user } => record.owner.as_deref() == Some(user.as_str()),
        Criterion::Mimetype { mimetype } => {
            record.mimetype.as_deref() == Some(mimetype.as_str())
        }
        Criterion::License { license } => {
            record.license.as_deref() == Some(license.as_str())
        }
        Criterion::Date {
            column,
            from,
            to,
            operator,
        } => {
            let date = match column {
                DateColumn::Created => record.created.date_naive(),
                DateColumn::Modified => record.modified.date_naive(),
            };
            match (from, to) {
                // Both bounds: inclusive range, operator ignored.
                (Some(from), Some(to)) => *from <= date && date <= *to,
                (Some(bound), None) | (None, Some(bound)) => match operator {
                    DateOperator::Eq => date == *bound,
                    DateOperator::Lt => date < *bound,
                    DateOperator::Gt => date > *bound,
                },
                // No bounds constrain nothing.
                (None, None) => true,
            }
        }
    }
}

fn set_matches(values: &[String], terms: &[nimbus_core::SetTerm], mode: CombineMode) -> bool {
    let has = |term: &str| values.iter().any(|v| v == term);

    // Negation always subtracts, independent of the mode.
    if terms.iter().any(|t| t.negated && has(&t.term)) {
        return false;
    }

    let positives: Vec<_> = terms.iter().filter(|t| !t.negated).collect();
    match mode {
        CombineMode::And => positives.iter().all(|t| has(&t.term)),
        // An empty positive set under OR is "no constraint from positive
        // terms", not "match nothing".
        CombineMode::Or => positives.is_empty() || positives.iter().any(|t| has(&t.term)),
    }
}
