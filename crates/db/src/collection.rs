//! Typed document collection with unique indexes

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::document::{Document, DocumentId, Record, UniqueKey};
use crate::error::StoreError;
use crate::persistence;

struct Inner<D> {
    records: HashMap<DocumentId, Record<D>>,
    unique: HashMap<UniqueKey, DocumentId>,
    next_seq: u64,
}

impl<D: Document> Inner<D> {
    fn empty() -> Self {
        Self {
            records: HashMap::new(),
            unique: HashMap::new(),
            next_seq: 0,
        }
    }

    /// First unique key of `doc` already owned by a document other than `owner`.
    fn conflict(&self, doc: &D, owner: Option<DocumentId>) -> Option<UniqueKey> {
        doc.unique_keys().into_iter().find(|key| match self.unique.get(key) {
            Some(holder) => Some(*holder) != owner,
            None => false,
        })
    }

    fn index(&mut self, record: &Record<D>) {
        for key in record.doc.unique_keys() {
            self.unique.insert(key, record.id);
        }
    }

    fn unindex(&mut self, doc: &D) {
        for key in doc.unique_keys() {
            self.unique.remove(&key);
        }
    }
}

/// A collection of documents of one type.
///
/// All writes go through one lock, and the uniqueness check happens under the
/// same lock as the write, so of two concurrent inserts sharing a unique value
/// exactly one succeeds.
///
/// With a data file every successful mutation rewrites the file before the
/// call returns. If that write fails the in-memory change is rolled back and
/// the caller gets [`StoreError::Unavailable`].
pub struct Collection<D: Document> {
    inner: RwLock<Inner<D>>,
    data_path: Option<PathBuf>,
}

impl<D: Document> Collection<D> {
    /// A collection that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Inner::empty()),
            data_path: None,
        }
    }

    /// Open a collection backed by `data_path`, loading it if the file exists.
    pub async fn open(data_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_path = data_path.as_ref().to_path_buf();
        let mut inner = Inner::empty();

        if let Some(records) = persistence::load::<D>(&data_path).await? {
            for record in records {
                if let Some(key) = inner.conflict(&record.doc, None) {
                    return Err(StoreError::Corrupt {
                        path: data_path,
                        details: format!(
                            "duplicate value '{}' for unique field '{}'",
                            key.value, key.field
                        ),
                    });
                }
                inner.index(&record);
                inner.next_seq = record.seq + 1;
                inner.records.insert(record.id, record);
            }
        }

        tracing::info!(
            target: "bookshelf-db",
            collection = D::COLLECTION,
            path = %data_path.display(),
            documents = inner.records.len(),
            "collection opened"
        );

        Ok(Self {
            inner: RwLock::new(inner),
            data_path: Some(data_path),
        })
    }

    /// Open from `data_path` when given, otherwise in memory.
    pub async fn open_or_in_memory(data_path: Option<&Path>) -> Result<Self, StoreError> {
        match data_path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::in_memory()),
        }
    }

    async fn persist(&self, inner: &Inner<D>) -> Result<(), StoreError> {
        match &self.data_path {
            Some(path) => persistence::save(path, inner.records.values()).await,
            None => Ok(()),
        }
    }

    /// Validate and store a new document, assigning its key and timestamps.
    pub async fn insert(&self, mut doc: D) -> Result<Record<D>, StoreError> {
        doc.normalize();
        doc.validate()?;

        let mut inner = self.inner.write().await;
        if let Some(key) = inner.conflict(&doc, None) {
            return Err(StoreError::Duplicate {
                field: key.field,
                value: key.value,
            });
        }

        let now = OffsetDateTime::now_utc();
        let record = Record {
            id: DocumentId::generate(),
            doc,
            created_at: now,
            updated_at: now,
            seq: inner.next_seq,
        };

        inner.index(&record);
        inner.records.insert(record.id, record.clone());
        inner.next_seq += 1;

        if let Err(e) = self.persist(&inner).await {
            inner.records.remove(&record.id);
            inner.unindex(&record.doc);
            inner.next_seq -= 1;
            return Err(e);
        }

        tracing::debug!(
            target: "bookshelf-db",
            collection = D::COLLECTION,
            id = %record.id,
            "document inserted"
        );

        Ok(record)
    }

    /// Fetch one document by key.
    pub async fn get(&self, id: &DocumentId) -> Result<Record<D>, StoreError> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    /// Every document matching `filter`, sorted by `order`.
    pub async fn find<F, O>(&self, filter: F, order: O) -> Vec<Record<D>>
    where
        F: Fn(&D) -> bool,
        O: Fn(&Record<D>, &Record<D>) -> Ordering,
    {
        let inner = self.inner.read().await;
        let mut matches: Vec<Record<D>> = inner
            .records
            .values()
            .filter(|record| filter(&record.doc))
            .cloned()
            .collect();
        matches.sort_by(|a, b| order(a, b));
        matches
    }

    /// Apply `change` to a copy of the document, then validate and store it.
    ///
    /// The key and `created_at` never change; `updated_at` is bumped. The
    /// stored document is left untouched when validation or the uniqueness
    /// check fails.
    pub async fn update<F>(&self, id: &DocumentId, change: F) -> Result<Record<D>, StoreError>
    where
        F: FnOnce(&mut D),
    {
        let mut inner = self.inner.write().await;
        let current = inner
            .records
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))?;

        let mut doc = current.doc.clone();
        change(&mut doc);
        doc.normalize();
        doc.validate()?;

        if let Some(key) = inner.conflict(&doc, Some(*id)) {
            return Err(StoreError::Duplicate {
                field: key.field,
                value: key.value,
            });
        }

        let updated = Record {
            doc,
            updated_at: OffsetDateTime::now_utc(),
            ..current.clone()
        };

        inner.unindex(&current.doc);
        inner.index(&updated);
        inner.records.insert(*id, updated.clone());

        if let Err(e) = self.persist(&inner).await {
            inner.unindex(&updated.doc);
            inner.index(&current);
            inner.records.insert(*id, current);
            return Err(e);
        }

        tracing::debug!(
            target: "bookshelf-db",
            collection = D::COLLECTION,
            id = %id,
            "document updated"
        );

        Ok(updated)
    }

    /// Delete a document, returning what was stored.
    pub async fn remove(&self, id: &DocumentId) -> Result<Record<D>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .records
            .remove(id)
            .ok_or(StoreError::NotFound(*id))?;
        inner.unindex(&removed.doc);

        if let Err(e) = self.persist(&inner).await {
            inner.index(&removed);
            inner.records.insert(*id, removed);
            return Err(e);
        }

        tracing::debug!(
            target: "bookshelf-db",
            collection = D::COLLECTION,
            id = %id,
            "document removed"
        );

        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}
