//! Document trait, keys, and stored records

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ValidationErrors;

/// Opaque store-assigned document key.
///
/// Keys are UUIDv7 so they sort roughly by creation time, but callers must not
/// rely on that; the record's `created_at` is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a key received from a caller. Anything that is not a UUID is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A `(field, value)` pair that must be unique across a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Schema hooks for a type stored in a [`Collection`](crate::Collection).
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name used in logs and the data file header
    const COLLECTION: &'static str;

    /// Canonicalize field values before validation (e.g. trimming).
    fn normalize(&mut self) {}

    /// Check every field constraint, reporting all violations at once.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Values that must not appear in any other document of the collection.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// A document as held by the store: key, timestamps, and the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<D> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub doc: D,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Insertion order within the collection; not part of the wire format.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl<D> Record<D> {
    /// Position of this record in insertion order. Later inserts compare greater.
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_generated_keys() {
        let id = DocumentId::generate();
        assert_eq!(DocumentId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(DocumentId::parse("not-a-key"), None);
        assert_eq!(DocumentId::parse(""), None);
        assert_eq!(DocumentId::parse("64b7f0c2e1a2b3c4d5e6f708"), None);
    }
}
