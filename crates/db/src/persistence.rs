//! Data file format and atomic writes

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::document::{Document, Record};
use crate::error::StoreError;

/// Borrowed view of a collection, written in insertion order.
#[derive(Serialize)]
struct SnapshotRef<'a, D> {
    collection: &'a str,
    records: Vec<&'a Record<D>>,
}

#[derive(Deserialize)]
struct Snapshot<D> {
    collection: String,
    records: Vec<Record<D>>,
}

/// Read the records stored at `path`, or `None` if there is no data file yet.
///
/// Records come back in their original insertion order with sequence numbers
/// reassigned from 0.
pub(crate) async fn load<D: Document>(path: &Path) -> Result<Option<Vec<Record<D>>>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let snapshot: Snapshot<D> =
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    if snapshot.collection != D::COLLECTION {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            details: format!(
                "holds collection '{}', expected '{}'",
                snapshot.collection,
                D::COLLECTION
            ),
        });
    }

    let mut records = snapshot.records;
    for (seq, record) in records.iter_mut().enumerate() {
        record.seq = seq as u64;
    }

    Ok(Some(records))
}

/// Serialize `records` (any order) and replace the data file at `path`.
pub(crate) async fn save<'a, D, I>(path: &Path, records: I) -> Result<(), StoreError>
where
    D: Document,
    I: IntoIterator<Item = &'a Record<D>>,
{
    let mut records: Vec<&Record<D>> = records.into_iter().collect();
    records.sort_by_key(|record| record.seq);

    let data = serde_json::to_vec_pretty(&SnapshotRef {
        collection: D::COLLECTION,
        records,
    })?;

    atomic_write(path, &data)
        .await
        .map_err(|source| StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Write data to a file atomically
///
/// The data goes to a sibling temp file which is synced and then renamed over
/// the target, so the target is never left partially written.
async fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await
}
