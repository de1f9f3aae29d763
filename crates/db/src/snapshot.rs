//! JSON snapshot loading used to seed tables at startup.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{StoreError, StoreResult};

/// Read a JSON array of records from `path`.
///
/// A missing file yields an empty list; unreadable or malformed files are errors.
pub async fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> StoreResult<Vec<T>> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %shown, "snapshot file not found, nothing to load");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::SnapshotIo {
                path: shown,
                source,
            })
        }
    };

    let records: Vec<T> =
        serde_json::from_str(&raw).map_err(|source| StoreError::SnapshotFormat {
            path: shown.clone(),
            source,
        })?;

    tracing::info!(path = %shown, records = records.len(), "snapshot loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        id: String,
    }

    #[tokio::test]
    async fn loads_array_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"[{"id":"2"},{"id":"1"}]"#).unwrap();

        let entries: Vec<Entry> = load_json(&path).await.unwrap();
        assert_eq!(
            entries,
            vec![
                Entry {
                    id: "2".to_string()
                },
                Entry {
                    id: "1".to_string()
                }
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<Entry> = load_json(dir.path().join("absent.json")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_json::<Entry>(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::SnapshotFormat { .. }));
    }
}
