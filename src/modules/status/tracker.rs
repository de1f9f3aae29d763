//! Per-book reading status kept outside the record store.
//!
//! The whole map lives in one JSON object file (`{"<book id>": "lido", ...}`).
//! Reads never fail: a missing, unreadable or corrupt file reads as an empty
//! map. Writes replace the file and are last-write-wins.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::modules::books::models::{ReadingStatus, StatusMap};

pub struct StatusTracker {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_guard: Mutex<()>,
}

impl StatusTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_status(&self, id: &str) -> Option<ReadingStatus> {
        self.snapshot().await.get(id).copied()
    }

    /// Record `status` for `id`; `None` forgets the entry.
    pub async fn set_status(&self, id: &str, status: Option<ReadingStatus>) {
        let _guard = self.write_guard.lock().await;
        let mut map = self.snapshot().await;

        let changed = match status {
            Some(status) => map.insert(id.to_string(), status) != Some(status),
            None => map.remove(id).is_some(),
        };
        if !changed {
            return;
        }

        if let Err(err) = self.persist(&map).await {
            tracing::error!(
                path = %self.path.display(),
                book_id = id,
                error = %err,
                "failed to save reading status"
            );
        } else {
            tracing::debug!(book_id = id, status = ?status, "reading status saved");
        }
    }

    /// Drop any entry for `id`.
    pub async fn invalidate(&self, id: &str) {
        self.set_status(id, None).await;
    }

    /// The whole map as currently stored.
    pub async fn snapshot(&self) -> StatusMap {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return StatusMap::new(),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "reading-status store unreadable, treating as empty"
                );
                return StatusMap::new();
            }
        };

        if raw.trim().is_empty() {
            return StatusMap::new();
        }

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(entries) => parse_entries(entries),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "reading-status store corrupt, treating as empty"
                );
                StatusMap::new()
            }
        }
    }

    async fn persist(&self, map: &StatusMap) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(map).map_err(std::io::Error::other)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await
    }
}

/// Keep well-formed entries; `null` means "no status", unknown labels are dropped.
fn parse_entries(entries: Map<String, Value>) -> StatusMap {
    entries
        .into_iter()
        .filter_map(|(id, value)| match value {
            Value::Null => None,
            Value::String(label) => match label.parse() {
                Ok(status) => Some((id, status)),
                Err(err) => {
                    tracing::warn!(book_id = %id, error = %err, "skipping reading-status entry");
                    None
                }
            },
            other => {
                tracing::warn!(book_id = %id, value = %other, "skipping reading-status entry");
                None
            }
        })
        .collect()
}
