use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Record, StoreError, StoreResult, Table};

/// In-memory table backed by an insertion-ordered vector.
pub struct MemoryTable<T> {
    name: &'static str,
    rows: RwLock<Vec<T>>,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(Vec::new()),
        }
    }

    fn not_found(&self, id: &str) -> StoreError {
        StoreError::NotFound {
            table: self.name,
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl<T: Record> Table<T> for MemoryTable<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn list(&self) -> Vec<T> {
        self.rows.read().await.clone()
    }

    async fn get(&self, id: &str) -> StoreResult<T> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> Option<T> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| predicate(row))
            .cloned()
    }

    async fn insert(&self, record: T) -> StoreResult<T> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id() == record.id()) {
            return Err(StoreError::Duplicate {
                table: self.name,
                id: record.id().to_string(),
            });
        }
        rows.push(record.clone());
        tracing::debug!(table = self.name, id = record.id(), "record inserted");
        Ok(record)
    }

    async fn replace(&self, id: &str, record: T) -> StoreResult<T> {
        if record.id() != id {
            return Err(StoreError::IdMismatch {
                table: self.name,
                id: id.to_string(),
                replacement: record.id().to_string(),
            });
        }

        let mut rows = self.rows.write().await;
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| self.not_found(id))?;
        *slot = record.clone();
        tracing::debug!(table = self.name, id, "record replaced");
        Ok(record)
    }

    async fn remove(&self, id: &str) -> StoreResult<T> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| self.not_found(id))?;
        let removed = rows.remove(index);
        tracing::debug!(table = self.name, id, "record removed");
        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        label: String,
    }

    impl Record for Row {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str, label: &str) -> Row {
        Row {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let table = MemoryTable::new("rows");
        table.insert(row("b", "second")).await.unwrap();
        table.insert(row("a", "first")).await.unwrap();
        table.insert(row("c", "third")).await.unwrap();

        let ids: Vec<String> = table.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let table = MemoryTable::new("rows");
        table.insert(row("a", "one")).await.unwrap();
        let err = table.insert(row("a", "two")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { table: "rows", .. }));
        assert_eq!(table.get("a").await.unwrap().label, "one");
    }

    #[tokio::test]
    async fn replace_keeps_position_and_rejects_new_id() {
        let table = MemoryTable::new("rows");
        table.insert(row("a", "one")).await.unwrap();
        table.insert(row("b", "two")).await.unwrap();

        table.replace("a", row("a", "uno")).await.unwrap();
        let rows = table.list().await;
        assert_eq!(rows[0], row("a", "uno"));

        let err = table.replace("a", row("z", "zed")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdMismatch { .. }));

        let err = table.replace("missing", row("missing", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn remove_is_terminal() {
        let table = MemoryTable::new("rows");
        table.insert(row("a", "one")).await.unwrap();

        assert_eq!(table.remove("a").await.unwrap(), row("a", "one"));
        assert!(table.is_empty().await);
        assert!(matches!(
            table.remove("a").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn find_returns_first_match() {
        let table = MemoryTable::new("rows");
        table.insert(row("a", "Fantasia")).await.unwrap();
        table.insert(row("b", "fantasia")).await.unwrap();

        let found = table
            .find(&|r: &Row| r.label.eq_ignore_ascii_case("FANTASIA"))
            .await
            .unwrap();
        assert_eq!(found.id, "a");
        assert!(table.find(&|r: &Row| r.label == "Terror").await.is_none());
    }
}
