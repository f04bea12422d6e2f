use std::collections::HashSet;
use std::sync::{Mutex, PoisonError, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::watch;

use super::{Remote, Row};
use crate::error::RemoteError;

/// Remote operations, for failure injection and call tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    Insert,
    Update,
    Delete,
    Upsert,
}

/// In-process remote used for offline runs and tests.
///
/// Individual operations can be made to fail, and all calls can be held in
/// flight until released.
pub struct MemoryRemote {
    rows: RwLock<Vec<Row>>,
    failing: Mutex<HashSet<Operation>>,
    failing_once: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<Operation>>,
    gate: watch::Sender<bool>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            rows: RwLock::default(),
            failing: Mutex::default(),
            failing_once: Mutex::default(),
            calls: Mutex::default(),
            gate: watch::Sender::new(true),
        }
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn row_date(row: &Row) -> &str {
    row.get("date").and_then(Value::as_str).unwrap_or_default()
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given rows
    pub fn with_rows(rows: Vec<Row>) -> Self {
        let remote = Self::default();
        *remote.rows.write().unwrap_or_else(PoisonError::into_inner) = rows;
        remote
    }

    /// Make every later call of `op` fail until cleared
    pub fn fail(&self, op: Operation) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    /// Make only the next call of `op` fail, decided when the call is made
    pub fn fail_once(&self, op: Operation) {
        self.failing_once
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&op);
    }

    /// Hold every call in flight until [`release`](Self::release)
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Snapshot of stored rows, in storage order
    pub fn rows(&self) -> Vec<Row> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made for `op`
    pub fn calls(&self, op: Operation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    async fn enter(&self, op: Operation) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
        let doomed = self
            .failing_once
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&op);

        let mut gate = self.gate.subscribe();
        // The sender lives as long as self, so this only waits for release
        let _ = gate.wait_for(|open| *open).await;

        let failing = doomed
            || self
                .failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&op);
        if !failing {
            return Ok(());
        }
        match op {
            Operation::FetchAll => Err(RemoteError::Unreachable("connection refused".into())),
            _ => Err(RemoteError::Rejected(
                "new row violates row-level security policy".into(),
            )),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Row>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Remote for MemoryRemote {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, RemoteError>> {
        async move {
            self.enter(Operation::FetchAll).await?;

            let mut rows = self.rows();
            rows.sort_by(|a, b| row_date(b).cmp(row_date(a)));
            Ok(rows.into_iter().map(Value::Object).collect())
        }
        .boxed()
    }

    fn insert(&self, row: Row) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            self.enter(Operation::Insert).await?;

            let mut rows = self.write();
            if let Some(id) = row_id(&row) {
                if rows.iter().any(|r| row_id(r) == Some(id)) {
                    return Err(RemoteError::Rejected(format!(
                        "duplicate key value violates unique constraint (id = {id})"
                    )));
                }
            }
            rows.push(row);
            Ok(())
        }
        .boxed()
    }

    fn update(&self, id: &str, row: Row) -> BoxFuture<'_, Result<(), RemoteError>> {
        let id = id.to_string();

        async move {
            self.enter(Operation::Update).await?;

            let mut rows = self.write();
            match rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())) {
                Some(existing) => {
                    *existing = row;
                    Ok(())
                }
                None => Err(RemoteError::Missing(id)),
            }
        }
        .boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), RemoteError>> {
        let id = id.to_string();

        async move {
            self.enter(Operation::Delete).await?;

            let mut rows = self.write();
            let before = rows.len();
            rows.retain(|r| row_id(r) != Some(id.as_str()));
            if rows.len() == before {
                Err(RemoteError::Missing(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn upsert_many(&self, batch: Vec<Row>) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            self.enter(Operation::Upsert).await?;

            let mut rows = self.write();
            for row in batch {
                let id = row_id(&row).map(str::to_owned);
                match rows.iter_mut().find(|r| row_id(r) == id.as_deref()) {
                    Some(existing) => *existing = row,
                    None => rows.push(row),
                }
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, date: &str) -> Row {
        match json!({ "id": id, "date": date }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_fetch_orders_by_date_desc() {
        let remote = MemoryRemote::with_rows(vec![
            row("1", "2023-01-01"),
            row("2", "2024-06-01"),
            row("3", "2023-09-01"),
        ]);
        let rows = remote.fetch_all().await.unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate() {
        let remote = MemoryRemote::with_rows(vec![row("1", "2024-01-01")]);
        let err = remote.insert(row("1", "2024-02-01")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
        assert_eq!(remote.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let remote = MemoryRemote::new();
        assert!(matches!(
            remote.update("9", row("9", "")).await,
            Err(RemoteError::Missing(id)) if id == "9"
        ));
        assert!(matches!(remote.delete("9").await, Err(RemoteError::Missing(_))));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let remote = MemoryRemote::with_rows(vec![row("1", "2023-01-01")]);
        remote
            .upsert_many(vec![row("1", "2024-01-01"), row("2", "2024-02-01")])
            .await
            .unwrap();
        let rows = remote.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let remote = MemoryRemote::new();
        remote.fail(Operation::FetchAll);
        assert!(matches!(
            remote.fetch_all().await,
            Err(RemoteError::Unreachable(_))
        ));
        remote.recover(Operation::FetchAll);
        assert!(remote.fetch_all().await.unwrap().is_empty());
        assert_eq!(remote.calls(Operation::FetchAll), 2);
    }
}
