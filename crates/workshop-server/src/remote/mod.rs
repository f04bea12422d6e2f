//! The remote persistence collaborator.
//!
//! Remotes deal in raw JSON rows in the remote shape; translating to and from
//! [`WorkshopRecord`](workshop_core::WorkshopRecord) happens in the store via
//! `workshop_core::normalize`.

mod memory;
mod postgres;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::RemoteError;

pub use self::memory::{MemoryRemote, Operation};
pub use self::postgres::PgRemote;

/// A row as stored remotely
pub type Row = Map<String, Value>;

/// Row-oriented `workshops` collection keyed by `id`
pub trait Remote: Send + Sync {
    /// Every row, newest `date` first
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, RemoteError>>;

    fn insert(&self, row: Row) -> BoxFuture<'_, Result<(), RemoteError>>;

    /// Overwrite the row with the given id
    fn update(&self, id: &str, row: Row) -> BoxFuture<'_, Result<(), RemoteError>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), RemoteError>>;

    /// Insert rows, replacing any existing row with the same id
    fn upsert_many(&self, rows: Vec<Row>) -> BoxFuture<'_, Result<(), RemoteError>>;
}
