// Storage layer: a key/value store of player records, keyed by user id.
//
// Game logic only talks to the `Store` trait; the backing implementation is
// picked at startup (transient memory, or SQLite via sqlx).

mod memory;
mod sqlite;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::engine::garden::Garden;
use crate::engine::inventory::Inventory;
use crate::engine::ledger::User;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Everything the game knows about one player, stored as a unit.
///
/// A record written without a garden or inventory gets fresh ones when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub user: User,
    #[serde(default)]
    pub garden: Garden,
    #[serde(default)]
    pub inventory: Inventory,
}

impl PlayerRecord {
    /// A freshly registered player: new garden, empty inventory.
    pub fn new(user: User) -> Self {
        Self {
            user,
            garden: Garden::new(),
            inventory: Inventory::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.user.id
    }
}

/// Get/put/delete by key, plus a full scan for the email and Telegram lookups.
pub trait Store: Send + Sync + 'static {
    fn get(&self, key: &str)
        -> impl Future<Output = Result<Option<PlayerRecord>, StoreError>> + Send;

    fn put(&self, record: &PlayerRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns whether a record was removed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<PlayerRecord>, StoreError>> + Send;
}

/// The store chosen at startup.
pub enum StoreBackend {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl StoreBackend {
    /// SQLite when a database URL is configured, otherwise a transient memory store.
    pub async fn connect(database_url: Option<&str>) -> Result<Self, StoreError> {
        match database_url {
            Some(url) => Ok(StoreBackend::Sqlite(SqliteStore::new(url).await?)),
            None => Ok(StoreBackend::Memory(MemoryStore::new())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory(_) => "memory",
            StoreBackend::Sqlite(_) => "sqlite",
        }
    }
}

impl Store for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<PlayerRecord>, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.get(key).await,
            StoreBackend::Sqlite(s) => s.get(key).await,
        }
    }

    async fn put(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(s) => s.put(record).await,
            StoreBackend::Sqlite(s) => s.put(record).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.delete(key).await,
            StoreBackend::Sqlite(s) => s.delete(key).await,
        }
    }

    async fn list(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.list().await,
            StoreBackend::Sqlite(s) => s.list().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ledger::NewUser;

    #[test]
    fn test_record_without_garden_or_inventory_gets_defaults() {
        let user = User::new(
            "u1".into(),
            NewUser {
                username: "ann".into(),
                email: "ann@example.com".into(),
                password: "pw".into(),
                birth_date: "1999-09-09".into(),
                wallet_address: "abc123def456".into(),
                telegram_id: None,
                avatar: None,
            },
            chrono::Utc::now(),
        );
        let json = serde_json::json!({ "user": user });
        let record: PlayerRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.garden, Garden::new());
        assert!(record.inventory.is_empty());
        assert_eq!(record.key(), "u1");
    }

    #[tokio::test]
    async fn test_backend_selection() {
        let memory = StoreBackend::connect(None).await.unwrap();
        assert_eq!(memory.name(), "memory");
        let sqlite = StoreBackend::connect(Some("sqlite::memory:")).await.unwrap();
        assert_eq!(sqlite.name(), "sqlite");
        assert!(sqlite.list().await.unwrap().is_empty());
    }
}
