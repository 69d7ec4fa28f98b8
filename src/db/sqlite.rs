// Durable store backed by SQLite via sqlx. Records are kept as JSON documents.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{PlayerRecord, Store, StoreError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let mut options = SqlitePoolOptions::new().max_connections(5);
        // Every connection to an in-memory database sees its own empty database,
        // so pin those to a single long-lived connection.
        if database_url.contains(":memory:") {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(database_url).await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS player_records (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl Store for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM player_records WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let data = serde_json::to_string(record)?;
        sqlx::query(
            "INSERT INTO player_records (key, data) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = datetime('now')",
        )
        .bind(record.key())
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM player_records WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<PlayerRecord>, StoreError> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT data FROM player_records ORDER BY updated_at, key")
                .fetch_all(&self.pool)
                .await?;
        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::inventory::PlantInstance;
    use crate::engine::{catalog, ledger::{NewUser, User}};

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn record(id: &str) -> PlayerRecord {
        PlayerRecord::new(User::new(
            id.to_string(),
            NewUser {
                username: id.to_string(),
                email: format!("{id}@example.com"),
                password: "pw".into(),
                birth_date: "2001-02-03".into(),
                wallet_address: "abc123def456".into(),
                telegram_id: Some(5),
                avatar: None,
            },
            chrono::Utc::now(),
        ))
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_record() {
        let store = test_store().await;
        let mut r = record("alice");
        r.inventory
            .push(PlantInstance::from(catalog::find_plant(2).unwrap()));
        store.put(&r).await.unwrap();

        let loaded = store.get("alice").await.unwrap().unwrap();
        assert_eq!(loaded, r);
        assert!(store.get("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let store = test_store().await;
        let mut r = record("alice");
        store.put(&r).await.unwrap();
        r.user.coins = 7;
        store.put(&r).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user.coins, 7);

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
