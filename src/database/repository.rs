use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{Message, MessageChanges, NewMessage};

const MESSAGE_COLUMNS: &str = "id, body, username, created_at, updated_at";

// `RETURNING` statements are read with `fetch_all` so SQLite steps them to completion
// and commits the autocommit transaction before the connection goes back to the pool.
fn insert_sql() -> String {
    format!(
        "INSERT INTO messages (body, username, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) RETURNING {}",
        MESSAGE_COLUMNS
    )
}

fn single_row<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

/// CRUD access to the `messages` table
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a message; both timestamps start at the same instant
    pub async fn create(&self, new_message: &NewMessage) -> Result<Message, DatabaseError> {
        let now = Utc::now();
        let sql = insert_sql();

        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(&new_message.body)
            .bind(&new_message.username)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        let message = single_row(rows).ok_or(sqlx::Error::RowNotFound)?;

        info!("Created message {} for {}", message.id, message.username);
        Ok(message)
    }

    /// All messages, oldest id first
    pub async fn list_all(&self) -> Result<Vec<Message>, DatabaseError> {
        let sql = format!("SELECT {} FROM messages ORDER BY id ASC", MESSAGE_COLUMNS);
        let messages = sqlx::query_as::<_, Message>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Message>, DatabaseError> {
        let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(single_row(rows))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Message, DatabaseError> {
        self.find(id).await?.ok_or(DatabaseError::NotFound(id))
    }

    /// Replace the body and refresh `updated_at` in a single statement
    pub async fn update(&self, id: i64, changes: &MessageChanges) -> Result<Message, DatabaseError> {
        let sql = format!(
            "UPDATE messages SET body = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
            MESSAGE_COLUMNS
        );

        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(&changes.body)
            .bind(Utc::now())
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let message = single_row(rows).ok_or(DatabaseError::NotFound(id))?;

        info!("Updated message {} for {}", id, message.username);
        Ok(message)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let rows = sqlx::query_scalar::<_, String>("DELETE FROM messages WHERE id = ?1 RETURNING username")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let username = single_row(rows).ok_or(DatabaseError::NotFound(id))?;

        info!("Deleted message {} for {}", id, username);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Remove every message. Ids are still never reused afterwards.
    pub async fn reset(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM messages").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Swap the whole table for `new_message` in one committed transaction.
    /// Returns the number of rows removed and the inserted message.
    pub async fn replace_all(&self, new_message: &NewMessage) -> Result<(u64, Message), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let sql = insert_sql();
        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(&new_message.body)
            .bind(&new_message.username)
            .bind(Utc::now())
            .fetch_all(&mut *tx)
            .await?;
        let message = single_row(rows).ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;

        info!("Replaced {} messages with message {} for {}", removed, message.id, message.username);
        Ok((removed, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::manager::DatabaseManager;
    use std::time::Duration;

    async fn repository() -> MessageRepository {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
        };
        MessageRepository::new(DatabaseManager::connect(&config).await.unwrap())
    }

    fn new_message(body: &str, username: &str) -> NewMessage {
        NewMessage {
            body: body.to_string(),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_equal_timestamps() {
        let repo = repository().await;

        let message = repo.create(&new_message("Hello 👋", "Liza")).await.unwrap();
        assert_eq!(message.id, 1);
        assert_eq!(message.body, "Hello 👋");
        assert_eq!(message.username, "Liza");
        assert_eq!(message.created_at, message.updated_at);

        let stored = repo.get_by_id(message.id).await.unwrap();
        assert_eq!(stored, message);
    }

    #[tokio::test]
    async fn list_all_returns_every_row_in_id_order() {
        let repo = repository().await;
        for i in 0..3 {
            repo.create(&new_message(&format!("body {}", i), "Tester")).await.unwrap();
        }

        let messages = repo.list_all().await.unwrap();
        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_replaces_body_and_keeps_identity() {
        let repo = repository().await;
        let original = repo.create(&new_message("Hello 👋", "Liza")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let changes = MessageChanges { body: "Updated 👋".to_string() };
        let updated = repo.update(original.id, &changes).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.body, "Updated 👋");
        assert_eq!(updated.username, original.username);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let repo = repository().await;
        let changes = MessageChanges { body: "nope".to_string() };

        assert!(repo.find(42).await.unwrap().is_none());
        assert!(matches!(repo.get_by_id(42).await, Err(DatabaseError::NotFound(42))));
        assert!(matches!(repo.update(42, &changes).await, Err(DatabaseError::NotFound(42))));
        assert!(matches!(repo.delete(42).await, Err(DatabaseError::NotFound(42))));
    }

    #[tokio::test]
    async fn delete_removes_row_and_ids_are_not_reused() {
        let repo = repository().await;
        let first = repo.create(&new_message("one", "a")).await.unwrap();

        repo.delete(first.id).await.unwrap();
        assert!(repo.find(first.id).await.unwrap().is_none());

        let second = repo.create(&new_message("two", "b")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn reset_empties_table() {
        let repo = repository().await;
        repo.create(&new_message("one", "a")).await.unwrap();
        repo.create(&new_message("two", "b")).await.unwrap();

        assert_eq!(repo.reset().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_all_leaves_only_the_new_row() {
        let repo = repository().await;
        repo.create(&new_message("one", "a")).await.unwrap();
        repo.create(&new_message("two", "b")).await.unwrap();

        let (removed, message) = repo.replace_all(&new_message("Hello 👋", "Liza")).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.list_all().await.unwrap(), vec![message]);
    }

    #[tokio::test]
    async fn writes_are_durable_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("durable.db").display()),
            max_connections: 2,
            connection_timeout: 5,
        };

        let pool = DatabaseManager::connect(&config).await.unwrap();
        let repo = MessageRepository::new(pool.clone());
        let kept = repo.create(&new_message("kept", "a")).await.unwrap();
        let gone = repo.create(&new_message("gone", "b")).await.unwrap();
        repo.update(kept.id, &MessageChanges { body: "kept 👋".to_string() }).await.unwrap();
        repo.delete(gone.id).await.unwrap();
        DatabaseManager::close(pool).await;

        let reopened = MessageRepository::new(DatabaseManager::connect(&config).await.unwrap());
        let messages = reopened.list_all().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, kept.id);
        assert_eq!(messages[0].body, "kept 👋");
        assert!(!dir.path().join("durable.db-journal").exists());
    }
}
