use anyhow::Context;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Message, MessageRepository, NewMessage};

/// Sample row inserted by `seed`
pub fn sample_message() -> NewMessage {
    NewMessage {
        body: "Hello 👋".to_string(),
        username: "Liza".to_string(),
    }
}

/// Empty the table and insert the sample message
pub async fn seed(repo: &MessageRepository) -> anyhow::Result<Message> {
    let (removed, message) = repo
        .replace_all(&sample_message())
        .await
        .context("failed to seed messages")?;

    tracing::info!("Removed {} messages, seeded message {}", removed, message.id);
    Ok(message)
}

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    let repo = MessageRepository::new(pool.clone());

    let message = seed(&repo).await?;
    println!("Seeded message {} from {}", message.id, message.username);

    DatabaseManager::close(pool).await;
    Ok(())
}
