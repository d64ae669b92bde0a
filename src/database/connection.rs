use mongodb::{Client, Database};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::football_match::COLLECTION;

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.database_url)
        .await
        .map_err(|e| AppError::configuration(format!("Failed to connect to MongoDB: {}", e)))?;

    let db = client.database(&config.database_name);

    // Verify database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            info!("✅ Connected to database: {}", config.database_name);
            info!("📂 Collections found: {:?}", collections);

            if !collections.iter().any(|name| name == COLLECTION) {
                warn!("⚠️ '{}' collection not found, it is created on first sync", COLLECTION);
            }
        }
        Err(e) => {
            warn!("❌ Database '{}' may not exist or is inaccessible: {}", config.database_name, e);
        }
    }

    Ok(db)
}
