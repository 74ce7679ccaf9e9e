use anyhow::Result;

use coursegen::services::youtube::{ApiKeyManager, ApiKeyStatus};

/// Prints the configured YouTube API key pool as the server would see it.
/// Useful for checking a deployment's .env before starting the server.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    println!("Checking YouTube API keys from environment...");

    let manager = ApiKeyManager::from_env();
    let statuses = manager.key_statuses();

    if statuses.is_empty() {
        println!("❌ No YouTube API keys found (YOUTUBE_API_KEY .. YOUTUBE_API_KEY_10)");
        return Ok(());
    }

    for status in &statuses {
        let marker = match status.status {
            ApiKeyStatus::Active => "✅",
            ApiKeyStatus::QuotaExceeded => "⚠️",
            ApiKeyStatus::Error => "❌",
        };
        println!(
            "{} {} ({:?}, {} errors)",
            marker, status.label, status.status, status.error_count
        );
    }

    println!("\n{} keys configured", statuses.len());
    println!(
        "Active keys available: {}",
        if manager.has_active_keys() { "yes" } else { "no" }
    );

    Ok(())
}
