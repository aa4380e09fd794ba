use anyhow::Context;
use clap::Parser;
use common::config::Settings;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 30;

/// Prepares the Eventisa database: waits for it, applies migrations and
/// optionally publishes events that were created before moderation existed.
#[derive(Debug, Parser)]
#[command(name = "setup")]
struct Args {
    /// Overrides `database.url` from the configuration.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Extra TOML configuration file layered over the defaults.
    #[arg(long, env = "EVENTISA_CONFIG_PATH")]
    config: Option<String>,

    /// Mark every pending event as approved after migrating.
    #[arg(long)]
    approve_existing: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("setup=info,common=info")),
        )
        .init();

    tracing::info!("Starting Setup...");

    let settings =
        Settings::with_config_file(args.config.clone()).context("Failed to load config")?;
    let db_url = args
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url.clone());

    let db = wait_for_db(&db_url).await?;

    tracing::info!("Running migrations...");
    Migrator::up(&db, None).await?;
    tracing::info!("Migrations applied.");

    if args.approve_existing {
        approve_existing(db, &settings).await?;
    }

    tracing::info!("Setup completed successfully!");
    Ok(())
}

async fn approve_existing(db: DatabaseConnection, settings: &Settings) -> anyhow::Result<()> {
    let (_repos, services) = common::build_all(Arc::new(db), settings).await;
    let changed = services
        .event_service
        .approve_existing()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to approve existing events: {}", e.message))?;
    tracing::info!("Approved {} pending events.", changed);
    Ok(())
}

async fn wait_for_db(url: &str) -> anyhow::Result<DatabaseConnection> {
    tracing::info!("Connecting to database at {}...", url);
    let mut attempt = 1;
    loop {
        match Database::connect(url).await {
            Ok(db) => {
                tracing::info!("Database connected!");
                return Ok(db);
            }
            Err(e) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to DB after {} attempts: {}",
                        MAX_ATTEMPTS,
                        e
                    ));
                }
                tracing::warn!(
                    "Failed to connect to DB (attempt {}): {}. Retrying in 2s...",
                    attempt,
                    e
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::parse_from(["setup", "--approve-existing", "--database-url", "sqlite::memory:"]);
        assert!(args.approve_existing);
        assert_eq!(args.database_url.as_deref(), Some("sqlite::memory:"));

        let args = Args::parse_from(["setup", "--database-url", "x", "--config", "setup.toml"]);
        assert!(!args.approve_existing);
        assert_eq!(args.config.as_deref(), Some("setup.toml"));
    }

    #[tokio::test]
    async fn migrates_and_approves_on_memory_db() {
        let db = wait_for_db("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        approve_existing(db, &Settings::default()).await.unwrap();
    }
}
