pub mod router;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, migrate::Migrator};
use std::str::FromStr;
use std::sync::Arc;

pub use router::{ReadTarget, ReplicaRouter, RouteCounters, RouteStats};

pub type DbPool = Arc<Pool<Sqlite>>;

/// Which schema a store carries. Users and chats live on the primary; the
/// message log may live on its own shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Main,
    Messages,
}

async fn open_pool(
    database_url: &str,
    max_connections: u32,
    read_only: bool,
) -> anyhow::Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(!read_only)
        .read_only(read_only);

    // Connections are kept for the life of the process.
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    schema: Schema,
) -> anyhow::Result<DbPool> {
    let pool = open_pool(database_url, max_connections, false).await?;
    run_migrations(&pool, schema).await?;
    Ok(Arc::new(pool))
}

/// Opens a read replica. Replicas are copies of the primary and are never
/// migrated from here.
pub async fn create_replica_pool(database_url: &str, max_connections: u32) -> anyhow::Result<DbPool> {
    let pool = open_pool(database_url, max_connections, true).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &Pool<Sqlite>, schema: Schema) -> anyhow::Result<()> {
    let mut migrator: Migrator = match schema {
        Schema::Main => sqlx::migrate!("./migrations/main"),
        Schema::Messages => sqlx::migrate!("./migrations/messages"),
    };

    // Both schemas may share one database file when no separate shard is
    // configured, so each migrator tolerates the other's history.
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    Ok(())
}
