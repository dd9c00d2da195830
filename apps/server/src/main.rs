//! Todo Server binary.

use task_store::{FileStorage, LocalTaskStore, SqliteTaskStore};
use todo_server::{
    config::{Config, StoreBackend},
    init_tracing, serve,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %config.store_backend,
        "Starting todo server"
    );

    match config.store_backend {
        StoreBackend::Sqlite => {
            tracing::info!(path = %config.database_path.display(), "Using SQLite task store");
            let store = SqliteTaskStore::open(&config.database_path).await?;
            serve(config, store).await
        }
        StoreBackend::Local => {
            let storage = FileStorage::new(&config.local_storage_dir);
            tracing::info!(
                dir = %storage.dir().display(),
                key = %config.storage_key,
                "Using local document task store"
            );
            let store = LocalTaskStore::with_key(storage, config.storage_key.clone());
            serve(config, store).await
        }
    }
}
