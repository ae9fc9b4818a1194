use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::db::{FileStore, KvStore, Store};
use crate::error::AppError;
use crate::services::{ApprovalService, PhotoStore};

#[derive(Clone)]
pub struct AppState {
    pub approvals: Arc<ApprovalService>,
    pub photos: PhotoStore,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Opens the configured backend and runs startup maintenance:
    /// plain-text passwords are hashed and the configured admin is created.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match config.backend {
            StoreBackend::File => Arc::new(FileStore::open(&config.data_dir).await?),
            StoreBackend::Kv => Arc::new(KvStore::connect(&config.database_url).await?),
        };
        info!("using {:?} store", config.backend);

        let approvals = ApprovalService::new(store, config.bcrypt_cost);

        let rehashed = approvals.hash_plaintext_passwords().await?;
        if rehashed > 0 {
            info!("hashed {} plain-text passwords", rehashed);
        }
        if let Some((sid, password)) = &config.admin {
            approvals.ensure_admin(sid, password).await?;
        }

        Ok(Self {
            approvals: Arc::new(approvals),
            photos: PhotoStore::open(&config.uploads_dir).await?,
            static_dir: config.static_dir.clone(),
        })
    }
}
