use crate::config::AppConfig;
use crate::services::storage::StorageService;
use crate::utils::keyed_mutex::KeyedMutex;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod bulk;
pub mod delete;
pub mod tree;
pub mod types;
pub mod upload;

pub use types::BulkOutcome;

pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
    bulk_lock: KeyedMutex,
}

impl FileService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            storage,
            config,
            bulk_lock: KeyedMutex::new(),
        }
    }
}
