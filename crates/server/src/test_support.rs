use std::sync::Arc;

use db::DBService;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use services::services::{config::Config, events::EventService};
use tokio::sync::RwLock;
use utils::msg_store::MsgStore;

use crate::DeploymentImpl;

/// In-memory deployment for router tests.
pub async fn test_deployment() -> DeploymentImpl {
    let pool = Database::connect("sqlite::memory:").await.unwrap();
    db_migration::Migrator::up(&pool, None).await.unwrap();
    let db = DBService { pool };

    let msg_store = Arc::new(MsgStore::new());
    let events = EventService::new(db.clone(), msg_store);

    DeploymentImpl {
        config: Arc::new(RwLock::new(Config::default())),
        db,
        events,
    }
}
