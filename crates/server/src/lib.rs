use std::sync::Arc;

use db::{DBService, DbErr};
use services::services::{
    config::{Config, ConfigError, load_config_from_file},
    events::EventService,
};
use thiserror::Error;
use tokio::sync::RwLock;
use utils::{assets::config_path, msg_store::MsgStore};

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
#[cfg(test)]
pub mod test_support;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct DeploymentImpl {
    config: Arc<RwLock<Config>>,
    db: DBService,
    events: EventService,
}

impl DeploymentImpl {
    pub async fn new() -> Result<Self, DeploymentError> {
        let config = load_config_from_file(&config_path()).await;
        let db = DBService::new().await?;
        let msg_store = Arc::new(MsgStore::new());
        let events = EventService::new(db.clone(), msg_store);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            db,
            events,
        })
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn msg_store(&self) -> &Arc<MsgStore> {
        self.events.msg_store()
    }
}
