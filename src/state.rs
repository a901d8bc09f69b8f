use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, gateway::GatewayClient};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: GatewayClient,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let gateway = GatewayClient::new(&config)?;
        Ok(Self {
            orm,
            config: Arc::new(config),
            gateway,
        })
    }
}
