use std::sync::Arc;

use crate::{
    ai::{AiGateway, provider::{HttpProvider, ModelProvider}},
    config::AppConfig,
    db::OrmConn,
    notify::Notifier,
    storage::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub ai: Arc<AiGateway>,
    pub notifier: Notifier,
    pub images: ImageStore,
}

impl AppState {
    /// Wire every collaborator from configuration. The AI provider client is
    /// built once here and shared read-only afterwards.
    pub fn from_config(config: AppConfig, orm: OrmConn) -> anyhow::Result<Self> {
        let provider: Option<Arc<dyn ModelProvider>> = match HttpProvider::from_config(&config.ai)? {
            Some(client) => Some(Arc::new(client)),
            None => {
                tracing::warn!("AI_API_KEY not set, assistant runs in degraded mode");
                None
            }
        };
        let ai = AiGateway::new(provider, &config.ai.models);
        let notifier = Notifier::from_config(&config.mail)?;
        let images = ImageStore::new(config.static_dir.clone());

        Ok(Self {
            orm,
            config: Arc::new(config),
            ai: Arc::new(ai),
            notifier,
            images,
        })
    }
}
