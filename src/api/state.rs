use std::sync::Arc;

use crate::{chat::ChatService, config::store::StudyModeConfig};

pub struct AppState {
    pub config: StudyModeConfig,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(config: StudyModeConfig) -> anyhow::Result<Arc<Self>> {
        let chat = ChatService::new(&config)?;

        Ok(Self::with_service(config, chat))
    }

    pub fn with_service(config: StudyModeConfig, chat: ChatService) -> Arc<Self> {
        Arc::new(Self { config, chat })
    }
}
