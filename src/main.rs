use std::path::PathBuf;

use study_mode::{api, config::store::StudyModeConfig, utils::log::Logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logger::init(Logger::level_from_env());

    let path = std::env::var("STUDY_MODE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = StudyModeConfig::load(path)?;

    api::serve(config).await
}
