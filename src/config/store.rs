use anyhow::bail;

use super::structure::{StudyModeConfigInner, StudyModeConfigTOML};
use crate::chat::client::providers::Provider;
use std::{
    fmt::Display,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Debug)]
pub struct StudyModeConfig {
    pub path: PathBuf,
    cached: StudyModeConfigTOML,
}

impl StudyModeConfig {
    /// Reads the TOML file and layers environment overrides on top.
    pub fn load(path: PathBuf) -> Result<Self, anyhow::Error> {
        let mut config = Self::read(path)?;
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn read(path: PathBuf) -> Result<Self, anyhow::Error> {
        let path = match path.is_dir() {
            true => path.join("config.toml"),
            false => path,
        };

        if !path.exists() {
            return Self::new(path);
        }

        if !path.is_file() {
            bail!(
                "Given path exists and is not a file... either change the path or delete the file."
            );
        }

        let config_str = std::fs::read_to_string(&path)?;

        let config = Self {
            path,
            cached: toml::from_str(&config_str)?,
        };
        config.rate_limit.window()?;

        Ok(config)
    }

    /// Builds a config that never touches the disk.
    pub fn in_memory(inner: StudyModeConfigInner) -> Self {
        Self {
            path: PathBuf::new(),
            cached: StudyModeConfigTOML { config: inner },
        }
    }

    fn new(path: PathBuf) -> Result<Self, anyhow::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let config = Self {
            path,
            cached: StudyModeConfigTOML::default(),
        };

        config.save()?;
        log::info!("wrote default config to {}", config.path.display());

        Ok(config)
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        std::fs::write(&self.path, toml::to_string(&self.cached)?)?;

        Ok(())
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = var("AI_PROVIDER") {
            match Provider::try_from(provider.clone()) {
                Ok(provider) => self.llm.provider = provider,
                Err(why) => log::warn!("ignoring AI_PROVIDER={provider}: {why}"),
            }
        }

        let (key_var, model_var) = match self.llm.provider {
            Provider::OpenAI => ("OPENAI_API_KEY", "OPENAI_MODEL"),
            Provider::Anthropic => ("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL"),
            Provider::Mock => ("", ""),
        };

        if !key_var.is_empty() {
            if let Some(api_key) = var(key_var) {
                self.llm.api_key = api_key;
            }
            if let Some(model) = var(model_var) {
                self.llm.model = Some(model);
            }
        }

        if let Some(url) = var("AI_BASE_URL") {
            self.llm.base_url = Some(url);
        }

        if let Some(path) = var("CONTENT_BASE_PATH") {
            self.content.base_path = PathBuf::from(path);
        }

        if let Some(limit) = parse_var(&var, "RATE_LIMIT_REQUESTS_PER_HOUR") {
            self.rate_limit.max_requests = limit;
        }

        if let Some(port) = parse_var(&var, "PORT") {
            self.server.port = port;
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content.base_path
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = var(key)?;
    raw.trim()
        .parse()
        .map_err(|e| log::warn!("Invalid {key} value {raw:?}: {e}"))
        .ok()
}

impl Deref for StudyModeConfig {
    type Target = StudyModeConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.cached.config
    }
}

impl DerefMut for StudyModeConfig {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cached.config
    }
}

impl Clone for StudyModeConfig {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            cached: self.cached.clone(),
        }
    }
}

impl PartialEq for StudyModeConfig {
    fn eq(&self, other: &Self) -> bool {
        self.cached.config == other.cached.config
    }
}
