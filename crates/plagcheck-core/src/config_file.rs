use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, LlmSettings};
use crate::{DEFAULT_TIMEOUT_SECS, ServiceConfig, ServiceType, Settings};

/// Used when neither `--config` nor `CONFIG_PATH` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/services.toml";

const LLM_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// On-disk TOML configuration structure.
/// All sections are optional so partial configs work.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "openai")]
    pub llm: Option<LlmConfig>,
    pub dispatch: Option<DispatchConfig>,
    pub services: Option<ServicesConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub plagiarism_checkers: Vec<ServiceEntry>,
    #[serde(default)]
    pub ai_detectors: Vec<ServiceEntry>,
    #[serde(default)]
    pub rephrasing: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceEntry {
    pub name: Option<String>,
    #[serde(alias = "endpoint")]
    pub api_url: Option<String>,
    #[serde(alias = "credential")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// Config path from `CONFIG_PATH`, else [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> PathBuf {
    std::env::var_os("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read and parse a config file, substituting `${VAR}` from the process environment.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    parse_config(&content, &|name: &str| std::env::var(name).ok())
}

/// Parse TOML text, resolving `${VAR}` placeholders through `lookup`.
pub fn parse_config(
    content: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ConfigFile, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    let mut value = toml::Value::Table(table);
    substitute_env_vars(&mut value, lookup);
    Ok(value.try_into::<ConfigFile>()?)
}

/// Replace every string of exactly the form `${NAME}` with `lookup(NAME)`,
/// or `""` when unset. Walks tables and arrays.
pub fn substitute_env_vars(value: &mut toml::Value, lookup: &dyn Fn(&str) -> Option<String>) {
    match value {
        toml::Value::String(s) => {
            if let Some(name) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
                *s = lookup(name).unwrap_or_default();
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                substitute_env_vars(item, lookup);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                substitute_env_vars(item, lookup);
            }
        }
        _ => {}
    }
}

impl ConfigFile {
    /// Build the immutable settings snapshot, reading the LLM key fallback
    /// from the process environment.
    pub fn into_settings(self) -> Settings {
        self.into_settings_with(&|name: &str| std::env::var(name).ok())
    }

    /// Like [`ConfigFile::into_settings`] with an explicit environment lookup.
    pub fn into_settings_with(self, lookup: &dyn Fn(&str) -> Option<String>) -> Settings {
        let llm = self.llm.unwrap_or_default();
        let api_key = llm
            .api_key
            .filter(|k| !k.is_empty())
            .or_else(|| lookup(LLM_KEY_ENV))
            .unwrap_or_default();

        let timeout_secs = self
            .dispatch
            .and_then(|d| d.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let services = self.services.unwrap_or_default();

        Settings {
            plagiarism: enabled(services.plagiarism_checkers, ServiceType::Plagiarism),
            ai_detection: enabled(services.ai_detectors, ServiceType::AiDetection),
            rephrasing: enabled(services.rephrasing, ServiceType::Rephrasing),
            llm: LlmSettings {
                api_key,
                model: llm.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: llm.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn enabled(entries: Vec<ServiceEntry>, service_type: ServiceType) -> Vec<ServiceConfig> {
    entries
        .into_iter()
        .filter(|e| e.enabled)
        .map(|e| {
            ServiceConfig::new(
                e.name.unwrap_or_else(|| "Unknown Service".to_string()),
                service_type,
                e.api_url.unwrap_or_default(),
                e.api_key.unwrap_or_default(),
            )
        })
        .collect()
}
