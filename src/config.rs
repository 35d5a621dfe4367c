use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::Validate;
use crate::core::SanitizerPolicy;

/// Environment variables consulted, in order, when no key is configured
const CREDENTIAL_FALLBACKS: [&str; 2] = ["OPENAI_API_KEY", "GPT_KEY"];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerSettings,
    #[serde(default)]
    #[validate(nested)]
    pub advisor: AdvisorSettings,
    #[serde(default)]
    #[validate(nested)]
    pub recommendations: RecommendationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[validate(range(min = 1))]
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Connection details for the advisory model
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdvisorSettings {
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,
    #[serde(default = "default_model")]
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl AdvisorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_temperature() -> f64 { 0.1 }
fn default_timeout_secs() -> u64 { 30 }

/// Output shape of a recommendation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecommendationSettings {
    /// Number of recommendations returned (the deployed forms use 2 or 4)
    #[serde(default = "default_result_count")]
    #[validate(range(min = 1, max = 5))]
    pub result_count: usize,
    #[serde(default = "default_adjust_limit")]
    #[validate(range(max = 100))]
    pub adjust_limit: u8,
    #[serde(default = "default_mixergy_penalty")]
    #[validate(range(max = 100))]
    pub mixergy_penalty: u8,
}

impl RecommendationSettings {
    pub fn policy(&self) -> SanitizerPolicy {
        SanitizerPolicy {
            result_count: self.result_count,
            adjust_limit: self.adjust_limit,
            mixergy_penalty: self.mixergy_penalty,
        }
    }
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            result_count: default_result_count(),
            adjust_limit: default_adjust_limit(),
            mixergy_penalty: default_mixergy_penalty(),
        }
    }
}

fn default_result_count() -> usize { 4 }
fn default_adjust_limit() -> u8 { 10 }
fn default_mixergy_penalty() -> u8 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with SURVEY_BRAIN__)
    /// 4. OPENAI_API_KEY / GPT_KEY when no advisor key is set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SURVEY_BRAIN__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        Self::from_config(resolve_credential(settings)?)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        Self::from_config(resolve_credential(settings)?)
    }

    /// Deserialize and validate an already layered configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;
        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("SURVEY_BRAIN")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Fill `advisor.api_key` from the conventional variables when it is unset
fn resolve_credential(settings: Config) -> Result<Config, ConfigError> {
    let configured = settings.get_string("advisor.api_key").ok();

    match pick_api_key(configured.clone(), |name| std::env::var(name).ok()) {
        Some(key) if Some(&key) != configured.as_ref() => Config::builder()
            .add_source(settings)
            .set_override("advisor.api_key", key)?
            .build(),
        _ => Ok(settings),
    }
}

fn pick_api_key(
    configured: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let non_blank = |key: &String| !key.trim().is_empty();

    configured.filter(non_blank).or_else(|| {
        CREDENTIAL_FALLBACKS
            .iter()
            .find_map(|name| lookup(name).filter(non_blank))
    })
}
