use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::llm::LlmSettings;
use crate::session::DEFAULT_IDLE_TIMEOUT;

/// Environment variable holding the provider credential.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Prefix for environment overrides, e.g. `TENNIS_SERVER__PORT=8000`.
const ENV_PREFIX: &str = "TENNIS";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly Virtual Tennis Assistant. \
Give concise, practical tennis advice (2–3 sentences) about training, \
matches, or improvement. Keep responses simple, helpful, and motivating.";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Model used for replies
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Idle time after which a browser's chats are dropped.
    pub idle_timeout_secs: u64,
    pub prune_interval_secs: u64,
}

impl ChatConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Build the config from defaults, config files, environment and `args`.
    ///
    /// Priority: CLI flag > CLI env var > `TENNIS_*` env > config file >
    /// `./config.*` > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8501)?
            .set_default("server.request_timeout_secs", 120)?
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.temperature", 0.7)?
            .set_default("llm.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("chat.idle_timeout_secs", DEFAULT_IDLE_TIMEOUT.as_secs())?
            .set_default("chat.prune_interval_secs", 60)?
            .add_source(File::with_name("config").required(false));

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}

/// Combine the LLM config with the credential from the environment.
pub fn load_llm_settings(llm: &LlmConfig) -> Result<LlmSettings, ConfigError> {
    let api_key = std::env::var(CREDENTIAL_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(CREDENTIAL_ENV))?;

    Url::parse(&llm.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
        url: llm.base_url.clone(),
        source,
    })?;

    Ok(LlmSettings {
        base_url: llm.base_url.clone(),
        api_key,
        model: llm.model.clone(),
        temperature: llm.temperature,
        system_prompt: llm.system_prompt.clone(),
    })
}
