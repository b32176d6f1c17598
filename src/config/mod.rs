//! Configuration module for the feedback reporter
//!
//! Supports layered configuration for:
//! - Feedback endpoint and network settings (TOML file, environment, CLI)
//! - Multi-command CLI (submit, config)

use crate::error::{FeedbackError, FeedbackResult};
use crate::transport::{ProxyHttpConnectionFactory, ProxySettings};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Local placeholder used when nothing else is configured.
/// Deployments set the real endpoint via config file, env or `--endpoint`.
pub const DEFAULT_ENDPOINT: &str = "http://localhost/feedback/report";

pub const ENV_ENDPOINT: &str = "FEEDBACK_ENDPOINT";
pub const ENV_PROXY: &str = "FEEDBACK_PROXY";

#[derive(Parser, Debug, Clone)]
#[command(name = "feedback")]
#[command(about = "Submit anonymous error reports to a feedback endpoint", long_about = None)]
#[command(version)]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Configuration file path (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Submit one error report
    Submit {
        /// Feedback endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Explicit proxy URL (e.g. http://proxy.local:3128)
        #[arg(long)]
        proxy: Option<String>,

        /// Ignore HTTP_PROXY / HTTPS_PROXY / NO_PROXY
        #[arg(long)]
        no_system_proxy: bool,

        /// Request timeout in milliseconds (none by default)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Progress title shown while submitting
        #[arg(long, default_value = "Submitting error report")]
        title: String,

        /// Error message; builds a full report with environment fields
        #[arg(long)]
        message: Option<String>,

        /// Extra form fields (repeatable, format: key=value)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Print the resolved configuration as TOML
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub proxy: Option<String>,
    pub use_system_proxy: bool,
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        let settings = ProxySettings::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            proxy: settings.proxy,
            use_system_proxy: settings.use_system_proxy,
            timeout_ms: settings.timeout_ms,
            user_agent: settings.user_agent,
        }
    }
}

/// What the binary should do once configuration is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMode {
    Submit {
        title: String,
        message: Option<String>,
        fields: Vec<(String, String)>,
    },
    ShowConfig,
}

impl FeedbackConfig {
    /// Load a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> FeedbackResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FeedbackError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> FeedbackResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> FeedbackResult<String> {
        toml::to_string_pretty(self).map_err(|e| FeedbackError::config(e.to_string()))
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(proxy) = lookup(ENV_PROXY).filter(|v| !v.is_empty()) {
            self.proxy = Some(proxy);
        }
    }

    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings {
            proxy: self.proxy.clone(),
            use_system_proxy: self.use_system_proxy,
            timeout_ms: self.timeout_ms,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn to_factory(&self) -> ProxyHttpConnectionFactory {
        ProxyHttpConnectionFactory::new(self.proxy_settings())
    }

    /// Resolve defaults, file, environment and CLI flags, in that order.
    pub fn from_cli(args: CliArgs) -> FeedbackResult<(Self, CommandMode)> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());

        match args.command {
            Commands::Submit {
                endpoint,
                proxy,
                no_system_proxy,
                timeout_ms,
                title,
                message,
                fields,
            } => {
                if let Some(endpoint) = endpoint {
                    config.endpoint = endpoint;
                }
                if proxy.is_some() {
                    config.proxy = proxy;
                }
                if no_system_proxy {
                    config.use_system_proxy = false;
                }
                if timeout_ms.is_some() {
                    config.timeout_ms = timeout_ms;
                }

                let fields = parse_fields(&fields)?;
                Ok((
                    config,
                    CommandMode::Submit {
                        title,
                        message,
                        fields,
                    },
                ))
            }
            Commands::Config => Ok((config, CommandMode::ShowConfig)),
        }
    }
}

/// Split `key=value` entries. Values may themselves contain `=`.
fn parse_fields(entries: &[String]) -> FeedbackResult<Vec<(String, String)>> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(FeedbackError::config(format!(
                "Invalid field '{}', expected key=value",
                entry
            ))),
        })
        .collect()
}
