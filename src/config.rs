use std::path::{Path, PathBuf};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::transport::http::{DEFAULT_API_PATH, DEFAULT_MAX_RESPONSE_BYTES};
use crate::widget::ElementIds;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "chat-widget.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the chat endpoint
    #[arg(long, env = "CHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Path of the chat API on the endpoint
    #[arg(long, env = "CHAT_API_PATH")]
    pub api_path: Option<String>,

    /// Largest response body accepted, in bytes
    #[arg(long)]
    pub max_response_bytes: Option<usize>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,

    /// Write the final transcript as HTML to this file
    #[arg(long)]
    pub transcript_out: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub endpoint: EndpointConfig,
    pub limits: LimitsConfig,
    #[serde(default)]
    pub page: ElementIds,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_response_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl WidgetConfig {
    /// Parse `args` as a command line, then layer as [`Self::from_cli`] does.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layer defaults, config file, `CHAT_WIDGET_*` env and CLI flags.
    ///
    /// Priority: CLI flag (or its clap env var) > `CHAT_WIDGET_` env > file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("endpoint.base_url", "http://127.0.0.1:5000")?
            .set_default("endpoint.api_path", DEFAULT_API_PATH)?
            .set_default(
                "limits.max_response_bytes",
                u64::try_from(DEFAULT_MAX_RESPONSE_BYTES).unwrap_or(u64::MAX),
            )?
            .set_default("logging.json", false)?;

        match &cli.config {
            Some(path) => builder = builder.add_source(File::from(path.as_path())),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)));
            }
            None => {}
        }

        // E.g. CHAT_WIDGET_ENDPOINT__BASE_URL=http://localhost:8080
        builder = builder.add_source(
            Environment::with_prefix("CHAT_WIDGET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(endpoint) = &cli.endpoint {
            builder = builder.set_override("endpoint.base_url", endpoint.as_str())?;
        }
        if let Some(path) = &cli.api_path {
            builder = builder.set_override("endpoint.api_path", path.as_str())?;
        }
        if let Some(limit) = cli.max_response_bytes {
            builder = builder.set_override(
                "limits.max_response_bytes",
                u64::try_from(limit).unwrap_or(u64::MAX),
            )?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
