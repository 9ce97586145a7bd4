use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::conversation::{
    ConversationSettings, DEFAULT_MODEL, PollPolicy, SessionIds,
};

/// Assistant reused across restarts unless configured otherwise.
pub const DEFAULT_ASSISTANT_ID: &str = "asst_dwVwNnhuuZSH2kWi5gC5VDt2";

/// Thread reused across restarts unless configured otherwise.
pub const DEFAULT_THREAD_ID: &str = "thread_ftAyg3mimxpt6Nm8a4qfwD1B";

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

    /// Seconds between two run status checks
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Seconds before a run wait gives up (0 waits forever)
    #[arg(long)]
    pub run_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub polling: PollingConfig,
    pub news: NewsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("assistant_id", &self.assistant_id)
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct NewsConfig {
    pub base_url: String,
    pub page_size: u32,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsConfig")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Build the configuration from defaults, an optional config file,
    /// `SUMMARIZER_` environment variables, the API key variables and the
    /// command line, in increasing priority.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("assistant.base_url", "https://api.openai.com")?
            .set_default("assistant.model", DEFAULT_MODEL)?
            .set_default("assistant.assistant_id", DEFAULT_ASSISTANT_ID)?
            .set_default("assistant.thread_id", DEFAULT_THREAD_ID)?
            .set_default("polling.interval_secs", 10)?
            .set_default("polling.timeout_secs", 600)?
            .set_default("news.base_url", "https://newsapi.org")?
            .set_default("news.page_size", 5)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(PathBuf::from(path))),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. SUMMARIZER_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("SUMMARIZER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            builder = builder.set_override("assistant.api_key", key)?;
        }
        if let Ok(key) = env::var("NEWS_API_KEY") {
            builder = builder.set_override("news.api_key", key)?;
        }

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(secs) = cli.poll_interval_secs {
            builder = builder.set_override("polling.interval_secs", secs)?;
        }
        if let Some(secs) = cli.run_timeout_secs {
            builder = builder.set_override("polling.timeout_secs", secs)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assistant.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "Missing required env var: OPENAI_API_KEY".to_string(),
            ));
        }
        if self.news.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "Missing required env var: NEWS_API_KEY".to_string(),
            ));
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Message(
                "polling.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.news.page_size == 0 {
            return Err(ConfigError::Message(
                "news.page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.polling.interval_secs),
            timeout: (self.polling.timeout_secs > 0)
                .then(|| Duration::from_secs(self.polling.timeout_secs)),
        }
    }

    pub fn conversation_settings(&self) -> ConversationSettings {
        ConversationSettings {
            model: self.assistant.model.clone(),
            poll: self.poll_policy(),
        }
    }

    /// Identifiers the first turn starts from.
    pub fn session_ids(&self) -> SessionIds {
        SessionIds::new(
            self.assistant.assistant_id.clone(),
            self.assistant.thread_id.clone(),
        )
    }
}
