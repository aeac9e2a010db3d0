use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory served publicly; images live under `<public_root>/Media`
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Delete the previously referenced file after a successful update
    #[serde(default)]
    pub remove_replaced: bool,
    #[serde(default = "default_avatar")]
    pub default_avatar: String,
    #[serde(default = "default_banner")]
    pub default_banner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_presence_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the logged-in user id, set by the session layer in front of us
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccountsConfig {
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Console,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Console => write!(f, "console"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub console: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            jpeg_quality: default_jpeg_quality(),
            remove_replaced: false,
            default_avatar: default_avatar(),
            default_banner: default_banner(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_presence_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_public_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_avatar() -> String {
    "/Media/default_profile.jpg".to_string()
}

fn default_banner() -> String {
    "/Media/default_banner.jpg".to_string()
}

fn default_presence_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_sweep_interval_ms() -> u64 {
    60_000 // 1 minute
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.media.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be greater than 0");
        }

        if self.media.max_image_bytes == 0 {
            bail!("max_image_bytes must be greater than 0");
        }

        if !(1..=100).contains(&self.media.jpeg_quality) {
            bail!(
                "jpeg_quality ({}) must be between 1 and 100",
                self.media.jpeg_quality
            );
        }

        if self.presence.sweep_interval_ms == 0 {
            bail!("sweep_interval_ms must be greater than 0");
        }

        if self.presence.ttl_ms <= self.presence.sweep_interval_ms {
            bail!(
                "presence ttl_ms ({}) must be greater than sweep_interval_ms ({})",
                self.presence.ttl_ms,
                self.presence.sweep_interval_ms
            );
        }

        if self.auth.user_header.trim().is_empty() {
            bail!("auth.user_header must not be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        Ok(())
    }

    /// Directory holding `avatars/` and `banners/`
    pub fn media_root(&self) -> PathBuf {
        self.media.public_root.join("Media")
    }
}
