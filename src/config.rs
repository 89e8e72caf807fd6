//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const USERNAME_ENV: &str = "GLUEBOT_USERNAME";
const PASSWORD_ENV: &str = "GLUEBOT_PASSWORD";

/// Gluebot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat service base URL, e.g. `https://deek.chat`.
    pub base_url: String,

    /// Realtime socket URL.
    pub ws_url: String,

    /// Login name. Also used to ignore the bot's own messages.
    pub username: String,

    pub password: String,

    /// Character that starts a command.
    pub prefix: String,

    /// Minimum time between two admitted commands.
    pub cooldown: Duration,

    /// Directory holding the template images (describe.jpg, wins.gif, ...).
    pub assets_dir: PathBuf,

    /// Bird word list, one entry per line.
    pub word_list: PathBuf,

    /// Imageboard JSON API base URL.
    pub imageboard_api: String,

    /// Boards the shitpost command picks from.
    pub boards: Vec<String>,

    /// Timeout applied to every outbound HTTP request.
    pub request_timeout: Duration,

    /// First reconnect delay; doubles per failed attempt.
    pub reconnect_delay: Duration,

    pub max_reconnect_delay: Duration,

    /// Optional directory for daily rolling log files.
    pub log_dir: Option<PathBuf>,

    pub renderer: RendererConfig,
}

/// External renderer settings.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Program followed by any leading arguments.
    pub command: Vec<String>,

    /// Default `--width` passed on every invocation.
    pub width: u32,

    /// Default `--output` passed on every invocation.
    pub output: PathBuf,

    pub timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: vec!["gifmaker".into()],
            width: 350,
            output: PathBuf::from("/tmp/gifmaker"),
            timeout: Duration::from_secs(120),
        }
    }
}

/// On-disk TOML representation. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub prefix: Option<String>,
    pub cooldown_secs: Option<u64>,
    pub assets_dir: Option<PathBuf>,
    pub word_list: Option<PathBuf>,
    pub imageboard_api: Option<String>,
    pub boards: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
    pub reconnect_delay_secs: Option<u64>,
    pub max_reconnect_delay_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub renderer: FileRendererConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRendererConfig {
    pub command: Option<Vec<String>>,
    pub width: Option<u32>,
    pub output: Option<PathBuf>,
    pub render_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the environment and the default config file, if present.
    pub fn load() -> Result<Self> {
        match Self::default_config_path().filter(|path| path.is_file()) {
            Some(path) => Self::load_from_path(&path),
            None => Self::from_parts(FileConfig::default(), env_var(USERNAME_ENV), env_var(PASSWORD_ENV)),
        }
    }

    /// Load from a specific config file path. Credentials still come from the environment.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: Arc::new(error),
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|error| ConfigError::Parse {
            path: path.display().to_string(),
            source: Box::new(error),
        })?;

        Self::from_parts(file, env_var(USERNAME_ENV), env_var(PASSWORD_ENV))
    }

    /// Merge file settings over the defaults and attach credentials.
    pub fn from_parts(
        file: FileConfig,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let (Some(username), Some(password)) = (username, password) else {
            return Err(ConfigError::MissingCredentials.into());
        };

        let base_url = file
            .base_url
            .unwrap_or_else(|| "https://deek.chat".into())
            .trim_end_matches('/')
            .to_string();
        let ws_url = file.ws_url.unwrap_or_else(|| derive_ws_url(&base_url));

        let prefix = file.prefix.unwrap_or_else(|| ",".into());
        if prefix.is_empty() {
            return Err(ConfigError::Invalid("prefix must not be empty".into()).into());
        }

        let boards = file.boards.unwrap_or_else(default_boards);
        if boards.is_empty() {
            return Err(ConfigError::Invalid("boards must list at least one board".into()).into());
        }

        let defaults = RendererConfig::default();
        let renderer = RendererConfig {
            command: file.renderer.command.unwrap_or(defaults.command),
            width: file.renderer.width.unwrap_or(defaults.width),
            output: file.renderer.output.unwrap_or(defaults.output),
            timeout: file
                .renderer
                .render_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };
        if renderer.command.is_empty() {
            return Err(ConfigError::Invalid("renderer.command must name a program".into()).into());
        }

        let assets_dir = file.assets_dir.unwrap_or_else(|| PathBuf::from("assets"));
        let word_list = file
            .word_list
            .unwrap_or_else(|| assets_dir.join("data").join("aves.txt"));

        Ok(Self {
            base_url,
            ws_url,
            username,
            password,
            prefix,
            cooldown: Duration::from_secs(file.cooldown_secs.unwrap_or(3)),
            assets_dir,
            word_list,
            imageboard_api: file
                .imageboard_api
                .unwrap_or_else(|| "https://a.4cdn.org".into())
                .trim_end_matches('/')
                .to_string(),
            boards,
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(30)),
            reconnect_delay: Duration::from_secs(file.reconnect_delay_secs.unwrap_or(2)),
            max_reconnect_delay: Duration::from_secs(file.max_reconnect_delay_secs.unwrap_or(60)),
            log_dir: file.log_dir,
            renderer,
        })
    }

    /// `$XDG_CONFIG_HOME/gluebot/config.toml` or the platform equivalent.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gluebot").join("config.toml"))
    }

    /// Path of a template image inside the assets directory.
    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets_dir.join(name)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn derive_ws_url(base_url: &str) -> String {
    let socket_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{socket_base}/ws")
}

fn default_boards() -> Vec<String> {
    ["g", "an", "ck", "lit", "x", "tv", "v", "fit", "k", "o"]
        .into_iter()
        .map(String::from)
        .collect()
}
