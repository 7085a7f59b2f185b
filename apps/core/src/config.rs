use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "quickhop";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Serialize(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Serialize(error) => write!(f, "serialize error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Maps a substring of a window title's trailing segment to a canonical app name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownApp {
    pub pattern: String,
    pub name: String,
}

impl KnownApp {
    pub fn new(pattern: &str, name: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            name: name.to_string(),
        }
    }
}

pub fn default_known_apps() -> Vec<KnownApp> {
    vec![
        KnownApp::new("Chrome", "Google Chrome"),
        KnownApp::new("Firefox", "Firefox"),
        KnownApp::new("Terminal", "Terminal"),
        KnownApp::new("Code", "VS Code"),
        KnownApp::new("Obsidian", "Obsidian"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum snapshot age before a read triggers a refresh.
    pub staleness_ms: u64,
    /// Upper bound on one refresh waiting for its providers.
    pub provider_timeout_ms: u64,
    pub command_timeout_ms: u64,
    pub devtools_host: String,
    pub devtools_port: u16,
    pub browser_name: String,
    pub reserved_titles: Vec<String>,
    pub panel_title_prefix: String,
    pub window_list_command: Vec<String>,
    /// The window id is appended as the final argument.
    pub window_activate_command: Vec<String>,
    pub log_level: String,
    /// 0 returns every match.
    pub max_results: u16,
    #[serde(skip)]
    pub config_path: PathBuf,
    pub known_apps: Vec<KnownApp>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staleness_ms: 2_000,
            provider_timeout_ms: 3_000,
            command_timeout_ms: 2_000,
            devtools_host: "127.0.0.1".to_string(),
            devtools_port: 9222,
            browser_name: "chrome".to_string(),
            reserved_titles: vec!["Desktop".to_string(), "Launcher".to_string()],
            panel_title_prefix: "@!".to_string(),
            window_list_command: vec!["wmctrl".to_string(), "-l".to_string()],
            window_activate_command: vec![
                "wmctrl".to_string(),
                "-i".to_string(),
                "-a".to_string(),
            ],
            log_level: "info".to_string(),
            max_results: 0,
            config_path: stable_app_data_dir().join(CONFIG_FILE_NAME),
            known_apps: default_known_apps(),
        }
    }
}

impl Config {
    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn devtools_base_url(&self) -> String {
        format!("http://{}:{}", self.devtools_host, self.devtools_port)
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    if cfg.staleness_ms == 0 || cfg.staleness_ms > 600_000 {
        return Err("staleness_ms out of range".into());
    }

    if cfg.provider_timeout_ms < 100 || cfg.provider_timeout_ms > 60_000 {
        return Err("provider_timeout_ms out of range".into());
    }

    if cfg.command_timeout_ms < 100 || cfg.command_timeout_ms > 60_000 {
        return Err("command_timeout_ms out of range".into());
    }

    if cfg.devtools_host.trim().is_empty() {
        return Err("devtools_host is required".into());
    }

    if cfg.devtools_port == 0 {
        return Err("devtools_port is required".into());
    }

    if cfg.browser_name.trim().is_empty() {
        return Err("browser_name is required".into());
    }

    if cfg.window_list_command.is_empty() {
        return Err("window_list_command is required".into());
    }

    if cfg.window_activate_command.is_empty() {
        return Err("window_activate_command is required".into());
    }

    if cfg
        .known_apps
        .iter()
        .any(|app| app.pattern.is_empty() || app.name.is_empty())
    {
        return Err("known_apps entries need a pattern and a name".into());
    }

    if !matches!(
        cfg.log_level.to_ascii_lowercase().as_str(),
        "debug" | "info" | "warn" | "error"
    ) {
        return Err(format!("unknown log_level '{}'", cfg.log_level));
    }

    Ok(())
}

/// Loads the config at `path`, or the default location. A missing file yields defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    if !config_path.exists() {
        return Ok(Config {
            config_path,
            ..Config::default()
        });
    }

    let raw = std::fs::read_to_string(&config_path)?;
    let mut config = parse(&raw, &config_path)?;
    config.config_path = config_path;
    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let encoded = toml::to_string_pretty(cfg).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    std::fs::write(&cfg.config_path, encoded)?;
    Ok(())
}

fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" | "json5" => json5::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
    }
}
