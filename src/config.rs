use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api;
use crate::debounce;
use crate::progress;

const DEFAULT_ENV_PREFIX: &str = "VIBECHECK";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    api::DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("vibecheck/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// How emotion distributions are drawn on the dashboards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Strip,
}

impl ChartKind {
    pub fn toggled(&self) -> Self {
        match self {
            ChartKind::Bar => ChartKind::Strip,
            ChartKind::Strip => ChartKind::Bar,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bar" => Some(ChartKind::Bar),
            "strip" | "pie" => Some(ChartKind::Strip),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bars",
            ChartKind::Strip => "proportions",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub chart: ChartKind,
    #[serde(default = "default_toast_duration", with = "humantime_serde")]
    pub toast_duration: Duration,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            chart: ChartKind::default(),
            toast_duration: default_toast_duration(),
        }
    }
}

fn default_toast_duration() -> Duration {
    Duration::from_secs(3)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_debounce", with = "humantime_serde")]
    pub debounce: Duration,
    #[serde(default = "default_min_progress", with = "humantime_serde")]
    pub min_progress: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            min_progress: default_min_progress(),
        }
    }
}

fn default_debounce() -> Duration {
    debounce::DEFAULT_DELAY
}

fn default_min_progress() -> Duration {
    progress::DEFAULT_MIN_DISPLAY
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub clear_on_exit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("vibecheck").join("vibecheck.log"))
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

/// Defaults, then the YAML file, then `VIBECHECK_SECTION__KEY` variables.
pub fn load(options: LoadOptions) -> Result<Config> {
    let path = options.config_file.clone().or_else(default_config_path);
    let mut cfg = match path {
        Some(path) if path.exists() => read_config_file(&path)?,
        _ => Config::default(),
    };

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    let mut vars: Vec<(String, String)> = env::vars()
        .filter_map(|(key, value)| {
            let stripped = key.strip_prefix(&upper_prefix)?;
            Some((stripped.to_ascii_lowercase().replace("__", "."), value))
        })
        .collect();
    vars.sort();

    for (key, value) in vars {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "api.base_url" => cfg.api.base_url = value,
        "api.user_agent" => cfg.api.user_agent = value,
        "api.timeout" => set_duration(&mut cfg.api.timeout, key, &value),
        "ui.theme" => match Theme::parse(&value) {
            Some(theme) => cfg.ui.theme = theme,
            None => tracing::warn!(key, value = %value, "ignoring unknown theme"),
        },
        "ui.chart" => match ChartKind::parse(&value) {
            Some(chart) => cfg.ui.chart = chart,
            None => tracing::warn!(key, value = %value, "ignoring unknown chart kind"),
        },
        "ui.toast_duration" => set_duration(&mut cfg.ui.toast_duration, key, &value),
        "timing.debounce" => set_duration(&mut cfg.timing.debounce, key, &value),
        "timing.min_progress" => set_duration(&mut cfg.timing.min_progress, key, &value),
        "session.clear_on_exit" => {
            cfg.session.clear_on_exit =
                matches!(value.as_str(), "1" | "true" | "TRUE" | "True" | "yes");
        }
        "log.level" => cfg.log.level = value,
        "log.file" => {
            cfg.log.file = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        // Consumed by the log filter directly.
        "log" => {}
        _ => tracing::debug!(key, "ignoring unknown config variable"),
    }
}

fn set_duration(slot: &mut Duration, key: &str, value: &str) {
    match humantime::parse_duration(value) {
        Ok(duration) => *slot = duration,
        Err(err) => tracing::warn!(key, value, error = %err, "ignoring invalid duration"),
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vibecheck").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    fn isolated(dir: &tempfile::TempDir, prefix: &str) -> LoadOptions {
        LoadOptions {
            config_file: Some(dir.path().join("config.yaml")),
            env_prefix: Some(prefix.to_string()),
        }
    }

    #[test]
    fn load_defaults_without_files() {
        let dir = tempdir().unwrap();
        let cfg = load(isolated(&dir, "VIBECHECK_TEST_DEFAULTS")).unwrap();
        assert_eq!(cfg.api.base_url, api::DEFAULT_BASE_URL);
        assert_eq!(cfg.ui.theme, Theme::Dark);
        assert_eq!(cfg.timing.debounce, Duration::from_millis(500));
        assert_eq!(cfg.timing.min_progress, Duration::from_millis(1200));
        assert_eq!(cfg.ui.toast_duration, Duration::from_secs(3));
        assert!(!cfg.session.clear_on_exit);
    }

    #[test]
    fn file_values_fill_over_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "api:\n  base_url: http://backend:9000/api/v1/\ntiming:\n  debounce: 250ms\nui:\n  theme: light\n  chart: strip\n",
        )
        .unwrap();
        let cfg = load(isolated(&dir, "VIBECHECK_TEST_FILE")).unwrap();
        assert_eq!(cfg.api.base_url, "http://backend:9000/api/v1/");
        assert_eq!(cfg.api.timeout, Duration::from_secs(60));
        assert_eq!(cfg.timing.debounce, Duration::from_millis(250));
        assert_eq!(cfg.timing.min_progress, Duration::from_millis(1200));
        assert_eq!(cfg.ui.theme, Theme::Light);
        assert_eq!(cfg.ui.chart, ChartKind::Strip);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "api: [unterminated").unwrap();
        assert!(load(isolated(&dir, "VIBECHECK_TEST_BROKEN")).is_err());
    }

    #[test]
    fn env_overrides() {
        let dir = tempdir().unwrap();
        env::set_var("VIBECHECK_TEST_ENV_UI__THEME", "light");
        env::set_var("VIBECHECK_TEST_ENV_TIMING__MIN_PROGRESS", "2s");
        env::set_var("VIBECHECK_TEST_ENV_SESSION__CLEAR_ON_EXIT", "true");
        env::set_var("VIBECHECK_TEST_ENV_API__TIMEOUT", "soon");
        let cfg = load(isolated(&dir, "VIBECHECK_TEST_ENV")).unwrap();
        assert_eq!(cfg.ui.theme, Theme::Light);
        assert_eq!(cfg.timing.min_progress, Duration::from_secs(2));
        assert!(cfg.session.clear_on_exit);
        assert_eq!(cfg.api.timeout, Duration::from_secs(60));
        for key in [
            "VIBECHECK_TEST_ENV_UI__THEME",
            "VIBECHECK_TEST_ENV_TIMING__MIN_PROGRESS",
            "VIBECHECK_TEST_ENV_SESSION__CLEAR_ON_EXIT",
            "VIBECHECK_TEST_ENV_API__TIMEOUT",
        ] {
            env::remove_var(key);
        }
    }
}
