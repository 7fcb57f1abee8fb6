use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::DurationMilliSeconds;
use serde_with::serde_as;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("namespace pattern"));

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub bisect: BisectConfig,
}

// dashboard config
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub syzkaller_repo: String,
    pub namespaces: Vec<String>,
}

// retry policy for bisection completions
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BisectConfig {
    pub max_retries: usize,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub initial_backoff: Duration,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        load_config().unwrap_or_else(|e| {
            error!(
                "Failed to load config, using hardcoded default. Error: {:?}",
                e
            );
            Config::builtin()
        })
    }
}

impl Config {
    pub fn builtin() -> Self {
        Config {
            dashboard: DashboardConfig {
                syzkaller_repo: "https://github.com/google/syzkaller".to_string(),
                namespaces: vec!["test1".to_string(), "test2".to_string()],
            },
            bisect: BisectConfig {
                max_retries: 5,
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_secs(5),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dashboard.syzkaller_repo.is_empty() {
            bail!("syzkaller_repo cannot be empty");
        }
        if self.dashboard.namespaces.is_empty() {
            bail!("at least one namespace must be configured");
        }
        if let Some(bad) = self
            .dashboard
            .namespaces
            .iter()
            .find(|ns| !NAMESPACE_RE.is_match(ns))
        {
            bail!("invalid namespace name: {:?}", bad);
        }
        self.bisect.validate()
    }

    pub fn knows_namespace(&self, namespace: &str) -> bool {
        self.dashboard.namespaces.iter().any(|ns| ns == namespace)
    }

    pub fn syzkaller_commit_url(&self, commit: &str) -> String {
        format!(
            "{}/commits/{}",
            self.dashboard.syzkaller_repo.trim_end_matches('/'),
            commit
        )
    }
}

impl BisectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            bail!("Max retries must be greater than 0");
        }
        if self.initial_backoff > self.max_backoff {
            bail!(
                "initial_backoff {:?} exceeds max_backoff {:?}",
                self.initial_backoff,
                self.max_backoff
            );
        }
        Ok(())
    }
}

pub fn load_config_from(config_file: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_file);

    let config_content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file: {:?}", config_file))?;

    let config: Config = toml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file: {:?}", config_file))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", config_file))?;

    info!("Loaded configuration succeeded");

    Ok(config)
}

// default load config from config/settings.toml
fn load_config() -> Result<Config> {
    let mut config_file = PathBuf::from(std::env::current_dir()?);
    config_file.push("config");
    config_file.push("settings.toml");

    load_config_from(&config_file)
}
