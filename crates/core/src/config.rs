use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracelabError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub base_url: String,
    pub slow_delay: Duration,
    pub db_query_delay: Duration,
    pub batch_items: usize,
    pub batch_item_base: Duration,
    pub batch_item_jitter: Duration,
    pub recorder_capacity: usize,
    pub demo_post_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3600".to_string(),
            base_url: "http://127.0.0.1:3600".to_string(),
            slow_delay: Duration::from_secs(2),
            db_query_delay: Duration::from_millis(25),
            batch_items: 3,
            batch_item_base: Duration::from_millis(100),
            batch_item_jitter: Duration::from_millis(200),
            recorder_capacity: 2048,
            demo_post_count: 25,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    listen_addr: Option<String>,
    base_url: Option<String>,
    slow_delay: Option<String>,
    db_query_delay: Option<String>,
    batch_items: Option<usize>,
    batch_item_base: Option<String>,
    batch_item_jitter: Option<String>,
    recorder_capacity: Option<usize>,
    demo_post_count: Option<usize>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("TRACELAB_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("tracelab/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| TracelabError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| TracelabError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let batch_items = parse_env_usize("TRACELAB_BATCH_ITEMS")?;
    let recorder_capacity = parse_env_usize("TRACELAB_RECORDER_CAPACITY")?;
    let demo_post_count = parse_env_usize("TRACELAB_DEMO_POST_COUNT")?;

    Ok(ConfigOverrides {
        listen_addr: env::var("TRACELAB_LISTEN_ADDR").ok(),
        base_url: env::var("TRACELAB_BASE_URL").ok(),
        slow_delay: env::var("TRACELAB_SLOW_DELAY").ok(),
        db_query_delay: env::var("TRACELAB_DB_QUERY_DELAY").ok(),
        batch_items,
        batch_item_base: env::var("TRACELAB_BATCH_ITEM_BASE").ok(),
        batch_item_jitter: env::var("TRACELAB_BATCH_ITEM_JITTER").ok(),
        recorder_capacity,
        demo_post_count,
    })
}

fn parse_env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(v) => Ok(Some(v.parse::<usize>().map_err(|e| {
            TracelabError::Config(format!("bad {key} in environment: {e}"))
        })?)),
        Err(_) => Ok(None),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.listen_addr {
        cfg.listen_addr = v;
    }
    if let Some(v) = overrides.base_url {
        cfg.base_url = v;
    }
    if let Some(v) = overrides.slow_delay {
        cfg.slow_delay = parse_duration_field(&v, "slow_delay", source)?;
    }
    if let Some(v) = overrides.db_query_delay {
        cfg.db_query_delay = parse_duration_field(&v, "db_query_delay", source)?;
    }
    if let Some(v) = overrides.batch_items {
        cfg.batch_items = v;
    }
    if let Some(v) = overrides.batch_item_base {
        cfg.batch_item_base = parse_duration_field(&v, "batch_item_base", source)?;
    }
    if let Some(v) = overrides.batch_item_jitter {
        cfg.batch_item_jitter = parse_duration_field(&v, "batch_item_jitter", source)?;
    }
    if let Some(v) = overrides.recorder_capacity {
        cfg.recorder_capacity = v;
    }
    if let Some(v) = overrides.demo_post_count {
        cfg.demo_post_count = v;
    }
    Ok(())
}

fn parse_duration_field(value: &str, field: &str, source: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| {
        TracelabError::Config(format!("bad {field} in {source}: {e} (value={value})"))
    })
}
