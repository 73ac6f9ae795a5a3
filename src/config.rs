// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::{listing::ListingExtractor, rss::RssExtractor, ArticleExtractor};
use crate::scheduler::PostMode;

const ENV_PATH: &str = "FEED_RELAY_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_tick_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default)]
    pub resolver: ResolverConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub main_url: String,
    /// Substring marking a resolved URL as canonical, e.g. "mp.weixin.qq.com".
    pub url_pattern: String,
    /// Defaults to the source name.
    #[serde(default)]
    pub dedup_namespace: Option<String>,
    pub extractor: ExtractorKind,
    #[serde(default = "default_run_every")]
    pub run_every_ticks: u64,
    #[serde(default)]
    pub post_mode: PostMode,
    #[serde(default = "default_flush_every")]
    pub flush_every_ticks: u64,
}

impl SourceConfig {
    pub fn dedup_namespace(&self) -> String {
        self.dedup_namespace
            .clone()
            .unwrap_or_else(|| self.name.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Rss,
    Listing,
}

impl ExtractorKind {
    pub fn build(&self) -> Box<dyn ArticleExtractor> {
        match self {
            Self::Rss => Box::new(RssExtractor),
            Self::Listing => Box::new(ListingExtractor::default()),
        }
    }
}

fn default_tick_secs() -> u64 {
    1
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("state/seen")
}
fn default_max_retries() -> u32 {
    20
}
fn default_delay_ms() -> u64 {
    500
}
fn default_concurrency() -> usize {
    20
}
fn default_run_every() -> u64 {
    1
}
fn default_flush_every() -> u64 {
    10
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Load using env var + fallbacks:
/// 1) $FEED_RELAY_CONFIG
/// 2) config/feed_relay.toml
/// 3) config/feed_relay.json
pub fn load_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("FEED_RELAY_CONFIG points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/feed_relay.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feed_relay.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Err(anyhow!(
        "no config found (set FEED_RELAY_CONFIG or add config/feed_relay.toml)"
    ))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing json config");
    }
    toml::from_str(s).context("parsing toml config")
}

fn validate(cfg: &AppConfig) -> Result<()> {
    if cfg.tick_interval_secs == 0 {
        return Err(anyhow!("tick_interval_secs must be >= 1"));
    }
    if cfg.sources.is_empty() {
        return Err(anyhow!("at least one [[sources]] entry is required"));
    }
    for src in &cfg.sources {
        if src.run_every_ticks == 0 || src.flush_every_ticks == 0 {
            return Err(anyhow!(
                "source {}: run_every_ticks and flush_every_ticks must be >= 1",
                src.name
            ));
        }
    }
    Ok(())
}
