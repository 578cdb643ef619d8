//! Application configuration, loaded from the environment (and `.env`).
//!
//! Nested keys use `__` as separator, e.g. `API__BASE_URL` or
//! `RANKING__RECENCY_BONUS`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub ranking: RankingConfig,
    pub listing: ListingConfig,
    pub presence: PresenceConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream blog REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Zero disables caching; every read goes upstream.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

/// Popularity score knobs. These are product heuristics, not API contract.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_recency_days")]
    pub recency_days: i64,
    #[serde(default = "default_recency_bonus")]
    pub recency_bonus: i64,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_active_window")]
    pub active_window_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    pub title: String,
    pub description: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_cache_entries() -> u64 {
    1_000
}

fn default_recency_days() -> i64 {
    7
}

fn default_recency_bonus() -> i64 {
    50
}

fn default_trending_limit() -> usize {
    6
}

fn default_page_size() -> usize {
    9
}

fn default_active_window() -> i64 {
    5
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            recency_days: default_recency_days(),
            recency_bonus: default_recency_bonus(),
            trending_limit: default_trending_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            api: ApiConfig {
                base_url: "http://localhost:5000".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            cache: CacheConfig {
                ttl_secs: default_cache_ttl(),
                max_entries: default_cache_entries(),
            },
            ranking: RankingConfig::default(),
            listing: ListingConfig {
                page_size: default_page_size(),
            },
            presence: PresenceConfig {
                active_window_minutes: default_active_window(),
            },
            site: SiteConfig {
                url: "http://localhost:5173".to_string(),
                title: "Blog Portal".to_string(),
                description: "Latest posts from the community".to_string(),
            },
        }
    }
}

/// Ten years.
const MAX_RECENCY_DAYS: i64 = 3_650;
/// Thirty days.
const MAX_ACTIVE_WINDOW_MINUTES: i64 = 43_200;

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs as i64)?
            .set_default("cache.ttl_secs", defaults.cache.ttl_secs as i64)?
            .set_default("cache.max_entries", defaults.cache.max_entries as i64)?
            .set_default("ranking.recency_days", defaults.ranking.recency_days)?
            .set_default("ranking.recency_bonus", defaults.ranking.recency_bonus)?
            .set_default("ranking.trending_limit", defaults.ranking.trending_limit as i64)?
            .set_default("listing.page_size", defaults.listing.page_size as i64)?
            .set_default(
                "presence.active_window_minutes",
                defaults.presence.active_window_minutes,
            )?
            .set_default("site.url", defaults.site.url)?
            .set_default("site.title", defaults.site.title)?
            .set_default("site.description", defaults.site.description)?
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        config.validate()?;

        Ok(config)
    }

    /// Rejects values the handlers cannot turn into durations or pages.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listing.page_size == 0 {
            anyhow::bail!("LISTING__PAGE_SIZE must be at least 1");
        }
        if !(0..=MAX_RECENCY_DAYS).contains(&self.ranking.recency_days) {
            anyhow::bail!(
                "RANKING__RECENCY_DAYS must be between 0 and {}, got {}",
                MAX_RECENCY_DAYS,
                self.ranking.recency_days
            );
        }
        if !(1..=MAX_ACTIVE_WINDOW_MINUTES).contains(&self.presence.active_window_minutes) {
            anyhow::bail!(
                "PRESENCE__ACTIVE_WINDOW_MINUTES must be between 1 and {}, got {}",
                MAX_ACTIVE_WINDOW_MINUTES,
                self.presence.active_window_minutes
            );
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
