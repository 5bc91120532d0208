use crate::error::{ChannelSyncError, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mattermost: MattermostConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone)]
pub struct MattermostConfig {
    /// Server root, e.g. `https://chat.example.com`
    pub server_url: String,
    /// Personal access or session token
    pub token: String,
    /// Name (or id) of the primary team; the first team is used when unset
    pub team: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Public channels requested per page
    pub page_size: u32,
    /// Upper bound on a single rate-limit sleep
    pub max_backoff: Duration,
    /// Sleep used when a throttled response carries no wait hint
    pub default_backoff: Duration,
    /// Deadline the binary puts around a full refresh
    pub refresh_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_backoff: Duration::from_secs(60),
            default_backoff: Duration::from_millis(1000),
            refresh_timeout: Duration::from_secs(300),
        }
    }
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let mattermost = MattermostConfig {
        server_url: std::env::var("MATTERMOST_URL")
            .map_err(|_| ChannelSyncError::Config("MATTERMOST_URL not set".to_string()))?,
        token: std::env::var("MATTERMOST_TOKEN")
            .map_err(|_| ChannelSyncError::Config("MATTERMOST_TOKEN not set".to_string()))?,
        team: std::env::var("MATTERMOST_TEAM")
            .ok()
            .filter(|team| !team.trim().is_empty()),
    };

    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        page_size: parse_var(
            "SYNC_PAGE_SIZE",
            std::env::var("SYNC_PAGE_SIZE").ok(),
            defaults.page_size,
        )?,
        max_backoff: Duration::from_secs(parse_var(
            "SYNC_MAX_BACKOFF_SECS",
            std::env::var("SYNC_MAX_BACKOFF_SECS").ok(),
            defaults.max_backoff.as_secs(),
        )?),
        default_backoff: Duration::from_millis(parse_var(
            "SYNC_DEFAULT_BACKOFF_MS",
            std::env::var("SYNC_DEFAULT_BACKOFF_MS").ok(),
            defaults.default_backoff.as_millis() as u64,
        )?),
        refresh_timeout: Duration::from_secs(parse_var(
            "SYNC_REFRESH_TIMEOUT_SECS",
            std::env::var("SYNC_REFRESH_TIMEOUT_SECS").ok(),
            defaults.refresh_timeout.as_secs(),
        )?),
    };

    if sync.page_size == 0 {
        return Err(ChannelSyncError::Config(
            "SYNC_PAGE_SIZE must be greater than zero".to_string(),
        ));
    }

    Ok(Settings { mattermost, sync })
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ChannelSyncError::Config(format!("Invalid {}: {:?}", name, value))),
        None => Ok(default),
    }
}
