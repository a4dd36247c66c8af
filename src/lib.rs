//! Taskboard
//!
//! Client-state layer of a workspace → project → task manager:
//! - Typed REST client for the taskboard backend
//! - Kanban board store with optimistic drag-and-drop status changes
//! - Polling and realtime-push reconciliation against the backend
//! - Task detail (comments, activity, attachments) and dashboard aggregation

pub mod api;
pub mod auth;
pub mod board;
pub mod dashboard;
pub mod realtime;
pub mod sync;
pub mod task_detail;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub api: ApiYamlConfig,
    pub realtime: RealtimeYamlConfig,
    pub sync: SyncYamlConfig,
    pub auth: AuthYamlConfig,
}

/// Backend API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiYamlConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiYamlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            timeout_secs: 15,
        }
    }
}

/// Realtime notification socket section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeYamlConfig {
    pub url: String,
    pub reconnect_delay_secs: u64,
}

impl Default for RealtimeYamlConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3001".into(),
            reconnect_delay_secs: 3,
        }
    }
}

/// Board reconciliation section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncYamlConfig {
    pub poll_interval_secs: u64,
}

impl Default for SyncYamlConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 8,
        }
    }
}

/// Identity provider section.
///
/// `access_token` is normally left out of the file and passed via
/// `TASKBOARD_ACCESS_TOKEN`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYamlConfig {
    pub access_token: Option<String>,
    /// Hosted UI domain, e.g. "https://tenant.auth.example.com"
    pub domain: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub logout_uri: String,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_timeout: Duration,
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
    pub access_token: Option<String>,
    pub hosted_ui: auth::HostedUi,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "taskboard.yaml" in CWD. A missing file
    /// falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            api_url: std::env::var("TASKBOARD_API_URL").unwrap_or(yaml.api.base_url),
            api_timeout: secs_from_env("TASKBOARD_API_TIMEOUT_SECS", yaml.api.timeout_secs),
            ws_url: std::env::var("TASKBOARD_WS_URL").unwrap_or(yaml.realtime.url),
            reconnect_delay: secs_from_env(
                "TASKBOARD_RECONNECT_DELAY_SECS",
                yaml.realtime.reconnect_delay_secs,
            ),
            poll_interval: secs_from_env(
                "TASKBOARD_POLL_INTERVAL_SECS",
                yaml.sync.poll_interval_secs,
            ),
            access_token: std::env::var("TASKBOARD_ACCESS_TOKEN")
                .ok()
                .or(yaml.auth.access_token)
                .filter(|t| !t.trim().is_empty()),
            hosted_ui: auth::HostedUi {
                domain: std::env::var("TASKBOARD_AUTH_DOMAIN").unwrap_or(yaml.auth.domain),
                client_id: std::env::var("TASKBOARD_AUTH_CLIENT_ID")
                    .unwrap_or(yaml.auth.client_id),
                redirect_uri: std::env::var("TASKBOARD_AUTH_REDIRECT_URI")
                    .unwrap_or(yaml.auth.redirect_uri),
                logout_uri: std::env::var("TASKBOARD_AUTH_LOGOUT_URI")
                    .unwrap_or(yaml.auth.logout_uri),
            },
        })
    }

    /// Timer settings for project views
    pub fn sync_options(&self) -> sync::SyncOptions {
        sync::SyncOptions {
            poll_interval: self.poll_interval,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("taskboard.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Whole seconds from `var`, falling back to `default` when unset or unparsable.
/// Zero is rejected so timers never spin.
fn secs_from_env(var: &str, default: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(if secs == 0 { default.max(1) } else { secs })
}

// ============================================================================
// Tests
// ============================================================================
