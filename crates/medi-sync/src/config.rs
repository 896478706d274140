//! # Sync Configuration
//!
//! Configuration for the remote client, the sync orchestrator and the
//! lookup facade.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDI_REMOTE_URL=https://catalog.example.org                        │
//! │     MEDI_BATCH_SIZE=50                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/medi-pharmacy/medi.toml (Linux)                          │
//! │     ~/Library/Application Support/com.medi.pharmacy/medi.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     batch 50, 3 attempts, 2s initial backoff, empty_is_failure         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # medi.toml
//! [remote]
//! base_url = "https://catalog.example.org"
//! api_key = "anon-key"
//! request_timeout_secs = 30
//!
//! [sync]
//! batch_size = 50
//! max_attempts = 3
//! initial_backoff_secs = 2
//! inter_batch_delay_ms = 500
//!
//! [lookup]
//! fallback_policy = "empty_is_failure"  # empty_is_failure | trust_empty
//! default_limit = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use medi_core::validation::{validate_batch_size, validate_max_attempts};
use medi_core::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_SEARCH_LIMIT};

use crate::error::{MediResult, SyncError};
use crate::orchestrator::SyncOptions;
use crate::retry::RetryPolicy;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "medi.toml";

// =============================================================================
// Fallback Policy
// =============================================================================

/// What the lookup facade does with a successful but empty remote answer.
///
/// ## Policy Behavior
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Remote answer      │  EMPTY_IS_FAILURE (default) │  TRUST_EMPTY        │
/// │  ───────────────────┼─────────────────────────────┼──────────────────── │
/// │  error / timeout    │  local catalog              │  local catalog      │
/// │  zero records       │  local catalog              │  Empty              │
/// │  some records       │  Remote(records)            │  Remote(records)    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Zero remote results are treated like a remote error.
    #[default]
    EmptyIsFailure,

    /// Zero remote results are a legitimate "no matches" answer.
    TrustEmpty,
}

impl FallbackPolicy {
    /// Returns true if an empty remote answer should be replaced locally.
    pub fn falls_back_on_empty(&self) -> bool {
        matches!(self, FallbackPolicy::EmptyIsFailure)
    }
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::EmptyIsFailure => write!(f, "empty_is_failure"),
            FallbackPolicy::TrustEmpty => write!(f, "trust_empty"),
        }
    }
}

impl std::str::FromStr for FallbackPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "empty_is_failure" | "fallback" => Ok(FallbackPolicy::EmptyIsFailure),
            "trust_empty" | "trust" => Ok(FallbackPolicy::TrustEmpty),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown fallback policy: '{}'. Valid options: empty_is_failure, trust_empty",
                other
            ))),
        }
    }
}

// =============================================================================
// Remote Settings
// =============================================================================

/// Connection settings for the hosted canonical catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the REST backend. `None` means no hosted backend.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key sent as `apikey` and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            base_url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Batch upsert tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Records per upsert batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempts per batch, first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (seconds); doubles on each retry.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,

    /// Pause between consecutive batches (milliseconds).
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_ms: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_initial_backoff() -> u64 {
    2
}
fn default_inter_batch_delay() -> u64 {
    500
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff(),
            inter_batch_delay_ms: default_inter_batch_delay(),
        }
    }
}

// =============================================================================
// Lookup Settings
// =============================================================================

/// Read-path settings for the lookup facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// Result limit used when the caller does not pass one.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            fallback_policy: FallbackPolicy::default(),
            default_limit: default_limit(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration of the medicine knowledge core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub lookup: LookupSettings,
}

impl SyncConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (medi.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> MediResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> MediResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> MediResult<()> {
        if let Some(ref raw) = self.remote.base_url {
            let url = url::Url::parse(raw)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SyncError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.remote.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        validate_batch_size(self.sync.batch_size)?;
        validate_max_attempts(self.sync.max_attempts)?;

        if self.lookup.default_limit == 0 {
            return Err(SyncError::InvalidConfig(
                "default_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `MEDI_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production, a map in tests).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MEDI_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.base_url = Some(url);
        }

        if let Some(key) = lookup("MEDI_API_KEY") {
            self.remote.api_key = Some(key);
        }

        if let Some(raw) = lookup("MEDI_REQUEST_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.remote.request_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric MEDI_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(raw) = lookup("MEDI_BATCH_SIZE") {
            match raw.parse::<usize>() {
                Ok(size) => {
                    debug!(batch_size = size, "Overriding batch size from environment");
                    self.sync.batch_size = size;
                }
                Err(_) => warn!(value = %raw, "Ignoring non-numeric MEDI_BATCH_SIZE"),
            }
        }

        if let Some(raw) = lookup("MEDI_MAX_ATTEMPTS") {
            match raw.parse::<u32>() {
                Ok(attempts) => self.sync.max_attempts = attempts,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric MEDI_MAX_ATTEMPTS"),
            }
        }

        if let Some(raw) = lookup("MEDI_INTER_BATCH_DELAY_MS") {
            if let Ok(ms) = raw.parse::<u64>() {
                self.sync.inter_batch_delay_ms = ms;
            }
        }

        if let Some(raw) = lookup("MEDI_FALLBACK_POLICY") {
            match raw.parse() {
                Ok(policy) => self.lookup.fallback_policy = policy,
                Err(_) => warn!(policy = %raw, "Unknown fallback policy in environment"),
            }
        }

        if let Some(raw) = lookup("MEDI_LOOKUP_LIMIT") {
            if let Ok(limit) = raw.parse::<usize>() {
                self.lookup.default_limit = limit;
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "medi", "pharmacy")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Per-request timeout for every remote call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }

    /// Retry policy for failed batches.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.sync.max_attempts,
            Duration::from_secs(self.sync.initial_backoff_secs),
        )
    }

    /// Orchestrator options derived from the `[sync]` and `[remote]` sections.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            batch_size: self.sync.batch_size,
            retry: self.retry_policy(),
            inter_batch_delay: Duration::from_millis(self.sync.inter_batch_delay_ms),
            request_timeout: self.request_timeout(),
        }
    }

    /// Returns the remote base URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.base_url.as_deref()
    }
}
