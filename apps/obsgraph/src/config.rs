//! # Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. optional TOML file (`--config`)
//! 3. environment (`OBSGRAPH_KEYSPACE`, `OBSGRAPH_CONTACTS`,
//!    `OBSGRAPH_CONNECT_ATTEMPTS`, `OBSGRAPH_CONNECT_DELAY_SECS`)
//! 4. command-line flags
//!
//! ```toml
//! [store]
//! keyspace = "rdf"
//! contacts = ["/var/lib/obsgraph/rdf.redb"]
//! backend = "redb"
//!
//! [connect]
//! max_attempts = 12
//! delay_secs = 5
//! backoff = "exponential"
//! max_delay_secs = 60
//!
//! [consumer]
//! write_retries = 3
//! retry_delay_ms = 500
//! dead_letter = "/var/lib/obsgraph/dead.ndjson"
//!
//! [bootstrap]
//! seed_vocabulary = true
//! ```

use obsgraph_core::primitives::{
    DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_DELAY_SECS, DEFAULT_KEYSPACE,
};
use obsgraph_core::{
    Backoff, Connector, MemoryStore, ObsError, RetryPolicy, StoreBackend, parse_contact_points,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default database file when no contact point is configured.
pub const DEFAULT_DATABASE: &str = "obsgraph.redb";

// =============================================================================
// SECTIONS
// =============================================================================

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Persistent redb database.
    #[default]
    Redb,
    /// Volatile in-process tables.
    Memory,
}

impl BackendKind {
    /// Config-file spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ObsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(ObsError::Config(format!(
                "unknown backend {other:?} (expected \"redb\" or \"memory\")"
            ))),
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub keyspace: String,
    pub contacts: Vec<PathBuf>,
    pub backend: BackendKind,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keyspace: DEFAULT_KEYSPACE.to_string(),
            contacts: vec![PathBuf::from(DEFAULT_DATABASE)],
            backend: BackendKind::Redb,
        }
    }
}

/// `[connect]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectConfig {
    /// `0` retries forever.
    pub max_attempts: u32,
    pub delay_secs: u64,
    pub backoff: Backoff,
    pub max_delay_secs: u64,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: DEFAULT_CONNECT_ATTEMPTS,
            delay_secs: DEFAULT_CONNECT_DELAY_SECS,
            backoff: policy.backoff,
            max_delay_secs: policy.max_delay.as_secs(),
        }
    }
}

/// `[consumer]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Extra attempts after a failed write.
    pub write_retries: u32,
    pub retry_delay_ms: u64,
    /// Where lines that could not be written go. Unset stops the consumer
    /// on the first write that exhausts its retries.
    pub dead_letter: Option<PathBuf>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            write_retries: 3,
            retry_delay_ms: 500,
            dead_letter: None,
        }
    }
}

impl ConsumerConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// `[bootstrap]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub seed_vocabulary: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            seed_vocabulary: true,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Flag values that override everything else. `None` leaves a setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub keyspace: Option<String>,
    pub backend: Option<BackendKind>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub connect: ConnectConfig,
    pub consumer: ConsumerConfig,
    pub bootstrap: BootstrapConfig,
}

impl Config {
    /// Resolve defaults, file, environment and flags.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ObsError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file over the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ObsError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ObsError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ObsError> {
        toml::from_str(text).map_err(|e| ObsError::Config(e.to_string()))
    }

    /// Apply environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ObsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keyspace) = lookup("OBSGRAPH_KEYSPACE") {
            self.store.keyspace = keyspace;
        }
        if let Some(contacts) = lookup("OBSGRAPH_CONTACTS") {
            self.store.contacts = parse_contact_points(&contacts);
        }
        if let Some(attempts) = lookup("OBSGRAPH_CONNECT_ATTEMPTS") {
            self.connect.max_attempts = parse_number("OBSGRAPH_CONNECT_ATTEMPTS", &attempts)?;
        }
        if let Some(delay) = lookup("OBSGRAPH_CONNECT_DELAY_SECS") {
            self.connect.delay_secs = parse_number("OBSGRAPH_CONNECT_DELAY_SECS", &delay)?;
        }
        Ok(())
    }

    /// Apply command-line flags.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(database) = &overrides.database {
            self.store.contacts = vec![database.clone()];
        }
        if let Some(keyspace) = &overrides.keyspace {
            self.store.keyspace.clone_from(keyspace);
        }
        if let Some(backend) = overrides.backend {
            self.store.backend = backend;
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<(), ObsError> {
        obsgraph_core::NamespaceSpec::new(self.store.keyspace.as_str())?;
        if self.store.backend == BackendKind::Redb && self.store.contacts.is_empty() {
            return Err(ObsError::Config("no contact points configured".to_string()));
        }
        Ok(())
    }

    /// Connection retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect.max_attempts,
            delay: Duration::from_secs(self.connect.delay_secs),
            backoff: self.connect.backoff,
            max_delay: Duration::from_secs(self.connect.max_delay_secs),
        }
    }

    /// Open the configured store, retrying per the connect policy.
    ///
    /// Blocks the calling thread while waiting between attempts.
    pub fn open_backend(&self) -> Result<StoreBackend, ObsError> {
        match self.store.backend {
            BackendKind::Memory => {
                tracing::warn!("using in-memory store; nothing will be persisted");
                Ok(StoreBackend::InMemory(MemoryStore::new()))
            }
            BackendKind::Redb => {
                let connector = Connector::new(self.store.contacts.clone(), self.retry_policy())?;
                Ok(StoreBackend::Persistent(connector.connect()?))
            }
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ObsError> {
    value
        .trim()
        .parse()
        .map_err(|_| ObsError::Config(format!("{key}: not a number: {value:?}")))
}
