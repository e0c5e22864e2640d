//! # Connector
//!
//! Opens the store, retrying until it becomes available or the retry policy
//! runs out.
//!
//! A contact point is a database path. Each attempt tries every contact point
//! in order and returns the first store that opens; between attempts the
//! connector sleeps for the delay the policy prescribes.

use crate::ObsError;
use crate::primitives::{DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_DELAY_SECS};
use crate::storage::RedbStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// RETRY POLICY
// =============================================================================

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Delay doubles after each failed attempt, up to `max_delay`.
    Exponential,
}

/// Bounded (or explicitly unbounded) connection retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up. `0` retries forever.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub delay: Duration,
    /// Delay growth.
    pub backoff: Backoff,
    /// Upper bound for exponential delays.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CONNECT_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_CONNECT_DELAY_SECS),
            backoff: Backoff::Fixed,
            max_delay: Duration::from_secs(DEFAULT_CONNECT_DELAY_SECS * 12),
        }
    }
}

impl RetryPolicy {
    /// Retry forever with a fixed delay.
    #[must_use]
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: 0,
            delay,
            backoff: Backoff::Fixed,
            max_delay: delay,
        }
    }

    /// Check if another attempt is allowed after `attempts` failures.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts == 0 || attempts < self.max_attempts
    }

    /// Delay to wait after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 1u32
                    .checked_shl(attempt.saturating_sub(1))
                    .unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }
}

// =============================================================================
// CONNECTOR
// =============================================================================

/// Split a comma-separated contact point list, dropping empty entries.
#[must_use]
pub fn parse_contact_points(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Opens a store from a list of contact points.
#[derive(Debug, Clone)]
pub struct Connector {
    contact_points: Vec<PathBuf>,
    policy: RetryPolicy,
}

impl Connector {
    /// Create a connector. At least one contact point is required.
    pub fn new(contact_points: Vec<PathBuf>, policy: RetryPolicy) -> Result<Self, ObsError> {
        if contact_points.is_empty() {
            return Err(ObsError::Config("no contact points configured".to_string()));
        }
        Ok(Self {
            contact_points,
            policy,
        })
    }

    /// Configured contact points.
    #[must_use]
    pub fn contact_points(&self) -> &[PathBuf] {
        &self.contact_points
    }

    /// Configured retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Open a redb store, blocking between attempts.
    pub fn connect(&self) -> Result<RedbStore, ObsError> {
        self.connect_with(|point| RedbStore::open(point), std::thread::sleep)
    }

    /// Run the retry loop with a caller-supplied opener and sleeper.
    pub fn connect_with<T, O, W>(&self, mut open: O, mut sleep: W) -> Result<T, ObsError>
    where
        O: FnMut(&Path) -> Result<T, ObsError>,
        W: FnMut(Duration),
    {
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);

            let mut last_error = String::new();
            for point in &self.contact_points {
                match open(point) {
                    Ok(store) => {
                        tracing::info!(
                            contact = %point.display(),
                            attempts,
                            "connected to store"
                        );
                        return Ok(store);
                    }
                    Err(e) => {
                        tracing::warn!(
                            contact = %point.display(),
                            attempt = attempts,
                            error = %e,
                            "store connect failed"
                        );
                        last_error = e.to_string();
                    }
                }
            }

            if !self.policy.allows(attempts) {
                tracing::error!(attempts, "giving up on store connection");
                return Err(ObsError::ConnectFailed {
                    attempts,
                    last_error,
                });
            }

            let delay = self.policy.delay_before(attempts);
            tracing::info!(delay_ms = delay.as_millis() as u64, "retrying store connection");
            sleep(delay);
        }
    }
}
