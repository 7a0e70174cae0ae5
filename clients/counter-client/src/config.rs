//! Client configuration.
//!
//! Defaults target devnet with the settle intervals the counter program needs
//! for read-after-write consistency. A TOML file may override any field, and
//! a few environment variables override the file.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;

use crate::constants::*;
use crate::errors::ConfigError;
use crate::funds::FundsThresholds;
use crate::instructions::OperationKind;

pub const CLUSTER_ENV: &str = "COUNTER_CLUSTER";
pub const RPC_URL_ENV: &str = "COUNTER_RPC_URL";
pub const COMMITMENT_ENV: &str = "COUNTER_COMMITMENT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn name(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" | "d" => Ok(Cluster::Devnet),
            "testnet" | "t" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" | "m" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" | "l" => Ok(Cluster::Localnet),
            _ => Err(ConfigError::UnknownCluster(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn config(&self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl FromStr for Commitment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            _ => Err(ConfigError::UnknownCommitment(s.to_string())),
        }
    }
}

/// How the synchronizer waits between submission and reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConfirmationStrategy {
    /// Sleep the settle interval for the operation, then reconcile.
    FixedDelay,
    /// Poll the signature status with exponential backoff. Falls back to the
    /// settle interval when the status cannot be observed in time.
    Poll {
        initial_backoff_ms: u64,
        max_backoff_ms: u64,
        timeout_ms: u64,
    },
}

impl Default for ConfirmationStrategy {
    fn default() -> Self {
        ConfirmationStrategy::Poll {
            initial_backoff_ms: POLL_INITIAL_BACKOFF_MS,
            max_backoff_ms: POLL_MAX_BACKOFF_MS,
            timeout_ms: POLL_TIMEOUT_MS,
        }
    }
}

/// What a failed record read means for the local view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Keep the last known record and report the failure.
    #[default]
    Strict,
    /// Treat the failure as "no record yet".
    Lenient,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub cluster: Cluster,
    /// Explicit RPC endpoint; the cluster's public endpoint when unset
    pub rpc_url: Option<String>,
    pub commitment: Commitment,
    pub confirmation: ConfirmationStrategy,
    pub initialize_settle_ms: u64,
    pub update_settle_ms: u64,
    pub funds: FundsThresholds,
    pub fetch_failure: FetchFailurePolicy,
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            commitment: Commitment::default(),
            confirmation: ConfirmationStrategy::default(),
            initialize_settle_ms: INITIALIZE_SETTLE_MS,
            update_settle_ms: UPDATE_SETTLE_MS,
            funds: FundsThresholds::default(),
            fetch_failure: FetchFailurePolicy::default(),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Fixed-delay confirmation, handy where the status endpoint is unreliable.
    pub fn with_fixed_delay(mut self) -> Self {
        self.confirmation = ConfirmationStrategy::FixedDelay;
        self
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or_else(|| self.cluster.url())
    }

    pub fn settle_delay(&self, operation: OperationKind) -> Duration {
        let ms = match operation {
            OperationKind::Initialize => self.initialize_settle_ms,
            OperationKind::Increment | OperationKind::Reset => self.update_settle_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given (defaults otherwise), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&contents, path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(CLUSTER_ENV) {
            self.cluster = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: CLUSTER_ENV,
                value,
            })?;
        }
        if let Some(value) = lookup(RPC_URL_ENV) {
            if !value.trim().is_empty() {
                self.rpc_url = Some(value);
            }
        }
        if let Some(value) = lookup(COMMITMENT_ENV) {
            self.commitment = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: COMMITMENT_ENV,
                value,
            })?;
        }
        Ok(())
    }
}
