//! Client-side balance checks run before a write is submitted.
//!
//! The guard is advisory: it saves a round trip that would certainly fail, but
//! the ledger still decides whether a transaction lands. A balance that moves
//! between the check and the submission surfaces as a normal transport or
//! program failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use solana_sdk::native_token::LAMPORTS_PER_SOL;

use crate::config::Cluster;
use crate::constants::{FAUCET_URL, MIN_INITIALIZE_LAMPORTS, MIN_OPERATION_LAMPORTS};
use crate::instructions::OperationKind;

/// Spendable funds in lamports, displayed in SOL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Balance {
    lamports: u64,
}

impl Balance {
    pub const fn from_lamports(lamports: u64) -> Self {
        Self { lamports }
    }

    pub const fn lamports(&self) -> u64 {
        self.lamports
    }

    pub fn sol(&self) -> f64 {
        self.lamports as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9} SOL", self.sol())
    }
}

/// Minimum balances per operation kind, in lamports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundsThresholds {
    pub initialize_lamports: u64,
    pub operation_lamports: u64,
}

impl Default for FundsThresholds {
    fn default() -> Self {
        Self {
            initialize_lamports: MIN_INITIALIZE_LAMPORTS,
            operation_lamports: MIN_OPERATION_LAMPORTS,
        }
    }
}

impl FundsThresholds {
    pub fn minimum_for(&self, operation: OperationKind) -> Balance {
        let lamports = match operation {
            OperationKind::Initialize => self.initialize_lamports,
            OperationKind::Increment | OperationKind::Reset => self.operation_lamports,
        };
        Balance::from_lamports(lamports)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(Denial),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denial {
    pub operation: OperationKind,
    pub required: Balance,
    pub available: Balance,
    /// How to get funds, only set where the operation is typically the
    /// first thing a fresh wallet does
    pub remediation: Option<String>,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient funds for {}: need at least {}, wallet holds {}",
            self.operation, self.required, self.available
        )?;
        if let Some(remediation) = &self.remediation {
            write!(f, ". {remediation}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FundsGuard {
    thresholds: FundsThresholds,
    cluster: Cluster,
}

impl FundsGuard {
    pub fn new(thresholds: FundsThresholds, cluster: Cluster) -> Self {
        Self { thresholds, cluster }
    }

    pub fn thresholds(&self) -> &FundsThresholds {
        &self.thresholds
    }

    pub fn check(&self, balance: Balance, operation: OperationKind) -> Verdict {
        let required = self.thresholds.minimum_for(operation);
        if balance >= required {
            return Verdict::Allowed;
        }

        let remediation = match operation {
            OperationKind::Initialize => Some(self.remediation()),
            OperationKind::Increment | OperationKind::Reset => None,
        };

        Verdict::Denied(Denial {
            operation,
            required,
            available: balance,
            remediation,
        })
    }

    fn remediation(&self) -> String {
        match self.cluster {
            Cluster::MainnetBeta => "Fund the wallet with SOL before creating a counter".to_string(),
            Cluster::Localnet => {
                "Request test SOL with `solana airdrop 1 --url localhost`".to_string()
            }
            Cluster::Devnet | Cluster::Testnet => format!(
                "Request test SOL with `solana airdrop 1 --url {}` or from {FAUCET_URL}",
                self.cluster.name()
            ),
        }
    }
}
