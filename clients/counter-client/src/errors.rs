use std::fmt;
use std::path::PathBuf;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

use crate::funds::Denial;
use crate::instructions::OperationKind;

/// Failure surfaced by a session action. Every variant names the action it
/// belongs to so a presentation layer can render it without extra context.
#[derive(Debug, Error)]
pub enum CounterClientError {
    #[error("{operation} failed: wallet is not connected or cannot sign")]
    NoSigner { operation: OperationKind },

    #[error("{operation} failed: {denial}")]
    InsufficientFunds {
        operation: OperationKind,
        denial: Denial,
    },

    #[error("{action} failed: {source}")]
    Transport {
        action: Action,
        #[source]
        source: TransportError,
    },

    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: OperationKind,
        reason: RejectReason,
    },

    #[error("{operation} failed: wallet refused to sign: {source}")]
    Wallet {
        operation: OperationKind,
        #[source]
        source: WalletError,
    },

    #[error("{operation} failed: transaction {signature} was rejected by the program: {error}")]
    TransactionFailed {
        operation: OperationKind,
        signature: Signature,
        error: TransactionError,
    },

    #[error("{operation} result discarded: the wallet session changed while it was in flight")]
    SessionChanged { operation: OperationKind },
}

impl CounterClientError {
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Self::NoSigner { operation }
            | Self::InsufficientFunds { operation, .. }
            | Self::Rejected { operation, .. }
            | Self::Wallet { operation, .. }
            | Self::TransactionFailed { operation, .. }
            | Self::SessionChanged { operation } => Some(*operation),
            Self::Transport { action, .. } => action.operation(),
        }
    }
}

/// What the client was doing when a transport call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    FetchRecord,
    FetchBalance,
    Submit(OperationKind),
    Confirm(OperationKind),
}

impl Action {
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Action::Submit(op) | Action::Confirm(op) => Some(*op),
            Action::FetchRecord | Action::FetchBalance => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::FetchRecord => f.write_str("fetching counter record"),
            Action::FetchBalance => f.write_str("fetching balance"),
            Action::Submit(op) => write!(f, "submitting {op}"),
            Action::Confirm(op) => write!(f, "confirming {op}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("no wallet is connected")]
    NotConnected,

    #[error("another operation is still in flight")]
    Busy,

    #[error("counter already exists for this wallet")]
    AlreadyInitialized,

    #[error("counter has not been created yet")]
    NotInitialized,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rpc request failed: {0}")]
    Rpc(String),

    #[error("account {address} is not owned by the counter program (owner {owner})")]
    WrongOwner { address: Pubkey, owner: Pubkey },

    #[error("malformed account data at {address}: {reason}")]
    Malformed { address: Pubkey, reason: String },
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("wallet does not support transaction signing")]
    SigningUnsupported,

    #[error("signing request was rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("unknown cluster {0:?}")]
    UnknownCluster(String),

    #[error("unknown commitment level {0:?}")]
    UnknownCommitment(String),
}
