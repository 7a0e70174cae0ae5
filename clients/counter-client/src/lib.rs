//! Client for the per-user counter program.
//!
//! A [`sync::CounterSession`] owns the local view of one wallet's counter record
//! and keeps it reconciled with the ledger across initialize, increment and
//! reset transactions.

use anchor_lang::prelude::*;

pub mod address;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod funds;
pub mod instructions;
pub mod ledger;
pub mod state;
pub mod sync;
pub mod telemetry;

pub use address::{derive_counter_address, find_counter_address};
pub use config::{ClientConfig, Cluster, Commitment, ConfirmationStrategy, FetchFailurePolicy};
pub use errors::{CounterClientError, RejectReason, TransportError, WalletError};
pub use events::SyncEvent;
pub use funds::{Balance, Denial, FundsGuard, Verdict};
pub use instructions::OperationKind;
pub use ledger::{KeypairWallet, LedgerClient, LedgerTransport, RpcTransport, Wallet, WatchOnlyWallet};
pub use state::{Counter, Phase, SessionState};
pub use sync::{Confirmation, CounterSession, OperationReceipt};

declare_id!("HNVpWAQDDdAGq36gpHysc674pWhSv55nng9k9s55Pdqw");
