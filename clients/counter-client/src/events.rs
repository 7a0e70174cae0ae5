use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::instructions::OperationKind;
use crate::state::Counter;
use crate::sync::Confirmation;

/// Session lifecycle notifications for a presentation layer. Snapshots of the
/// full state are on the watch channel; these carry the one-off messages.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    Connected {
        identity: Pubkey,
        address: Pubkey,
    },
    Disconnected,
    Refreshed {
        record: Option<Counter>,
    },
    Submitted {
        operation: OperationKind,
        signature: Signature,
    },
    Confirmed {
        operation: OperationKind,
        signature: Signature,
        confirmation: Confirmation,
    },
    Reconciled {
        operation: OperationKind,
        signature: Signature,
        record: Option<Counter>,
    },
    Failed {
        operation: OperationKind,
        message: String,
    },
}

impl SyncEvent {
    /// One-line user-facing text for the event.
    pub fn message(&self) -> String {
        match self {
            SyncEvent::Connected { identity, .. } => format!("Connected {identity}"),
            SyncEvent::Disconnected => "Wallet disconnected".to_string(),
            SyncEvent::Refreshed { record: None } => "Counter not initialized yet".to_string(),
            SyncEvent::Refreshed { record: Some(record) } => {
                format!("Counter is at {}", record.count)
            }
            SyncEvent::Submitted { operation, signature } => {
                format!("{} transaction sent: {signature}", capitalized(*operation))
            }
            SyncEvent::Confirmed {
                operation,
                confirmation,
                ..
            } => format!("{} {confirmation}", capitalized(*operation)),
            SyncEvent::Reconciled {
                operation: OperationKind::Initialize,
                ..
            } => "Counter initialized successfully!".to_string(),
            SyncEvent::Reconciled { record, .. } => match record {
                Some(record) => format!("Counter is now {}", record.count),
                None => "Transaction sent but the counter is not visible yet".to_string(),
            },
            SyncEvent::Failed { operation, message } => {
                format!("Failed to {operation} counter: {message}")
            }
        }
    }
}

fn capitalized(operation: OperationKind) -> String {
    let name = operation.name();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
