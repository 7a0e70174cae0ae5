use std::fmt;

use solana_sdk::pubkey::Pubkey;

use crate::funds::Balance;
use crate::state::Counter;

/// Where the in-flight write (if any) currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Guarding,
    Submitting,
    AwaitingConfirmation,
    Reconciling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Guarding => "guarding",
            Phase::Submitting => "submitting",
            Phase::AwaitingConfirmation => "awaiting confirmation",
            Phase::Reconciling => "reconciling",
        };
        f.write_str(name)
    }
}

/// Local view of one wallet's counter. Rebuilt from scratch whenever the
/// connected identity changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Pubkey>,
    pub address: Option<Pubkey>,
    pub record: Option<Counter>,
    /// Last balance read successfully; `None` until the first read lands
    pub balance: Option<Balance>,
    pub busy: bool,
    pub phase: Phase,
    pub(crate) epoch: u64,
    pub(crate) applied_seq: u64,
}

impl SessionState {
    pub(crate) fn connected(epoch: u64, identity: Pubkey, address: Pubkey) -> Self {
        Self {
            identity: Some(identity),
            address: Some(address),
            epoch,
            ..Self::default()
        }
    }

    pub(crate) fn cleared(epoch: u64) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some() && self.address.is_some()
    }

    /// Session generation; bumped on every connect and disconnect.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn can_initialize(&self) -> bool {
        self.is_connected() && !self.busy && self.record.is_none()
    }

    pub fn can_update(&self) -> bool {
        self.is_connected() && !self.busy && self.record.is_some()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.busy = phase != Phase::Idle;
    }
}
