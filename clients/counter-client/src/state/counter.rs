use anchor_lang::prelude::*;

/// On-chain counter record, one per wallet, stored at the address derived
/// from `[COUNTER_SEED, owner]`.
#[account]
#[derive(Debug, PartialEq, Eq, InitSpace)]
pub struct Counter {
    /// Wallet that created the record and may mutate it
    pub owner: Pubkey,

    /// Current value, zeroed by `reset`
    pub count: u64,

    /// Lifetime number of increments, never reset
    pub total_increments: u64,

    /// Unix timestamp of the `initialize` transaction
    pub created_at: i64,
}

impl Counter {
    pub const SPACE: usize = 8 + Counter::INIT_SPACE;

    pub fn new(owner: Pubkey, created_at: i64) -> Self {
        Self {
            owner,
            count: 0,
            total_increments: 0,
            created_at,
        }
    }

    pub fn incremented(&self) -> Option<Self> {
        Some(Self {
            count: self.count.checked_add(1)?,
            total_increments: self.total_increments.checked_add(1)?,
            ..self.clone()
        })
    }

    pub fn reset(&self) -> Self {
        Self {
            count: 0,
            ..self.clone()
        }
    }
}
