pub mod increment;
pub mod initialize;
pub mod reset;

pub use increment::*;
pub use initialize::*;
pub use reset::*;

use std::fmt;

use anchor_lang::solana_program::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

/// The three state-changing requests the counter program accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Initialize,
    Increment,
    Reset,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Initialize,
        OperationKind::Increment,
        OperationKind::Reset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Initialize => "initialize",
            OperationKind::Increment => "increment",
            OperationKind::Reset => "reset",
        }
    }

    /// Whether the operation needs an existing record (as opposed to creating one).
    pub fn requires_record(&self) -> bool {
        !matches!(self, OperationKind::Initialize)
    }

    pub fn instruction(&self, counter: Pubkey, user: Pubkey) -> Instruction {
        match self {
            OperationKind::Initialize => initialize(counter, user),
            OperationKind::Increment => increment(counter, user),
            OperationKind::Reset => reset(counter, user),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
