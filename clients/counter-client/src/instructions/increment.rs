use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::{Discriminator, InstructionData, ToAccountMetas};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct Increment;

impl Discriminator for Increment {
    const DISCRIMINATOR: &'static [u8] = &[11, 18, 104, 9, 104, 174, 59, 33];
}

impl InstructionData for Increment {}

pub struct IncrementAccounts {
    pub counter: Pubkey,
    pub user: Pubkey,
    pub owner: Pubkey,
}

impl ToAccountMetas for IncrementAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.counter, false),
            AccountMeta::new_readonly(self.user, true),
            AccountMeta::new_readonly(self.owner, false),
        ]
    }
}

pub fn increment(counter: Pubkey, user: Pubkey) -> Instruction {
    let accounts = IncrementAccounts {
        counter,
        user,
        owner: user,
    };

    Instruction {
        program_id: crate::ID,
        accounts: accounts.to_account_metas(None),
        data: Increment.data(),
    }
}
