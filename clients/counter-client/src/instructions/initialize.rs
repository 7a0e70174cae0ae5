use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::{Discriminator, InstructionData, ToAccountMetas};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct Initialize;

impl Discriminator for Initialize {
    const DISCRIMINATOR: &'static [u8] = &[175, 175, 109, 31, 13, 152, 155, 237];
}

impl InstructionData for Initialize {}

/// Accounts for `initialize`. The user pays rent for the new record.
pub struct InitializeAccounts {
    pub counter: Pubkey,
    pub user: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for InitializeAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.counter, false),
            AccountMeta::new(self.user, true),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub fn initialize(counter: Pubkey, user: Pubkey) -> Instruction {
    let accounts = InitializeAccounts {
        counter,
        user,
        system_program: anchor_lang::system_program::ID,
    };

    Instruction {
        program_id: crate::ID,
        accounts: accounts.to_account_metas(None),
        data: Initialize.data(),
    }
}
