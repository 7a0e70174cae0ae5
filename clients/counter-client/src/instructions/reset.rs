use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::{Discriminator, InstructionData, ToAccountMetas};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct Reset;

impl Discriminator for Reset {
    const DISCRIMINATOR: &'static [u8] = &[23, 81, 251, 84, 138, 183, 240, 214];
}

impl InstructionData for Reset {}

pub struct ResetAccounts {
    pub counter: Pubkey,
    pub user: Pubkey,
    pub owner: Pubkey,
}

impl ToAccountMetas for ResetAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.counter, false),
            AccountMeta::new_readonly(self.user, true),
            AccountMeta::new_readonly(self.owner, false),
        ]
    }
}

pub fn reset(counter: Pubkey, user: Pubkey) -> Instruction {
    let accounts = ResetAccounts {
        counter,
        user,
        owner: user,
    };

    Instruction {
        program_id: crate::ID,
        accounts: accounts.to_account_metas(None),
        data: Reset.data(),
    }
}
