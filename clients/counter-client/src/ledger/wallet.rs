use std::sync::atomic::{AtomicBool, Ordering};

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

use crate::errors::WalletError;

/// Signing capability supplied by a wallet integration.
pub trait Wallet: Send + Sync {
    /// Currently connected identity, if any.
    fn public_key(&self) -> Option<Pubkey>;

    fn can_sign(&self) -> bool;

    fn sign_transaction(
        &self,
        transaction: Transaction,
        recent_blockhash: Hash,
    ) -> Result<Transaction, WalletError>;

    fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
        recent_blockhash: Hash,
    ) -> Result<Vec<Transaction>, WalletError> {
        transactions
            .into_iter()
            .map(|tx| self.sign_transaction(tx, recent_blockhash))
            .collect()
    }
}

/// Wallet backed by a local keypair, e.g. a CLI keypair file.
pub struct KeypairWallet {
    keypair: Keypair,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(true),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Wallet for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.is_connected().then(|| self.keypair.pubkey())
    }

    fn can_sign(&self) -> bool {
        self.is_connected()
    }

    fn sign_transaction(
        &self,
        mut transaction: Transaction,
        recent_blockhash: Hash,
    ) -> Result<Transaction, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        transaction.try_sign(&[&self.keypair], recent_blockhash)?;
        Ok(transaction)
    }
}

/// Identity without a signer: reads work, every write fails with `NoSigner`.
pub struct WatchOnlyWallet {
    identity: Pubkey,
}

impl WatchOnlyWallet {
    pub fn new(identity: Pubkey) -> Self {
        Self { identity }
    }
}

impl Wallet for WatchOnlyWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.identity)
    }

    fn can_sign(&self) -> bool {
        false
    }

    fn sign_transaction(
        &self,
        _transaction: Transaction,
        _recent_blockhash: Hash,
    ) -> Result<Transaction, WalletError> {
        Err(WalletError::SigningUnsupported)
    }
}
