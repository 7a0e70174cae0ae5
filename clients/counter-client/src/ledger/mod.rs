//! Reads and writes against the remote ledger.

pub mod rpc;
pub mod wallet;

pub use rpc::*;
pub use wallet::*;

use std::sync::Arc;

use anchor_lang::AccountDeserialize;
use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};

use crate::errors::{Action, CounterClientError, TransportError, WalletError};
use crate::funds::Balance;
use crate::instructions::OperationKind;
use crate::state::Counter;

/// Minimal view of a ledger connection. A missing account is `Ok(None)`.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, TransportError>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, TransportError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, TransportError>;

    /// Returns once the ledger has accepted the transaction for processing.
    async fn send_transaction(&self, transaction: &Transaction)
        -> Result<Signature, TransportError>;

    /// `None` while the ledger has no status for the signature at the
    /// configured commitment.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, TransportError>;
}

#[async_trait]
impl<T: LedgerTransport + ?Sized> LedgerTransport for Arc<T> {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, TransportError> {
        (**self).get_account(address).await
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, TransportError> {
        (**self).get_balance(address).await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, TransportError> {
        (**self).get_latest_blockhash().await
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, TransportError> {
        (**self).send_transaction(transaction).await
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, TransportError> {
        (**self).get_signature_status(signature).await
    }
}

/// A ledger connection paired with the wallet that signs for it.
pub struct LedgerClient<T> {
    transport: T,
    wallet: Arc<dyn Wallet>,
    program_id: Pubkey,
}

impl<T: LedgerTransport> LedgerClient<T> {
    pub fn new(transport: T, wallet: Arc<dyn Wallet>) -> Self {
        Self {
            transport,
            wallet,
            program_id: crate::ID,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Fetch and decode the counter record. `Ok(None)` means it has not been
    /// created yet; any `Err` means its state is unknown.
    pub async fn fetch_record(&self, address: &Pubkey) -> Result<Option<Counter>, TransportError> {
        let Some(account) = self.transport.get_account(address).await? else {
            tracing::debug!(%address, "counter not initialized yet");
            return Ok(None);
        };

        if account.owner != self.program_id {
            return Err(TransportError::WrongOwner {
                address: *address,
                owner: account.owner,
            });
        }

        let counter = Counter::try_deserialize(&mut account.data.as_slice()).map_err(|e| {
            TransportError::Malformed {
                address: *address,
                reason: e.to_string(),
            }
        })?;
        Ok(Some(counter))
    }

    pub async fn fetch_balance(&self, identity: &Pubkey) -> Result<Balance, TransportError> {
        let lamports = self.transport.get_balance(identity).await?;
        Ok(Balance::from_lamports(lamports))
    }

    /// Build, sign and send `operation` for `identity`'s counter at `address`.
    ///
    /// Fails with [`CounterClientError::NoSigner`] before touching the network
    /// when the wallet cannot sign for `identity`.
    pub async fn submit(
        &self,
        operation: OperationKind,
        address: Pubkey,
        identity: Pubkey,
    ) -> Result<Signature, CounterClientError> {
        if !self.wallet.can_sign() || self.wallet.public_key() != Some(identity) {
            return Err(CounterClientError::NoSigner { operation });
        }

        let transport_err = move |source: TransportError| CounterClientError::Transport {
            action: Action::Submit(operation),
            source,
        };

        let instruction = operation.instruction(address, identity);
        let recent_blockhash = self
            .transport
            .get_latest_blockhash()
            .await
            .map_err(transport_err)?;

        let unsigned = Transaction::new_with_payer(&[instruction], Some(&identity));
        let transaction = self
            .wallet
            .sign_transaction(unsigned, recent_blockhash)
            .map_err(|source| match source {
                WalletError::NotConnected | WalletError::SigningUnsupported => {
                    CounterClientError::NoSigner { operation }
                }
                source => CounterClientError::Wallet { operation, source },
            })?;

        let signature = self
            .transport
            .send_transaction(&transaction)
            .await
            .map_err(transport_err)?;
        tracing::info!(%operation, %signature, %address, "transaction accepted");
        Ok(signature)
    }

    pub async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, TransportError> {
        self.transport.get_signature_status(signature).await
    }
}
