use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};

use crate::config::ClientConfig;
use crate::errors::TransportError;
use crate::ledger::LedgerTransport;

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        TransportError::Rpc(err.to_string())
    }
}

/// JSON-RPC transport. Timeouts are whatever the underlying HTTP client imposes.
pub struct RpcTransport {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcTransport {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
            commitment,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.rpc_url(), config.commitment.config())
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerTransport for RpcTransport {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, TransportError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, TransportError> {
        let response = self
            .client
            .get_balance_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, TransportError> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, TransportError> {
        Ok(self.client.send_transaction(transaction).await?)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, TransportError> {
        Ok(self
            .client
            .get_signature_status_with_commitment(signature, self.commitment)
            .await?)
    }
}
