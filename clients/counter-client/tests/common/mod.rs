#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anchor_lang::{AccountDeserialize, AccountSerialize, Discriminator};
use async_trait::async_trait;
use counter_client::instructions::{Increment, Initialize, Reset};
use counter_client::{
    derive_counter_address, ClientConfig, Counter, CounterSession, KeypairWallet, LedgerClient,
    LedgerTransport, TransportError,
};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};

pub const FEE_LAMPORTS: u64 = 5_000;
pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000;
pub const STARTING_LAMPORTS: u64 = 2_000_000_000;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    balances: HashMap<Pubkey, u64>,
    statuses: HashMap<Signature, Result<(), TransactionError>>,
    unix_timestamp: i64,
}

/// In-process stand-in for the cluster running the counter program.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    read_latency: Mutex<VecDeque<Duration>>,
    send_latency: Mutex<Option<Duration>>,
    fail_reads: AtomicBool,
    fail_balance: AtomicBool,
    fail_sends: AtomicBool,
    land_failed: AtomicBool,
    hide_status: AtomicBool,
    fail_status: AtomicBool,
    calls: AtomicUsize,
    sends: AtomicUsize,
    status_polls: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Arc<Self> {
        let ledger = Self::default();
        ledger.state.lock().unwrap().unix_timestamp = GENESIS_TIMESTAMP;
        Arc::new(ledger)
    }

    pub fn fund(&self, owner: &Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(*owner, lamports);
    }

    pub fn balance(&self, owner: &Pubkey) -> u64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(owner)
            .copied()
            .unwrap_or_default()
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.state.lock().unwrap().unix_timestamp
    }

    pub fn counter(&self, address: &Pubkey) -> Option<Counter> {
        let state = self.state.lock().unwrap();
        let account = state.accounts.get(address)?;
        Counter::try_deserialize(&mut account.data.as_slice()).ok()
    }

    pub fn put_account(&self, address: Pubkey, account: Account) {
        self.state.lock().unwrap().accounts.insert(address, account);
    }

    /// Delay the next record read; the data it returns is captured before the delay.
    pub fn delay_next_read(&self, latency: Duration) {
        self.read_latency.lock().unwrap().push_back(latency);
    }

    pub fn set_send_latency(&self, latency: Option<Duration>) {
        *self.send_latency.lock().unwrap() = latency;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_balance(&self, fail: bool) {
        self.fail_balance.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Accept sends but record them as failed on-chain, charging only the fee.
    pub fn set_land_failed(&self, fail: bool) {
        self.land_failed.store(fail, Ordering::SeqCst);
    }

    pub fn set_hide_status(&self, hide: bool) {
        self.hide_status.store(hide, Ordering::SeqCst);
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn set_status(&self, signature: Signature, status: Result<(), TransactionError>) {
        self.state.lock().unwrap().statuses.insert(signature, status);
    }

    /// Total transport calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    fn rpc_error(message: impl Into<String>) -> TransportError {
        TransportError::Rpc(message.into())
    }

    fn process(&self, transaction: &Transaction) -> Result<(), TransportError> {
        transaction
            .verify()
            .map_err(|e| Self::rpc_error(format!("signature verification failed: {e}")))?;

        let message = &transaction.message;
        let payer = *message
            .account_keys
            .first()
            .ok_or_else(|| Self::rpc_error("transaction has no fee payer"))?;
        let fee = FEE_LAMPORTS * u64::from(message.header.num_required_signatures);

        let mut state = self.state.lock().unwrap();
        let payer_balance = state.balances.get(&payer).copied().unwrap_or_default();
        if payer_balance < fee {
            return Err(Self::rpc_error(
                "Attempt to debit an account but found no record of a prior credit.",
            ));
        }

        // Work on a copy so a failing instruction leaves nothing behind.
        let mut accounts = state.accounts.clone();
        let mut balances = state.balances.clone();
        *balances.entry(payer).or_default() -= fee;
        let now = state.unix_timestamp;

        for ix in &message.instructions {
            let program_id = message.account_keys[ix.program_id_index as usize];
            if program_id != counter_client::ID {
                return Err(Self::rpc_error(format!("unknown program {program_id}")));
            }
            let keys: Vec<Pubkey> = ix
                .accounts
                .iter()
                .map(|index| message.account_keys[*index as usize])
                .collect();
            let (Some(counter_key), Some(user)) = (keys.first().copied(), keys.get(1).copied())
            else {
                return Err(Self::rpc_error("missing accounts"));
            };
            if !message
                .account_keys
                .iter()
                .take(message.header.num_required_signatures as usize)
                .any(|signer| *signer == user)
            {
                return Err(Self::rpc_error("user did not sign"));
            }
            if counter_key != derive_counter_address(&user, &counter_client::ID) {
                return Err(Self::rpc_error("ConstraintSeeds: counter address mismatch"));
            }

            let data = ix.data.as_slice();
            if data.len() < 8 {
                return Err(Self::rpc_error("InstructionFallbackNotFound"));
            }
            let discriminator = &data[..8];

            let next = if discriminator == Initialize::DISCRIMINATOR {
                if accounts.contains_key(&counter_key) {
                    return Err(Self::rpc_error(format!(
                        "Allocate: account Address {{ address: {counter_key}, base: None }} already in use"
                    )));
                }
                let rent = Rent::default().minimum_balance(Counter::SPACE);
                let user_balance = balances.entry(user).or_default();
                if *user_balance < rent {
                    return Err(Self::rpc_error("insufficient lamports for rent"));
                }
                *user_balance -= rent;
                (Counter::new(user, now), rent)
            } else if discriminator == Increment::DISCRIMINATOR
                || discriminator == Reset::DISCRIMINATOR
            {
                let account = accounts
                    .get(&counter_key)
                    .ok_or_else(|| Self::rpc_error("AccountNotInitialized"))?;
                let current = Counter::try_deserialize(&mut account.data.as_slice())
                    .map_err(|e| Self::rpc_error(e.to_string()))?;
                if current.owner != user {
                    return Err(Self::rpc_error("ConstraintHasOne: owner"));
                }
                let updated = if discriminator == Reset::DISCRIMINATOR {
                    current.reset()
                } else {
                    current
                        .incremented()
                        .ok_or_else(|| Self::rpc_error("arithmetic overflow"))?
                };
                (updated, account.lamports)
            } else {
                return Err(Self::rpc_error("InstructionFallbackNotFound"));
            };

            let (counter, lamports) = next;
            let mut data = Vec::with_capacity(Counter::SPACE);
            counter
                .try_serialize(&mut data)
                .map_err(|e| Self::rpc_error(e.to_string()))?;
            accounts.insert(
                counter_key,
                Account {
                    lamports,
                    data,
                    owner: counter_client::ID,
                    executable: false,
                    rent_epoch: 0,
                },
            );
        }

        state.accounts = accounts;
        state.balances = balances;
        state.unix_timestamp += 1;
        Ok(())
    }
}

#[async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::rpc_error("connection refused"));
        }
        let snapshot = self.state.lock().unwrap().accounts.get(address).cloned();
        let latency = self.read_latency.lock().unwrap().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(snapshot)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(Self::rpc_error("connection reset"));
        }
        Ok(self.balance(address))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Hash::new_unique())
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sends.fetch_add(1, Ordering::SeqCst);
        let latency = *self.send_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Self::rpc_error("503 Service Unavailable"));
        }

        let signature = transaction.signatures[0];
        if self.land_failed.load(Ordering::SeqCst) {
            let payer = transaction.message.account_keys[0];
            let mut state = self.state.lock().unwrap();
            let balance = state.balances.entry(payer).or_default();
            *balance = balance.saturating_sub(FEE_LAMPORTS);
            state.statuses.insert(
                signature,
                Err(TransactionError::InstructionError(
                    0,
                    InstructionError::Custom(6000),
                )),
            );
            return Ok(signature);
        }

        self.process(transaction)?;
        self.set_status(signature, Ok(()));
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::rpc_error("method not found"));
        }
        if self.hide_status.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.state.lock().unwrap().statuses.get(signature).cloned())
    }
}

pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub wallet: Arc<KeypairWallet>,
    pub session: Arc<CounterSession<Arc<InMemoryLedger>>>,
}

impl Harness {
    pub fn new(config: ClientConfig) -> Self {
        let ledger = InMemoryLedger::new();
        let wallet = Arc::new(KeypairWallet::new(Keypair::new()));
        ledger.fund(&wallet.pubkey(), STARTING_LAMPORTS);

        let client = LedgerClient::new(ledger.clone(), wallet.clone());
        let session = Arc::new(CounterSession::new(config, client));
        Self {
            ledger,
            wallet,
            session,
        }
    }

    pub fn identity(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    pub fn address(&self) -> Pubkey {
        derive_counter_address(&self.identity(), &counter_client::ID)
    }

    pub async fn connected(config: ClientConfig) -> Self {
        let harness = Self::new(config);
        harness.session.connect(harness.identity()).await.unwrap();
        harness
    }

    pub async fn initialized(config: ClientConfig) -> Self {
        let harness = Self::connected(config).await;
        harness.session.initialize().await.unwrap();
        harness
    }
}

/// Let spawned tasks run until they block on something.
pub async fn settle_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
