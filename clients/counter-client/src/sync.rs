//! Read-after-write reconciliation of the local session with the ledger.
//!
//! A [`CounterSession`] runs at most one write at a time. Each write moves
//! through guarding, submitting, awaiting confirmation and reconciling, and
//! ends with a fresh read of the record and balance. Every read is tagged
//! with a sequence number and every session rebuild bumps an epoch; results
//! are only applied when their epoch is still current and no newer read has
//! landed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tokio::sync::{broadcast, watch};
use tokio::time::{sleep, Duration, Instant};
use tracing::Instrument;

use crate::address::derive_counter_address;
use crate::config::{ClientConfig, ConfirmationStrategy, FetchFailurePolicy};
use crate::errors::{Action, CounterClientError, RejectReason, TransportError};
use crate::events::SyncEvent;
use crate::funds::{Balance, FundsGuard, Verdict};
use crate::instructions::OperationKind;
use crate::ledger::{LedgerClient, LedgerTransport};
use crate::state::{Counter, Phase, SessionState};

/// How the synchronizer decided the write had landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// The ledger reported the signature at the configured commitment.
    Confirmed,
    /// Status was not observable; the settle interval elapsed instead.
    Assumed,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confirmation::Confirmed => f.write_str("confirmed"),
            Confirmation::Assumed => f.write_str("assumed settled after delay"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationReceipt {
    pub operation: OperationKind,
    pub signature: Signature,
    pub confirmation: Confirmation,
    /// False when the post-write record read failed and the last known
    /// record was kept
    pub record_refreshed: bool,
}

/// Snapshot of the session taken when a write starts.
struct Ticket {
    epoch: u64,
    identity: Pubkey,
    address: Pubkey,
    balance: Option<Balance>,
}

enum RecordView {
    Known(Option<Counter>),
    Unknown(TransportError),
}

struct Observation {
    record: RecordView,
    balance: Option<Balance>,
}

pub struct CounterSession<T> {
    config: ClientConfig,
    ledger: LedgerClient<T>,
    guard: FundsGuard,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SyncEvent>,
    next_seq: AtomicU64,
}

impl<T: LedgerTransport> CounterSession<T> {
    pub fn new(config: ClientConfig, ledger: LedgerClient<T>) -> Self {
        let guard = FundsGuard::new(config.funds.clone(), config.cluster);
        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            ledger,
            guard,
            state,
            events,
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerClient<T> {
        &self.ledger
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Adopt whatever identity the wallet currently reports.
    pub async fn sync_wallet(&self) -> Result<(), CounterClientError> {
        let identity = self.ledger.wallet().public_key();
        self.set_identity(identity).await
    }

    /// Rebuild the session for `identity`, or clear it for `None`. Setting the
    /// identity that is already connected only refreshes.
    pub async fn set_identity(&self, identity: Option<Pubkey>) -> Result<(), CounterClientError> {
        let current = self.state.borrow().identity;
        match identity {
            Some(identity) if current == Some(identity) => self.refresh().await.map(|_| ()),
            Some(identity) => self.connect(identity).await,
            None => {
                self.disconnect();
                Ok(())
            }
        }
    }

    /// Start a fresh session for `identity` and run the initial read.
    pub async fn connect(&self, identity: Pubkey) -> Result<(), CounterClientError> {
        let address = derive_counter_address(&identity, self.ledger.program_id());
        self.state.send_modify(|state| {
            *state = SessionState::connected(state.epoch + 1, identity, address);
        });
        tracing::info!(%identity, %address, "wallet connected");
        self.emit(SyncEvent::Connected { identity, address });

        self.refresh().await.map(|_| ())
    }

    /// Clear the session. Anything still in flight for the old session is
    /// discarded when it completes.
    pub fn disconnect(&self) {
        let had_identity = self.state.borrow().identity.is_some();
        self.state.send_modify(|state| {
            *state = SessionState::cleared(state.epoch + 1);
        });
        if had_identity {
            tracing::info!("wallet disconnected");
            self.emit(SyncEvent::Disconnected);
        }
    }

    /// Re-read the record and balance outside of any write. Returns whether
    /// the result was applied; it is dropped when the session changed or a
    /// newer read already landed.
    pub async fn refresh(&self) -> Result<bool, CounterClientError> {
        let (epoch, identity, address) = {
            let state = self.state.borrow();
            match (state.identity, state.address) {
                (Some(identity), Some(address)) => (state.epoch, identity, address),
                _ => return Ok(false),
            }
        };

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let observation = self.observe(&identity, &address).await;
        let applied = self.apply(epoch, seq, &observation, false);

        if applied {
            if let RecordView::Known(record) = &observation.record {
                self.emit(SyncEvent::Refreshed {
                    record: record.clone(),
                });
            }
        } else {
            tracing::debug!(seq, epoch, "discarding stale read");
        }

        match observation.record {
            RecordView::Unknown(source) => Err(CounterClientError::Transport {
                action: Action::FetchRecord,
                source,
            }),
            RecordView::Known(_) => Ok(applied),
        }
    }

    pub async fn initialize(&self) -> Result<OperationReceipt, CounterClientError> {
        self.run(OperationKind::Initialize).await
    }

    pub async fn increment(&self) -> Result<OperationReceipt, CounterClientError> {
        self.run(OperationKind::Increment).await
    }

    pub async fn reset(&self) -> Result<OperationReceipt, CounterClientError> {
        self.run(OperationKind::Reset).await
    }

    pub async fn run(&self, operation: OperationKind) -> Result<OperationReceipt, CounterClientError> {
        // Checked and marked busy before the first await, so a second request
        // is turned away synchronously.
        let ticket = self.begin(operation)?;

        let span = tracing::info_span!("counter_write", %operation, epoch = ticket.epoch);
        let result = self.drive(operation, &ticket).instrument(span).await;

        if let Err(err) = &result {
            self.fail(operation, &ticket, err);
        }
        result
    }

    fn begin(&self, operation: OperationKind) -> Result<Ticket, CounterClientError> {
        let mut outcome = Err(RejectReason::NotConnected);
        self.state.send_if_modified(|state| {
            let (Some(identity), Some(address)) = (state.identity, state.address) else {
                return false;
            };
            if state.busy {
                outcome = Err(RejectReason::Busy);
                return false;
            }
            match (operation.requires_record(), state.record.is_some()) {
                (false, true) => {
                    outcome = Err(RejectReason::AlreadyInitialized);
                    return false;
                }
                (true, false) => {
                    outcome = Err(RejectReason::NotInitialized);
                    return false;
                }
                _ => {}
            }

            state.set_phase(Phase::Guarding);
            outcome = Ok(Ticket {
                epoch: state.epoch,
                identity,
                address,
                balance: state.balance,
            });
            true
        });

        outcome.map_err(|reason| {
            tracing::debug!(%operation, %reason, "write rejected");
            CounterClientError::Rejected { operation, reason }
        })
    }

    async fn drive(
        &self,
        operation: OperationKind,
        ticket: &Ticket,
    ) -> Result<OperationReceipt, CounterClientError> {
        match ticket.balance {
            Some(balance) => {
                if let Verdict::Denied(denial) = self.guard.check(balance, operation) {
                    return Err(CounterClientError::InsufficientFunds { operation, denial });
                }
            }
            None => tracing::warn!("balance unknown, skipping funds check"),
        }

        self.enter(ticket, Phase::Submitting, operation)?;
        let signature = self
            .ledger
            .submit(operation, ticket.address, ticket.identity)
            .await?;
        self.emit(SyncEvent::Submitted {
            operation,
            signature,
        });

        self.enter(ticket, Phase::AwaitingConfirmation, operation)?;
        let confirmation = self.await_confirmation(operation, &signature).await?;
        self.emit(SyncEvent::Confirmed {
            operation,
            signature,
            confirmation,
        });

        self.enter(ticket, Phase::Reconciling, operation)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let observation = self.observe(&ticket.identity, &ticket.address).await;
        if !self.apply(ticket.epoch, seq, &observation, true) {
            return Err(CounterClientError::SessionChanged { operation });
        }

        let (record, record_refreshed) = match observation.record {
            RecordView::Known(record) => (record, true),
            RecordView::Unknown(err) => {
                tracing::warn!(%operation, error = %err, "reconciliation read failed, keeping last known record");
                (self.state.borrow().record.clone(), false)
            }
        };
        if record.is_none() {
            tracing::warn!(%operation, %signature, "record still absent after reconciliation");
        }
        tracing::info!(%operation, %signature, %confirmation, "reconciled");
        self.emit(SyncEvent::Reconciled {
            operation,
            signature,
            record,
        });

        Ok(OperationReceipt {
            operation,
            signature,
            confirmation,
            record_refreshed,
        })
    }

    async fn await_confirmation(
        &self,
        operation: OperationKind,
        signature: &Signature,
    ) -> Result<Confirmation, CounterClientError> {
        let settle = self.config.settle_delay(operation);

        let ConfirmationStrategy::Poll {
            initial_backoff_ms,
            max_backoff_ms,
            timeout_ms,
        } = self.config.confirmation
        else {
            sleep(settle).await;
            return Ok(Confirmation::Assumed);
        };

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let max_backoff = Duration::from_millis(max_backoff_ms.max(1));
        let mut backoff = Duration::from_millis(initial_backoff_ms.max(1)).min(max_backoff);

        loop {
            match self.ledger.signature_status(signature).await {
                Ok(Some(Ok(()))) => return Ok(Confirmation::Confirmed),
                Ok(Some(Err(error))) => {
                    return Err(CounterClientError::TransactionFailed {
                        operation,
                        signature: *signature,
                        error,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        action = %Action::Confirm(operation),
                        "signature status unavailable, falling back to settle delay"
                    );
                    break;
                }
            }

            if Instant::now() + backoff > deadline {
                tracing::warn!(%signature, "confirmation timed out, falling back to settle delay");
                break;
            }
            sleep(backoff).await;
            backoff = (backoff * 2).min(max_backoff);
        }

        sleep(settle).await;
        Ok(Confirmation::Assumed)
    }

    async fn observe(&self, identity: &Pubkey, address: &Pubkey) -> Observation {
        let record = match self.ledger.fetch_record(address).await {
            Ok(record) => RecordView::Known(record),
            Err(err) => match self.config.fetch_failure {
                FetchFailurePolicy::Lenient => {
                    tracing::debug!(error = %err, "record fetch failed, treating as not initialized");
                    RecordView::Known(None)
                }
                FetchFailurePolicy::Strict => {
                    tracing::warn!(error = %err, action = %Action::FetchRecord, "record state unknown");
                    RecordView::Unknown(err)
                }
            },
        };

        let balance = match self.ledger.fetch_balance(identity).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::warn!(error = %err, action = %Action::FetchBalance, "keeping last known balance");
                None
            }
        };

        Observation { record, balance }
    }

    /// Apply a read to the session if it still belongs to it. With `finish`,
    /// the write's busy flag is cleared in the same update, so observers never
    /// see an idle session with pre-write data. Returns false only when the
    /// session changed.
    fn apply(&self, epoch: u64, seq: u64, observation: &Observation, finish: bool) -> bool {
        let mut current = false;
        let mut fresh = false;
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            current = true;

            if seq > state.applied_seq {
                fresh = true;
                state.applied_seq = seq;
                if let RecordView::Known(record) = &observation.record {
                    state.record = record.clone();
                }
                if let Some(balance) = observation.balance {
                    state.balance = Some(balance);
                }
            }
            if finish {
                state.set_phase(Phase::Idle);
            }
            fresh || finish
        });

        if finish {
            current
        } else {
            fresh
        }
    }

    fn enter(
        &self,
        ticket: &Ticket,
        phase: Phase,
        operation: OperationKind,
    ) -> Result<(), CounterClientError> {
        let mut current = false;
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch {
                return false;
            }
            current = true;
            state.set_phase(phase);
            true
        });

        if current {
            tracing::debug!(%phase, "phase");
            Ok(())
        } else {
            Err(CounterClientError::SessionChanged { operation })
        }
    }

    fn fail(&self, operation: OperationKind, ticket: &Ticket, err: &CounterClientError) {
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch || !state.busy {
                return false;
            }
            state.set_phase(Phase::Idle);
            true
        });

        match err {
            CounterClientError::SessionChanged { .. } => {
                tracing::info!(%operation, "session changed, result discarded");
            }
            err => {
                tracing::error!(%operation, error = %err, "write failed");
                self.emit(SyncEvent::Failed {
                    operation,
                    message: err.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
