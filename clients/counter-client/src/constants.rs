pub const COUNTER_SEED: &[u8] = b"counter";

/// Minimum balance before an `initialize` is attempted: rent for the counter
/// account plus fees, with headroom.
pub const MIN_INITIALIZE_LAMPORTS: u64 = 5_000_000;
pub const MIN_OPERATION_LAMPORTS: u64 = 10_000;

pub const INITIALIZE_SETTLE_MS: u64 = 2_000;
pub const UPDATE_SETTLE_MS: u64 = 1_000;

pub const POLL_INITIAL_BACKOFF_MS: u64 = 250;
pub const POLL_MAX_BACKOFF_MS: u64 = 2_000;
pub const POLL_TIMEOUT_MS: u64 = 15_000;

pub const EVENT_CHANNEL_CAPACITY: usize = 64;

pub const FAUCET_URL: &str = "https://faucet.solana.com";
