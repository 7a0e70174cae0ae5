//! Command line driver for the counter client.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use solana_sdk::signature::read_keypair_file;

use counter_client::{
    telemetry, ClientConfig, Cluster, CounterSession, KeypairWallet, LedgerClient, RpcTransport,
    SessionState, SyncEvent,
};

#[derive(Parser, Debug)]
#[command(name = "counter")]
#[command(about = "Create and update your on-chain counter")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keypair file used as the wallet (defaults to the Solana CLI keypair)
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Cluster to target (devnet, testnet, mainnet-beta, localnet)
    #[arg(long)]
    cluster: Option<Cluster>,

    /// Explicit RPC endpoint, overrides the cluster's public endpoint
    #[arg(short, long)]
    url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wallet's counter address
    Address,
    /// Show the counter and balance
    Status,
    /// Create the counter
    Init,
    /// Add one to the counter
    Increment,
    /// Set the counter back to zero
    Reset,
}

fn default_keypair_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set; pass --keypair")?;
    Ok(PathBuf::from(home).join(".config/solana/id.json"))
}

fn print_state(state: &SessionState) {
    if let Some(address) = state.address {
        println!("Counter address: {address}");
    }
    match &state.balance {
        Some(balance) => println!("Balance:         {balance}"),
        None => println!("Balance:         unknown"),
    }
    match &state.record {
        Some(record) => {
            println!("Current count:   {}", record.count);
            println!("Total increments: {}", record.total_increments);
            println!("Created at:      {} (unix)", record.created_at);
        }
        None => println!("You haven't created a counter yet! Run `counter init`."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(args.verbose);

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(cluster) = args.cluster {
        config.cluster = cluster;
    }
    if let Some(url) = args.url {
        config.rpc_url = Some(url);
    }

    let keypair_path = match args.keypair {
        Some(path) => path,
        None => default_keypair_path()?,
    };
    let keypair = read_keypair_file(&keypair_path)
        .map_err(|e| anyhow!("failed to read keypair {}: {e}", keypair_path.display()))?;
    let wallet = Arc::new(KeypairWallet::new(keypair));

    let transport = RpcTransport::from_config(&config);
    let session = CounterSession::new(config, LedgerClient::new(transport, wallet));

    let mut events = session.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if !matches!(event, SyncEvent::Refreshed { .. } | SyncEvent::Connected { .. }) {
                println!("{}", event.message());
            }
        }
    });

    if let Err(err) = session.sync_wallet().await {
        eprintln!("Warning: {err}");
    }

    match args.command {
        Command::Address => {
            if let Some(address) = session.snapshot().address {
                println!("{address}");
            }
        }
        Command::Status => print_state(&session.snapshot()),
        Command::Init => {
            session.initialize().await?;
            print_state(&session.snapshot());
        }
        Command::Increment => {
            session.increment().await?;
            print_state(&session.snapshot());
        }
        Command::Reset => {
            session.reset().await?;
            print_state(&session.snapshot());
        }
    }

    drop(session);
    let _ = printer.await;
    Ok(())
}
