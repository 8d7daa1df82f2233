//! Wakaf operator CLI
//!
//! Submits token and escrow calls to the ledger service and reads back
//! balances, nazir status and money-out records.

mod client;
mod config;
mod errors;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wakaf_protocol::{Address, Amount};

use crate::client::{build_call_body, format_units, Call, NodeClient};
use crate::config::{parse_caller, Config};

#[derive(Parser, Debug)]
#[command(name = "wakaf")]
#[command(about = "Wakaf operator CLI - manage the MockIDR token and the Wakaf escrow", long_about = None)]
struct Cli {
    /// Ledger service URL (overrides NODE_URL)
    #[arg(long, global = true)]
    node_url: Option<String>,

    /// Account to submit calls as (overrides CALLER_ADDRESS)
    #[arg(long, global = true)]
    caller: Option<String>,

    /// Dry run mode - print the call body without submitting it
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OwnershipTarget {
    Token,
    Wakaf,
}

impl OwnershipTarget {
    fn as_str(self) -> &'static str {
        match self {
            OwnershipTarget::Token => "token",
            OwnershipTarget::Wakaf => "wakaf",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint new tokens (token owner only)
    Mint { to: Address, amount: Amount },

    /// Burn tokens from an account (token owner only)
    Burn { from: Address, amount: Amount },

    /// Transfer tokens from the caller
    Transfer { to: Address, amount: Amount },

    /// Set the caller's allowance for a spender
    Approve { spender: Address, amount: Amount },

    /// Spend an allowance granted by `from`
    TransferFrom {
        from: Address,
        to: Address,
        amount: Amount,
    },

    /// Hand a contract to a new owner
    TransferOwnership {
        #[arg(value_enum)]
        target: OwnershipTarget,
        new_owner: Address,
    },

    /// Grant the nazir role (escrow owner only)
    AddNazir { nazir: Address },

    /// Revoke the nazir role (escrow owner only)
    RemoveNazir { nazir: Address },

    /// Pay out of the escrow (nazir only)
    MoneyOut {
        amount: Amount,
        send_to: Address,
        reason: String,

        /// Token to pay in; defaults to the MockIDR token
        #[arg(long)]
        token: Option<Address>,
    },

    /// Show the MockIDR balance of an account
    Balance { address: Address },

    /// Check whether an address holds the nazir role
    IsNazir { address: Address },

    /// Fetch one recorded payout of a nazir
    MoneyOutRecord { nazir: Address, index: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(node_url) = cli.node_url {
        config.node_url = node_url;
    }
    if let Some(caller) = cli.caller.as_deref() {
        config.caller = Some(parse_caller(caller)?);
    }
    config.validate()?;

    let client = NodeClient::new(&config).context("failed to set up the node client")?;

    let call = match cli.command {
        Command::Balance { address } => {
            let balance = client.balance(address).await?;
            println!("{address}: {} ({balance} base units)", format_units(balance));
            return Ok(());
        }
        Command::IsNazir { address } => {
            let is_nazir = client.is_nazir(address).await?;
            println!("{address} is {}a nazir", if is_nazir { "" } else { "not " });
            return Ok(());
        }
        Command::MoneyOutRecord { nazir, index } => {
            let record = client.money_out_record(nazir, index).await?;
            println!("#{} amount: {}", record.index, format_units(record.amount));
            println!("  to:     {}", record.recipient);
            println!("  token:  {}", record.token_address);
            println!("  reason: {}", record.reason);
            return Ok(());
        }
        Command::Mint { to, amount } => Call::Mint { to, amount },
        Command::Burn { from, amount } => Call::Burn { from, amount },
        Command::Transfer { to, amount } => Call::Transfer { to, amount },
        Command::Approve { spender, amount } => Call::Approve { spender, amount },
        Command::TransferFrom { from, to, amount } => Call::TransferFrom { from, to, amount },
        Command::TransferOwnership { target, new_owner } => Call::TransferOwnership {
            target: target.as_str(),
            new_owner,
        },
        Command::AddNazir { nazir } => Call::AddNazir { nazir },
        Command::RemoveNazir { nazir } => Call::RemoveNazir { nazir },
        Command::MoneyOut {
            amount,
            send_to,
            reason,
            token,
        } => Call::MoneyOut {
            amount,
            send_to,
            token,
            reason,
        },
    };

    let caller = config.require_caller()?;

    if cli.dry_run {
        warn!("DRY RUN MODE - Call will not be submitted");
        println!("POST {}{}", config.node_url, call.path());
        println!("{:#}", build_call_body(&call, caller));
        return Ok(());
    }

    let block = client
        .submit_call(&call, caller)
        .await
        .with_context(|| format!("{} failed", call.path()))?;
    info!("Call {} committed", call.path());
    println!("Committed in block {block}");

    Ok(())
}
