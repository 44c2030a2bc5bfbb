//! Cexbank CLI - Main entry point
//!
//! Thin adapter over the engine: each subcommand maps to one core
//! operation, and `--user` stands in for the authenticated user id an HTTP
//! layer would supply.

mod commands;

use cexbank_chain::SimulatedGateway;
use cexbank_core::ChainAddress;
use cexbank_engine::Engine;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cexbank")]
#[command(about = "Cexbank - custodial exchange ledger", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Hot wallet address users deposit into
    #[arg(
        long,
        default_value = "0x00000000000000000000000000000000c0ffee00"
    )]
    hot_wallet: String,

    /// Chain decimals for the custodied asset
    #[arg(long, default_value_t = 18)]
    decimals: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Register {
        /// Email address (unique)
        email: String,
    },

    /// Submit KYC data and activate the user
    Kyc {
        /// Authenticated user id
        #[arg(long)]
        user: i64,
        /// Full legal name
        full_name: String,
        /// National id number (unique)
        national_id: String,
    },

    /// Show a user's balance
    Balance {
        #[arg(long)]
        user: i64,
    },

    /// Credit a confirmed fiat-rail deposit
    DepositFiat {
        #[arg(long)]
        user: i64,
        amount: Decimal,
    },

    /// Credit a confirmed on-chain deposit
    DepositWeb3 {
        #[arg(long)]
        user: i64,
        amount: Decimal,
    },

    /// Print the hot wallet deposit address
    DepositAddress,

    /// Print the exchange's fiat-rail payee details
    DepositFiatInfo,

    /// Transfer to another user by email
    Transfer {
        #[arg(long)]
        user: i64,
        recipient_email: String,
        amount: Decimal,
    },

    /// Withdraw to one of the user's bank cards
    WithdrawBank {
        #[arg(long)]
        user: i64,
        /// Bank card id
        card: i64,
        amount: Decimal,
    },

    /// Withdraw to a whitelisted on-chain address
    WithdrawWeb3 {
        #[arg(long)]
        user: i64,
        address: String,
        amount: Decimal,
    },

    /// Show the user's transaction history
    History {
        #[arg(long)]
        user: i64,
    },

    /// Bank card management
    #[command(subcommand)]
    Card(CardCommands),

    /// Withdrawal whitelist administration
    #[command(subcommand)]
    Whitelist(WhitelistCommands),
}

#[derive(Subcommand)]
enum CardCommands {
    /// Bind a new bank card
    Add {
        #[arg(long)]
        user: i64,
        holder_name: String,
        bank_name: String,
        card_number: String,
    },
    /// List the user's bank cards
    List {
        #[arg(long)]
        user: i64,
    },
}

#[derive(Subcommand)]
enum WhitelistCommands {
    /// List all whitelist entries
    List,
    /// Add an address to the whitelist
    Add { label: String, address: String },
    /// Set an entry to normal or frozen
    SetStatus {
        /// Whitelist entry id
        id: i64,
        /// "normal" or "frozen"
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.data)?;

    let hot_wallet = ChainAddress::parse(&cli.hot_wallet)?;
    let gateway = Arc::new(SimulatedGateway::new(hot_wallet, cli.decimals));
    let engine = Engine::open(cli.data.join("cexbank.db"), gateway).await?;

    match cli.command {
        Commands::Register { email } => commands::register(&engine, &email).await,
        Commands::Kyc {
            user,
            full_name,
            national_id,
        } => commands::kyc(&engine, user, &full_name, &national_id).await,
        Commands::Balance { user } => commands::balance(&engine, user).await,
        Commands::DepositFiat { user, amount } => {
            commands::deposit_fiat(&engine, user, amount).await
        }
        Commands::DepositWeb3 { user, amount } => {
            commands::deposit_web3(&engine, user, amount).await
        }
        Commands::DepositAddress => commands::deposit_address(&engine),
        Commands::DepositFiatInfo => commands::deposit_fiat_info(),
        Commands::Transfer {
            user,
            recipient_email,
            amount,
        } => commands::transfer(&engine, user, &recipient_email, amount).await,
        Commands::WithdrawBank { user, card, amount } => {
            commands::withdraw_bank(&engine, user, card, amount).await
        }
        Commands::WithdrawWeb3 {
            user,
            address,
            amount,
        } => commands::withdraw_web3(&engine, user, &address, amount).await,
        Commands::History { user } => commands::history(&engine, user).await,
        Commands::Card(CardCommands::Add {
            user,
            holder_name,
            bank_name,
            card_number,
        }) => commands::card_add(&engine, user, &holder_name, &bank_name, &card_number).await,
        Commands::Card(CardCommands::List { user }) => commands::card_list(&engine, user).await,
        Commands::Whitelist(WhitelistCommands::List) => commands::whitelist_list(&engine).await,
        Commands::Whitelist(WhitelistCommands::Add { label, address }) => {
            commands::whitelist_add(&engine, &label, &address).await
        }
        Commands::Whitelist(WhitelistCommands::SetStatus { id, status }) => {
            commands::whitelist_set_status(&engine, id, &status).await
        }
    }
}
