//! BonusCraft CLI
//!
//! Command-line interface for distributing a peer bonus pool.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bonuscraft_distributor::{Distributor, DistributorConfig, Plan};
use bonuscraft_keystore::{encrypt_wallet, resolve_account, Account};
use bonuscraft_ledger::{max_transfers_per_transaction, GasSettings, LedgerClient, LedgerConfig};
use bonuscraft_logging::{try_init as try_init_logging, LogLevel};
use bonuscraft_settings::{default_settings_path, Mode, Settings};

/// BonusCraft - proportional peer bonus distribution
#[derive(Parser)]
#[command(name = "bonuscraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value_os_t = default_settings_path())]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate the bonus and submit every batch
    Run {
        /// Wallet password (prompted if not given)
        #[arg(long, env = "BONUSCRAFT_WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Allocate and validate without submitting anything
    Plan {
        /// Wallet password (prompted if not given)
        #[arg(long, env = "BONUSCRAFT_WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Write a default config file
    Init {
        /// Bonus pool to distribute
        #[arg(long)]
        bonus: u64,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Wallet management
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Create a new encrypted operator wallet
    New {
        /// Where to write the wallet
        #[arg(short, long, default_value = "wallet.json")]
        out: PathBuf,

        /// Wallet password (prompted if not given)
        #[arg(long, env = "BONUSCRAFT_WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ignore if already initialized
    let _ = try_init_logging(LogLevel::from_verbose(cli.verbose));

    match cli.command {
        Commands::Run { password } => run(&cli.config, password)?,
        Commands::Plan { password } => plan(&cli.config, password)?,
        Commands::Init { bonus, force } => init(&cli.config, bonus, force)?,
        Commands::Wallet { action } => match action {
            WalletAction::New { out, password } => new_wallet(&out, password)?,
        },
    }

    Ok(())
}

// ============================================================================
// Distribution
// ============================================================================

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load_from(path).with_context(|| format!("failed to load config {}", path.display()))
}

fn load_account(settings: &Settings, password: Option<String>) -> Result<Account> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    resolve_account(&settings.wallet_file, &password)
        .with_context(|| format!("failed to open wallet {}", settings.wallet_file.display()))
}

fn run(config: &Path, password: Option<String>) -> Result<()> {
    let settings = load_settings(config)?;
    let account = load_account(&settings, password)?;

    let ledger_config = match settings.mode {
        Mode::Mock => LedgerConfig::mock(),
        Mode::Live => LedgerConfig::live(settings.json_rpc_address.clone()),
    };
    info!(
        "Distributing {} from {} via {:?} ledger",
        settings.bonus,
        account.address(),
        settings.mode,
    );

    let ledger = LedgerClient::with_secret_key(ledger_config, account.secret_bytes())?;
    let distributor = Distributor::new(DistributorConfig::from_settings(&settings), ledger);
    let report = distributor.run()?;

    print_plan(&report.plan);
    for receipt in &report.receipts {
        println!(
            "Batch {}: {} transfers, {} total, txHash {}",
            receipt.index, receipt.transfers, receipt.amount, receipt.hash,
        );
    }
    println!("Submitted {} batches", report.receipts.len());
    Ok(())
}

fn plan(config: &Path, password: Option<String>) -> Result<()> {
    let settings = load_settings(config)?;
    let account = load_account(&settings, password)?;

    let ledger = LedgerClient::with_secret_key(LedgerConfig::mock(), account.secret_bytes())?;
    let distributor = Distributor::new(DistributorConfig::from_settings(&settings), ledger);
    let plan = distributor.plan()?;

    print_plan(&plan);
    for batch in &plan.batches {
        println!("Batch {}: {} transfers, {} total", batch.index, batch.len(), batch.total());
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("Allocation");
    println!("==========");
    println!("Records:     {} ({} zero-value dropped)", plan.records, plan.dropped);
    println!("Transfers:   {}", plan.allocations.len());
    println!("Total:       {}", plan.total);
    println!("Permitted:   {}", plan.permitted);
    println!("Batches:     {}", plan.batches.len());
}

// ============================================================================
// Setup
// ============================================================================

fn init(config: &Path, bonus: u64, force: bool) -> Result<()> {
    if config.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", config.display());
    }

    let mut settings = Settings::default();
    settings.bonus = bonus;
    // Largest batch one transaction can carry
    let gas = GasSettings::new(settings.gas_price, settings.gas_limit);
    settings.batch_size = Some(max_transfers_per_transaction(&gas)?);
    settings.validate()?;
    settings.save_to(config)?;

    println!("Default config written to {}", config.display());
    Ok(())
}

fn new_wallet(out: &Path, password: Option<String>) -> Result<()> {
    if out.exists() {
        bail!("{} already exists", out.display());
    }

    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    let account = Account::generate();
    encrypt_wallet(&account, &password)?.save(out)?;

    println!("Wallet written to {}", out.display());
    println!("Operator address: {}", account.address());
    println!("Please fund this address before running a distribution");
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Wallet password: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
