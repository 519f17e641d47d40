//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::system_clock::SystemClock;
use crate::domain::config_validation::validate_app_config;
use crate::domain::cost_basis::{
    calculate_pnl_percentage, calculate_position_pnl, calculate_total_cost_basis, format_pnl,
};
use crate::domain::error::{TradebookError, ValidationError};
use crate::domain::risk::calculate_position_risk;
use crate::domain::trade::NewTrade;
use crate::services::position_journal::PositionWithJournalInput;
use crate::services::Tradebook;

#[derive(Parser, Debug)]
#[command(name = "tradebook", about = "Trade planning journal")]
pub struct Cli {
    /// INI file with [storage] and [logging] sections
    #[arg(short, long, default_value = "tradebook.ini")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or migrate the database
    Init,
    /// Plan a position with its plan journal entry (JSON file)
    Create { input: PathBuf },
    /// List all positions
    List,
    /// Show one position
    Show { id: String },
    /// Record the position's trade (JSON file)
    AddTrade { input: PathBuf },
    /// List journal entries for a position
    Journal { position_id: String },
    /// Planned risk/reward for a position
    Risk { id: String },
    /// Unrealized P&L at a given underlying price
    Pnl {
        id: String,
        #[arg(long)]
        price: f64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second install (tests driving `run` repeatedly) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn execute(cli: Cli) -> Result<(), TradebookError> {
    let config = FileConfigAdapter::from_file(&cli.config)?;
    validate_app_config(&config)?;
    init_tracing(&config.log_level());

    let store = SqliteAdapter::from_config(&config)?;
    store.initialize_schema()?;
    let clock = SystemClock;
    let book = Tradebook::new(&store, &store, &clock);

    match cli.command {
        Command::Init => {
            println!("schema version {}", store.schema_version()?);
        }
        Command::Create { input } => {
            let input: PositionWithJournalInput = read_json(&input)?;
            let created = book.transactions.create_position_with_journal(input)?;
            print_json(&created)?;
        }
        Command::List => {
            for p in book.positions.get_all()? {
                println!(
                    "{}  {:<6} {:<10} {:?}  trades={}",
                    p.id,
                    p.symbol,
                    p.strategy_type,
                    p.status,
                    p.trades.len()
                );
            }
        }
        Command::Show { id } => print_json(&book.positions.require(&id)?)?,
        Command::AddTrade { input } => {
            let new: NewTrade = read_json(&input)?;
            print_json(&book.trades.add_trade(new)?)?;
        }
        Command::Journal { position_id } => {
            book.positions.require(&position_id)?;
            print_json(&book.journal.get_by_position_id(&position_id)?)?;
        }
        Command::Risk { id } => {
            let position = book.positions.require(&id)?;
            let metrics = calculate_position_risk(&position).ok_or_else(|| {
                ValidationError::new(format!("position {id} has no option terms"))
            })?;
            print_json(&metrics)?;
        }
        Command::Pnl { id, price } => {
            let position = book.positions.require(&id)?;
            let prices = HashMap::from([(position.symbol.clone(), price)]);
            let pnl = calculate_position_pnl(&position, &prices);
            let pct = pnl.and_then(|v| {
                calculate_pnl_percentage(v, calculate_total_cost_basis(&position.trades))
            });
            match pct {
                Some(pct) => println!("{} ({pct:.2}%)", format_pnl(pnl)),
                None => println!("{}", format_pnl(pnl)),
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TradebookError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        ValidationError::new(format!("invalid input in {}: {e}", path.display())).into()
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), TradebookError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| TradebookError::Io(e.into()))?;
    println!("{text}");
    Ok(())
}
