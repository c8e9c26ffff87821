//! CLI command implementations.

use clap::{Parser, Subcommand};
use colored::Colorize;
use locktide_core::{
    curve, CurveConfig, EmissionLedger, LockLedger, LockState, MemoryToken,
};
use locktide_types::amount::{format_token_amount, parse_token_amount};
use locktide_types::{Address, Timestamp, DAY, MONTH, ONE, WEEK, YEAR};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{Table, Tabled};

/// Simulation identities.
const ADMIN: Address = Address::repeat_byte(0xad);
const CUSTODY: Address = Address::repeat_byte(0xcc);
const MINTER: Address = Address::repeat_byte(0xee);
const TREASURY: Address = Address::repeat_byte(0x77);
const HOLDER: Address = Address::repeat_byte(0x01);

/// Main CLI.
#[derive(Parser)]
#[command(name = "locktide")]
#[command(about = "Inspect and simulate Locktide vote-escrow and emission curves")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Curve configuration file (TOML)
    #[arg(short, long, global = true, env = "LOCKTIDE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `locktide_core=debug`
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Write logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Initial voting weight of a lock profile
    Weight {
        /// Tokens to lock, decimals allowed
        #[arg(long)]
        amount: String,
        /// Cliff period in weeks
        #[arg(long)]
        cliff: u64,
        /// Slope period in weeks
        #[arg(long)]
        slope: u64,
    },

    /// Simulate a lock week by week, withdrawing whatever vests
    Lock {
        /// Tokens to lock, decimals allowed
        #[arg(long)]
        amount: String,
        /// Cliff period in weeks
        #[arg(long)]
        cliff: u64,
        /// Slope period in weeks
        #[arg(long)]
        slope: u64,
        /// Weeks to simulate (defaults to one past full vesting)
        #[arg(long)]
        weeks: Option<u64>,
    },

    /// Release the emission curve at the given offsets from the start
    Emission {
        /// Offsets such as `30d`, `6m`, `1y`, `12w` or plain seconds;
        /// defaults to the configured checkpoints
        #[arg(long = "at")]
        at: Vec<String>,
    },

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration commands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Destination file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Debug, Serialize)]
struct WeightReport {
    amount: String,
    cliff: u64,
    slope: u64,
    fraction: String,
    weight: String,
}

#[derive(Debug, Serialize, Tabled)]
struct LockWeek {
    week: u64,
    state: String,
    #[tabled(rename = "voting power")]
    voting_power: String,
    withdrawn: String,
    #[tabled(rename = "total withdrawn")]
    total_withdrawn: String,
}

#[derive(Debug, Serialize, Tabled)]
struct EmissionStep {
    #[tabled(rename = "elapsed (s)")]
    elapsed: u64,
    cumulative: String,
    minted: String,
}

/// Load the configuration from `path`, or the defaults when absent.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CurveConfig> {
    match path {
        Some(path) => Ok(CurveConfig::from_file(path)?),
        None => Ok(CurveConfig::default()),
    }
}

/// Execute a parsed command.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    tracing::debug!("Using configuration: {:?}", config);

    match cli.command {
        Commands::Weight { amount, cliff, slope } => {
            let report = weight_report(&config, &amount, cliff, slope)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_header("Voting weight");
                println!("  Amount:   {}", report.amount);
                println!("  Cliff:    {} weeks", report.cliff);
                println!("  Slope:    {} weeks", report.slope);
                println!("  Fraction: {}", report.fraction);
                println!("  Weight:   {}", report.weight.green());
            }
        }
        Commands::Lock { amount, cliff, slope, weeks } => {
            let rows = simulate_lock(&config, &amount, cliff, slope, weeks)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_header("Lock simulation");
                println!("{}", Table::new(rows));
            }
        }
        Commands::Emission { at } => {
            let offsets = if at.is_empty() {
                config.emission.checkpoints.iter().map(|c| c.elapsed).collect()
            } else {
                at.iter().map(|s| parse_offset(s)).collect::<anyhow::Result<Vec<_>>>()?
            };
            let rows = simulate_emission(&config, offsets)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_header("Emission");
                println!("{}", Table::new(rows));
            }
        }
        Commands::Config(ConfigCommands::Init { path, force }) => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
            }
            CurveConfig::default().to_file(&path)?;
            println!("{}", format!("✓ Wrote {}", path.display()).green());
        }
        Commands::Config(ConfigCommands::Show) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn weight_report(
    config: &CurveConfig,
    amount: &str,
    cliff: u64,
    slope: u64,
) -> anyhow::Result<WeightReport> {
    let principal = parse_token_amount(amount)?;
    let fraction = curve::initial_weight_fraction(&config.locking, cliff, slope)?;
    let weight = curve::voting_weight(&config.locking, principal, cliff, slope)?;
    Ok(WeightReport {
        amount: format_token_amount(principal),
        cliff,
        slope,
        fraction: format!("{}.{:08}", fraction / ONE, fraction % ONE),
        weight: format_token_amount(weight),
    })
}

fn simulate_lock(
    config: &CurveConfig,
    amount: &str,
    cliff: u64,
    slope: u64,
    weeks: Option<u64>,
) -> anyhow::Result<Vec<LockWeek>> {
    let principal = parse_token_amount(amount)?;
    let week_seconds = config.locking.week_seconds;
    let mut ledger = LockLedger::new(config.locking.clone(), ADMIN)?;
    let mut token = MemoryToken::new(CUSTODY, MINTER);
    token.credit(HOLDER, principal);

    let start: Timestamp = 0;
    let id = ledger.lock(&mut token, HOLDER, HOLDER, principal, slope, cliff, start)?;
    let weeks = weeks.unwrap_or(cliff + slope + 1);

    let mut rows = Vec::new();
    for week in 0..=weeks {
        let now = start + week * week_seconds;
        let withdrawn = ledger.withdraw(&mut token, id, now)?;
        let lock = ledger
            .get_lock(id)
            .ok_or_else(|| anyhow::anyhow!("lock {} vanished", id))?;
        let state = match lock.state(now, week_seconds) {
            LockState::Cliff => "cliff",
            LockState::Vesting => "vesting",
            LockState::FullyVested => "vested",
        };
        rows.push(LockWeek {
            week,
            state: state.to_string(),
            voting_power: format_token_amount(ledger.voting_power_of(&HOLDER, now)?),
            withdrawn: format_token_amount(withdrawn),
            total_withdrawn: format_token_amount(lock.lifetime_withdrawn()),
        });
    }
    Ok(rows)
}

fn simulate_emission(config: &CurveConfig, mut offsets: Vec<u64>) -> anyhow::Result<Vec<EmissionStep>> {
    offsets.sort_unstable();
    offsets.dedup();

    let start = config.emission.emission_start;
    let mut ledger = EmissionLedger::new(config.emission.clone(), ADMIN, MINTER, TREASURY)?;
    let mut token = MemoryToken::new(CUSTODY, MINTER);

    let mut rows = Vec::with_capacity(offsets.len());
    for elapsed in offsets {
        let minted = ledger.emit_tokens(&mut token, start.saturating_add(elapsed))?;
        rows.push(EmissionStep {
            elapsed,
            cumulative: format_token_amount(ledger.total_emitted()),
            minted: format_token_amount(minted),
        });
    }
    Ok(rows)
}

/// Parse an offset like `30d`, `12w`, `6m`, `1y` or plain seconds.
pub fn parse_offset(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], Some(c.to_ascii_lowercase())),
        _ => (s, None),
    };
    let value: u64 = digits
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid offset '{}': {}", s, e))?;
    let scale = match unit {
        None | Some('s') => 1,
        Some('d') => DAY,
        Some('w') => WEEK,
        Some('m') => MONTH,
        Some('y') => YEAR,
        Some(other) => anyhow::bail!("unknown unit '{}' in offset '{}'", other, s),
    };
    value
        .checked_mul(scale)
        .ok_or_else(|| anyhow::anyhow!("offset '{}' overflows", s))
}

fn print_header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}
