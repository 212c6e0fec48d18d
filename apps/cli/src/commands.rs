//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ordertrack_core::collect::{CollectionRun, run_collection};
use ordertrack_core::ingest::{IngestProgress, IngestSummary};
use ordertrack_core::report::{render_most_recent, render_order_line};
use ordertrack_core::scheduler::{DailySchedule, run_daily};
use ordertrack_shared::{
    AppConfig, OrderRecord, OrderTrackError, init_config, init_config_at, load_config,
    load_config_from,
};
use ordertrack_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ordertrack: keep a local archive of presidential executive orders.
#[derive(Parser)]
#[command(
    name = "ordertrack",
    version,
    about = "Collect executive orders from whitehouse.gov into a local store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.ordertrack/ordertrack.toml).
    #[arg(long, global = true, env = "ORDERTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding `storage.db_path`.
    #[arg(long, global = true, env = "ORDERTRACK_DB")]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run on the daily schedule instead of once.
    #[arg(long)]
    pub scheduler: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Collect new orders once, then show the most recent one.
    Run,

    /// Collect new orders every day at `schedule.run_at` until interrupted.
    Schedule,

    /// Show the most recently collected order.
    Latest {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List recently collected orders, newest first.
    List {
        /// Maximum number of orders to show.
        #[arg(short, long, default_value = "10")]
        limit: u32,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ordertrack=info",
        1 => "ordertrack=debug",
        _ => "ordertrack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Some(command) => command,
        None if cli.scheduler => Command::Schedule,
        None => Command::Run,
    };

    let config = || resolve_config(cli.config.as_deref(), cli.db.as_deref());

    match command {
        Command::Run => cmd_run(&config()?).await,
        Command::Schedule => cmd_schedule(&config()?).await,
        Command::Latest { json } => cmd_latest(&config()?, json).await,
        Command::List { limit, json } => cmd_list(&config()?, limit, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(cli.config.as_deref()),
            ConfigAction::Show => cmd_config_show(&config()?),
        },
    }
}

/// Load the config file (explicit path or default location) and apply flag
/// overrides.
fn resolve_config(path: Option<&Path>, db: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(eyre!("config file not found: {}", path.display()));
            }
            load_config_from(path)?
        }
        None => load_config()?,
    };

    if let Some(db) = db {
        config.storage.db_path = db.to_string_lossy().to_string();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig) -> Result<()> {
    info!("running single collection");
    let progress = CliProgress;
    let run = run_collection(config, &progress).await?;
    print_latest(&run);
    Ok(())
}

async fn cmd_schedule(config: &AppConfig) -> Result<()> {
    let schedule = DailySchedule::parse(&config.schedule.run_at)?;
    println!(
        "Scheduled daily at {} (local time). Press Ctrl-C to stop.",
        schedule.at().format("%H:%M")
    );

    let progress = CliProgress;
    let runs = run_daily(schedule, || {
        let progress = &progress;
        async move {
            let run = run_collection(config, progress).await?;
            print_latest(&run);
            Ok::<_, OrderTrackError>(())
        }
    })
    .await;

    println!("Scheduler stopped after {runs} run(s).");
    Ok(())
}

async fn cmd_latest(config: &AppConfig, json: bool) -> Result<()> {
    let Some(storage) = open_existing(config).await? else {
        println!("No orders stored yet.");
        return Ok(());
    };

    match storage.list_recent(1).await?.into_iter().next() {
        Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
        Some(record) => print!("{}", render_most_recent(&record)),
        None => println!("No orders stored yet."),
    }
    Ok(())
}

async fn cmd_list(config: &AppConfig, limit: u32, json: bool) -> Result<()> {
    let Some(storage) = open_existing(config).await? else {
        println!("No orders stored yet.");
        return Ok(());
    };

    let records = storage.list_recent(limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No orders stored yet.");
        return Ok(());
    }

    let total = storage.count_orders().await?;
    for record in &records {
        println!("{}", render_order_line(record));
    }
    println!();
    println!("  Showing {} of {total} stored order(s).", records.len());
    Ok(())
}

/// Open the configured store read-only, or `None` if it was never created.
async fn open_existing(config: &AppConfig) -> Result<Option<Storage>> {
    let path = config.storage.resolved_db_path()?;
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(Storage::open_readonly(&path).await?))
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_latest(run: &CollectionRun) {
    match &run.latest {
        Some(record) => {
            println!();
            print!("{}", render_most_recent(record));
        }
        None => println!("No orders stored yet."),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Prints each stored order and the run summary to stdout.
struct CliProgress;

impl IngestProgress for CliProgress {
    fn listing_failed(&self, error: &OrderTrackError) {
        println!("  Could not fetch the listing page: {error}");
    }

    fn order_stored(&self, index: usize, record: &OrderRecord, degraded: bool) {
        if degraded {
            println!("  {index}. {} (detail unavailable)", record.title);
        } else {
            println!("  {index}. {}", record.title);
        }
    }

    fn known_reached(&self, title: &str) {
        println!("  Already stored: {title}");
    }

    fn finished(&self, summary: &IngestSummary) {
        println!();
        println!("  Collection finished.");
        println!("  Inserted: {}", summary.inserted);
        if summary.skipped_known > 0 {
            println!("  Skipped:  {}", summary.skipped_known);
        }
        if summary.degraded > 0 {
            println!("  Degraded: {}", summary.degraded);
        }
        println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    }
}
