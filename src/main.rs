use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use finlens::cli::OutputFormat;
use finlens::core::log::init_logging;
use finlens::core::{Adjustment, HistoryProvider};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List known trading dates
    TradeDates {
        /// Show every day in range with its open/holiday/future status
        #[arg(long)]
        status: bool,
    },
    /// Show the last open day strictly before a date (default: today)
    LastOpen {
        /// Pivot date, YYYYMMDD
        #[arg(long)]
        before: Option<String>,
    },
    /// Shanghai Stock Exchange daily summary
    Summary {
        /// Trading date, YYYYMMDD (default: last open day before today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Daily price history for one or more codes
    History {
        /// Stock code, e.g. 600000 or sh600000
        #[arg(long = "code", required = true)]
        codes: Vec<String>,
        /// Start date, YYYYMMDD
        #[arg(long)]
        start_date: Option<String>,
        /// End date, YYYYMMDD
        #[arg(long)]
        end_date: Option<String>,
        /// Price adjustment: none, qfq or hfq
        #[arg(long, default_value = "none")]
        adjust: Adjustment,
        /// Upstream data source: eastmoney, sina or tencent
        #[arg(long, default_value = "eastmoney")]
        source: HistoryProvider,
    },
    /// Realtime quotes
    Quote {
        /// Stock codes
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

impl From<Commands> for finlens::AppCommand {
    fn from(cmd: Commands) -> finlens::AppCommand {
        match cmd {
            Commands::TradeDates { status } => finlens::AppCommand::TradeDates {
                with_status: status,
            },
            Commands::LastOpen { before } => finlens::AppCommand::LastOpen { before },
            Commands::Summary { date } => finlens::AppCommand::Summary { date },
            Commands::History {
                codes,
                start_date,
                end_date,
                adjust,
                source,
            } => finlens::AppCommand::History {
                codes,
                start_date,
                end_date,
                adjust,
                provider: source,
            },
            Commands::Quote { codes } => finlens::AppCommand::Quote { codes },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => finlens::cli::setup::setup(),
        Some(cmd) => finlens::run_command(cmd.into(), cli.config_path.as_deref(), cli.format).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
