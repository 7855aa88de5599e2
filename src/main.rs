use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod aggregate;
mod dashboard;
mod error;
mod ingest;
mod models;
mod report;
mod source;
mod trend;

use dashboard::{Dashboard, Outcome};
use models::{Department, MonthKey};
use source::{CachedFeed, FeedRef, RemoteFeed, SystemClock};

#[derive(Parser)]
#[command(name = "qa-monthly-dashboard")]
#[command(about = "Monthly QA/QC activity dashboard over a published CSV log", long_about = None)]
struct Cli {
    /// Published sheet URL (http/https) or local CSV path
    #[arg(long, env = "QA_DASHBOARD_SOURCE", global = true)]
    source: Option<String>,
    #[arg(
        long,
        env = "QA_DASHBOARD_DEPARTMENT",
        value_enum,
        ignore_case = true,
        default_value_t = Department::Qc,
        global = true
    )]
    department: Department,
    /// How long a fetched feed is reused; 0 disables caching
    #[arg(long, env = "QA_DASHBOARD_CACHE_TTL_SECS", default_value_t = 600, global = true)]
    cache_ttl_secs: u64,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the months available for the department
    Months,
    /// Print the monthly overview
    Summary {
        #[arg(long)]
        month: Option<MonthKey>,
        /// Print the full aggregate set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        month: Option<MonthKey>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Re-render the overview on an interval until interrupted
    Watch {
        #[arg(long)]
        month: Option<MonthKey>,
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
}

fn init_logging(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let source = cli
        .source
        .as_deref()
        .context("QA_DASHBOARD_SOURCE or --source must point at the activity log")?;
    let feed = FeedRef::parse(source);
    let cached = CachedFeed::new(
        RemoteFeed::new(),
        SystemClock,
        Duration::from_secs(cli.cache_ttl_secs),
    );
    let dashboard = Dashboard::new(cached, feed, cli.department);

    match cli.command {
        Commands::Months => match dashboard.months().await? {
            Outcome::Ready(months) => {
                for month in months {
                    println!("{month}");
                }
            }
            Outcome::Empty(state) => println!("{state}"),
        },
        Commands::Summary { month, json } => match dashboard.render(month).await? {
            Outcome::Ready(view) if json => {
                let body = serde_json::to_string_pretty(&view)
                    .context("failed to serialize dashboard")?;
                println!("{body}");
            }
            Outcome::Ready(view) => print!("{}", report::build_summary(&view)),
            Outcome::Empty(state) => println!("{state}"),
        },
        Commands::Report { month, out } => match dashboard.render(month).await? {
            Outcome::Ready(view) => {
                let report = report::build_report(&view);
                std::fs::write(&out, report)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
            }
            Outcome::Empty(state) => println!("{state}"),
        },
        Commands::Watch {
            month,
            interval_secs,
        } => {
            let period = Duration::from_secs(interval_secs.max(1));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
            };
            dashboard
                .watch(month, period, shutdown, |result| match result {
                    Ok(Outcome::Ready(view)) => println!("{}", report::build_summary(&view)),
                    Ok(Outcome::Empty(state)) => println!("{state}"),
                    Err(e) => tracing::error!(error = %e, "render failed"),
                })
                .await;
        }
    }

    Ok(())
}
