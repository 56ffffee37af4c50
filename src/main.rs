use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod error;
mod export;
mod ingest;
mod models;
mod report;
mod risk;
mod scoring;
mod weights;

use models::{HealthBand, Level, ScoredAccount};
use report::AccountFilter;
use weights::{WeightOverrides, Weights};

#[derive(Parser)]
#[command(name = "customer-health")]
#[command(about = "Customer success health scoring for account portfolios", long_about = None)]
struct Cli {
    #[command(flatten)]
    input: InputArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Account table with the required columns
    #[arg(long, global = true, default_value = "sample_data.csv")]
    csv: PathBuf,
    /// JSON file naming all five metric weights
    #[arg(long, global = true)]
    weights: Option<PathBuf>,
    #[arg(long, global = true)]
    nps_weight: Option<f64>,
    #[arg(long, global = true)]
    csat_weight: Option<f64>,
    #[arg(long, global = true)]
    usage_weight: Option<f64>,
    #[arg(long, global = true)]
    logins_weight: Option<f64>,
    #[arg(long, global = true)]
    tickets_weight: Option<f64>,
    /// Reference date for renewal horizons (defaults to today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    segment: Vec<String>,
    #[arg(long, value_enum)]
    band: Vec<BandArg>,
    #[arg(long, value_enum)]
    risk: Vec<RiskArg>,
    /// Case-insensitive customer name fragment
    #[arg(long)]
    customer: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BandArg {
    Red,
    Yellow,
    Green,
}

#[derive(Clone, Copy, ValueEnum)]
enum RiskArg {
    Low,
    Medium,
    High,
}

#[derive(Subcommand)]
enum Commands {
    /// Print portfolio KPIs and the least healthy accounts
    Score {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "health_report.md")]
        out: PathBuf,
    },
    /// Write the enriched account table
    Export {
        #[arg(long, default_value = "enriched_accounts.csv")]
        out: PathBuf,
        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },
    /// List the segments present in the input
    Segments,
}

impl InputArgs {
    fn weights(&self) -> anyhow::Result<Weights> {
        let base = match &self.weights {
            Some(path) => Weights::from_path(path)
                .with_context(|| format!("failed to load weights from {}", path.display()))?,
            None => Weights::default(),
        };
        Ok(base.with_overrides(WeightOverrides {
            nps: self.nps_weight,
            csat: self.csat_weight,
            usage: self.usage_weight,
            logins: self.logins_weight,
            tickets: self.tickets_weight,
        }))
    }

    fn as_of(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl From<FilterArgs> for AccountFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            segments: args.segment,
            bands: args
                .band
                .into_iter()
                .map(|band| match band {
                    BandArg::Red => HealthBand::Red,
                    BandArg::Yellow => HealthBand::Yellow,
                    BandArg::Green => HealthBand::Green,
                })
                .collect(),
            risks: args
                .risk
                .into_iter()
                .map(|risk| match risk {
                    RiskArg::Low => Level::Low,
                    RiskArg::Medium => Level::Medium,
                    RiskArg::High => Level::High,
                })
                .collect(),
            customer: args.customer,
        }
    }
}

/// Scored accounts together with the weights they were scored with.
fn load_and_score(input: &InputArgs) -> anyhow::Result<(Weights, Vec<ScoredAccount>)> {
    let weights = input.weights()?;
    let records = ingest::load_accounts_from_path(&input.csv)
        .with_context(|| format!("failed to load accounts from {}", input.csv.display()))?;
    let accounts = scoring::score_accounts(&records, &weights, input.as_of())
        .context("failed to score accounts")?;
    log::info!(
        "scored {} accounts from {}",
        accounts.len(),
        input.csv.display()
    );
    Ok((weights, accounts))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { filter, limit } => {
            let (_, accounts) = load_and_score(&cli.input)?;
            let summary = report::summarize(&accounts);

            println!("Total ARR: {}", report::format_money(summary.total_arr));
            println!(
                "ARR (Yellow + Red): {}",
                report::format_money(summary.at_risk_arr)
            );
            println!(
                "ARR renewing in 180 days: {}",
                report::format_money(summary.near_term_renewal_arr)
            );
            println!("Red accounts: {}", summary.red_accounts);
            for band in report::band_breakdown(&accounts) {
                println!(
                    "  {}: {} accounts, {}",
                    band.band,
                    band.accounts,
                    report::format_money(band.arr)
                );
            }

            let view = report::account_view(&accounts, &AccountFilter::from(filter));
            if view.is_empty() {
                println!("No accounts match the selected filters.");
                return Ok(());
            }

            println!("Least healthy accounts:");
            for account in view.iter().take(limit) {
                println!("- {}", report::format_account_line(account));
                println!("    {}", account.actions_display());
            }
        }
        Commands::Report { filter, out } => {
            let (weights, accounts) = load_and_score(&cli.input)?;
            let report = report::build_report(
                &accounts,
                &AccountFilter::from(filter),
                &weights,
                cli.input.as_of(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out, json } => {
            let (_, accounts) = load_and_score(&cli.input)?;
            export::export_to_path(&accounts, &out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {} accounts to {}.", accounts.len(), out.display());
        }
        Commands::Segments => {
            let (_, accounts) = load_and_score(&cli.input)?;
            for segment in report::segments(&accounts) {
                println!("{segment}");
            }
        }
    }

    Ok(())
}
