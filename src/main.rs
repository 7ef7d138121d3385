use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use clap::Subcommand;
use fin_analytics::AnalyticsConfig;
use fin_analytics::quant::portfolio::AllocationRequest;
use fin_analytics::quant::portfolio::AllocationResult;
use fin_analytics::quant::portfolio::PortfolioEngine;
use fin_analytics::quant::statements::MdaGenerator;
use prettytable::Table;
use prettytable::row;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fin-analytics", version, about = "Portfolio allocation and MD&A drafting")]
struct Cli {
  /// YAML file overriding the default deployment constants.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Recommend a capped mean-variance allocation from a wide price CSV.
  Allocate {
    /// CSV with a date column followed by one price column per asset.
    #[arg(default_value = "data/portfolio_data.csv")]
    prices: PathBuf,
    /// conservative, moderate or aggressive.
    #[arg(long, default_value = "moderate")]
    risk: String,
    /// Investment horizon in years (informational).
    #[arg(long, default_value_t = 10)]
    horizon: u32,
    #[arg(long, default_value_t = 100_000.0)]
    capital: f64,
    /// Write the allocation as JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// Draft an MD&A report from a financial-statements CSV.
  Mda {
    #[arg(default_value = "data/financial_statements.csv")]
    statements: PathBuf,
    /// Defaults to `MD&A_Draft_<timestamp>.md`.
    #[arg(long)]
    output: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = match &cli.config {
    Some(path) => AnalyticsConfig::load(path)
      .with_context(|| format!("failed to load config from {}", path.display()))?,
    None => AnalyticsConfig::default(),
  };

  match cli.command {
    Command::Allocate {
      prices,
      risk,
      horizon,
      capital,
      output,
    } => {
      let engine = PortfolioEngine::new(config)?;
      let request = AllocationRequest::new(&risk, horizon, capital);
      let result = engine
        .recommend(&prices, &request)
        .with_context(|| format!("allocation failed for {}", prices.display()))?;

      print_allocation(&result);

      let json = serde_json::to_string_pretty(&result)?;
      match output {
        Some(path) => {
          fs::write(&path, json)
            .with_context(|| format!("failed to write allocation to {}", path.display()))?;
          info!(path = %path.display(), "allocation saved");
        }
        None => println!("{json}"),
      }
    }
    Command::Mda { statements, output } => {
      let generator = MdaGenerator::new(config)?;
      let draft = generator
        .generate(&statements)
        .with_context(|| format!("MD&A generation failed for {}", statements.display()))?;

      let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
          "MD&A_Draft_{}.md",
          Local::now().format("%Y%m%d_%H%M%S")
        ))
      });
      fs::write(&path, &draft)
        .with_context(|| format!("failed to write draft to {}", path.display()))?;
      info!(path = %path.display(), chars = draft.len(), "MD&A draft saved");
    }
  }

  Ok(())
}

fn print_allocation(result: &AllocationResult) {
  let mut table = Table::new();
  table.add_row(row!["Asset", "Weight", "Amount"]);
  for (asset, weight) in &result.weights {
    let amount = result.allocation_amounts.get(asset).copied().unwrap_or(0.0);
    table.add_row(row![asset, format!("{:.2}%", weight * 100.0), format!("{amount:.2}")]);
  }
  table.printstd();

  println!("Expected return: {:.2}%", result.expected_return * 100.0);
  println!("Volatility:      {:.2}%", result.volatility * 100.0);
  println!("Sharpe ratio:    {:.3}", result.sharpe_ratio);
  println!("{}", result.llm_explanation);
}
