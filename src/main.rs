use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use simfin_stocks::api::{FinancialDataProvider, SimFinClient};
use simfin_stocks::dataset::TrainingSetBuilder;
use simfin_stocks::models::{Config, DateRange};

#[derive(Parser)]
#[command(name = "simfin-stocks", about = "Fetch SimFin market data and build training datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch daily share prices for a ticker
    Prices {
        ticker: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Fetch quarterly income statements for a ticker
    Income {
        ticker: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Fetch balance sheets for a ticker
    Balance {
        ticker: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Build the labeled training CSV for a set of tickers
    Dataset {
        /// Tickers to include, e.g. AAPL MSFT GOOG
        tickers: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "training_data.csv")]
        output: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = SimFinClient::new(&config)?;

    match cli.command {
        Command::Prices { ticker, start, end } => {
            let table = client.fetch_prices(&ticker, start, end).await;
            info!("Fetched {} price rows for {}", table.len(), ticker);
            println!("{}", table.columns().join(","));
            for row in table.iter() {
                println!("{},{},{}", row.date, row.ticker, row.close);
            }
        }
        Command::Income { ticker, start, end } => {
            let table = client.fetch_income_statement(&ticker, start, end).await;
            info!("Fetched {} income rows for {}", table.len(), ticker);
            println!("{}", table.columns().join(","));
            for row in table.iter() {
                println!(
                    "{},{},{},{},{},{}",
                    row.ticker, row.date, row.fiscal_period, row.fiscal_year, row.revenue, row.net_income
                );
            }
        }
        Command::Balance { ticker, start, end } => {
            let table = client.fetch_balance_sheet(&ticker, start, end).await;
            info!("Fetched {} balance sheet rows for {}", table.len(), ticker);
            println!("{}", table.columns().join(","));
            for row in table.iter() {
                println!(
                    "{},{},{},{},{}",
                    row.date, row.ticker, row.total_liabilities, row.total_equity, row.share_capital
                );
            }
        }
        Command::Dataset {
            tickers,
            start,
            end,
            output,
        } => {
            if tickers.is_empty() {
                anyhow::bail!("at least one ticker is required");
            }
            let builder = TrainingSetBuilder::new(&client);
            let rows = builder
                .build(&tickers, DateRange::new(start, end), &output)
                .await?;
            println!("Wrote {} rows to {}", rows, output.display());
        }
    }

    Ok(())
}
