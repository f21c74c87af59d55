//! etfscope CLI — listing, price and table-service commands.
//!
//! Commands:
//! - `universe` — fetch the ETF list, filter and group it, print or export it
//! - `prices` — fetch the daily price history of one symbol
//! - `put` — write the filtered universe to the table service
//! - `query` — run a key-condition query against the table service
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use etfscope_core::data::{write_prices_parquet, NaverProvider, PriceProvider};
use etfscope_core::diagnostics::stopwatch;
use etfscope_core::filter::{EtfUniverse, FilterConfig};
use etfscope_core::store::{KvClient, KvRecord};
use etfscope_core::summary::summarize_by_category;
use etfscope_runner::{
    export_category_json, load_universe, put_universe, write_universe_csv, AppConfig,
    LogProgress, WriteMode,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "etfscope",
    about = "etfscope — Korean ETF universe builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the ETF list, filter and group it, and print the result.
    Universe {
        /// TOML config file (only the [filter] section is used).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum market cap, in 100M KRW. Overrides the config file.
        #[arg(long)]
        min_market_cap: Option<f64>,

        /// Extra exclusion keyword (repeatable).
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Start from an empty keyword list instead of the configured one.
        #[arg(long, default_value_t = false)]
        no_default_excludes: bool,

        /// Print the category → group summary instead of the row table.
        #[arg(long, default_value_t = false)]
        by_category: bool,

        /// With --by-category, print the summary as JSON.
        #[arg(long, default_value_t = false, requires = "by_category")]
        json: bool,

        /// Also write the universe to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Fetch the daily price history of one symbol.
    Prices {
        /// Item code, e.g. 069500.
        symbol: String,

        /// Only print the last N rows.
        #[arg(long, default_value_t = 10)]
        tail: usize,

        /// Write the full history to this Parquet file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write the filtered universe to the table service.
    Put {
        /// TOML config file with a [store] section.
        #[arg(long)]
        config: PathBuf,

        /// Write on a worker pool instead of one row at a time.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Worker count for --parallel. Defaults to twice the available cores.
        #[arg(long, requires = "parallel")]
        workers: Option<usize>,
    },
    /// Query the table service by key condition.
    Query {
        /// TOML config file with a [store] section.
        #[arg(long)]
        config: PathBuf,

        /// Key condition expression, e.g. "itemcode = :code".
        #[arg(long)]
        expr: String,

        /// Expression attribute values as JSON, e.g. '{":code": {"S": "069500"}}'.
        #[arg(long)]
        values: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Universe {
            config,
            min_market_cap,
            exclude,
            no_default_excludes,
            by_category,
            json,
            csv,
        } => run_universe(
            config.as_deref(),
            min_market_cap,
            exclude,
            no_default_excludes,
            by_category.then_some(json),
            csv,
        ),
        Commands::Prices { symbol, tail, out } => run_prices(&symbol, tail, out),
        Commands::Put {
            config,
            parallel,
            workers,
        } => run_put(&config, parallel, workers),
        Commands::Query {
            config,
            expr,
            values,
        } => run_query(&config, &expr, &values),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            AppConfig::from_file(p).with_context(|| format!("loading config {}", p.display()))
        }
        None => Ok(AppConfig::default()),
    }
}

fn run_universe(
    config_path: Option<&Path>,
    min_market_cap: Option<f64>,
    exclude: Vec<String>,
    no_default_excludes: bool,
    by_category: Option<bool>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut filter = config.filter_config();
    if no_default_excludes {
        filter.exclude_keywords.clear();
    }
    filter.exclude_keywords.extend(exclude);
    if let Some(min) = min_market_cap {
        if !min.is_finite() || min < 0.0 {
            bail!("--min-market-cap must be a non-negative number");
        }
        filter.min_market_cap = min;
    }

    let provider = NaverProvider::new()?;
    let universe = load_universe(&provider, &filter)?;

    match by_category {
        Some(true) => println!("{}", export_category_json(&summarize_by_category(&universe))?),
        Some(false) => print_categories(&universe),
        None => print_universe(&universe, &filter),
    }

    if let Some(path) = csv {
        write_universe_csv(&path, &universe)?;
        println!("CSV saved to: {}", path.display());
    }

    Ok(())
}

fn run_prices(symbol: &str, tail: usize, out: Option<PathBuf>) -> Result<()> {
    let provider = NaverProvider::new()?;
    let rows = stopwatch("fetch_prices", || provider.fetch_prices(symbol))?;

    if rows.is_empty() {
        println!("No price history for {symbol}");
        return Ok(());
    }

    println!(
        "{symbol}: {} rows, {} to {}",
        rows.len(),
        rows[0].date,
        rows[rows.len() - 1].date
    );
    println!();
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>8}",
        "Date", "Open", "High", "Low", "Close", "Volume", "Foreign%"
    );
    println!("{}", "-".repeat(76));
    for r in &rows[rows.len().saturating_sub(tail)..] {
        println!(
            "{:<10} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>12} {:>8.2}",
            r.date, r.open, r.high, r.low, r.close, r.volume, r.foreign_ratio
        );
    }

    if let Some(path) = out {
        write_prices_parquet(&rows, &path)?;
        println!("Parquet saved to: {}", path.display());
    }

    Ok(())
}

fn run_put(config_path: &Path, parallel: bool, workers: Option<usize>) -> Result<()> {
    let config = load_config(Some(config_path))?;
    let store_config = config.store()?.clone();

    let mode = match (parallel, workers) {
        (_, Some(0)) => bail!("--workers must be at least 1"),
        (true, Some(n)) => WriteMode::Parallel { workers: n },
        (true, None) => WriteMode::Parallel {
            workers: etfscope_runner::default_workers(),
        },
        (false, _) => config.write_mode(),
    };

    let provider = NaverProvider::new()?;
    let universe = load_universe(&provider, &config.filter_config())?;

    let client = KvClient::new(store_config)?;
    let summary = put_universe(&universe, &client, mode, &LogProgress)?;

    println!(
        "Put complete: {}/{} written, {} failed, {} skipped",
        summary.written.len(),
        summary.total,
        summary.failed.len(),
        summary.skipped.len()
    );

    if !summary.all_succeeded() {
        for (code, err) in &summary.failed {
            eprintln!("Error for {code}: {err}");
        }
        if !summary.skipped.is_empty() {
            eprintln!("Not attempted: {}", summary.skipped.join(", "));
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_query(config_path: &Path, expr: &str, values: &str) -> Result<()> {
    let config = load_config(Some(config_path))?;
    let values: KvRecord =
        serde_json::from_str(values).context("--values must be a JSON object of typed attributes")?;

    let client = KvClient::new(config.store()?.clone())?;
    let out = client.query(expr, &values)?;

    println!("{}", serde_json::to_string_pretty(&out.items)?);
    if let Some(count) = out.count {
        eprintln!("Count: {count}");
    }
    Ok(())
}

fn print_universe(universe: &EtfUniverse, filter: &FilterConfig) {
    println!();
    println!(
        "=== ETF Universe ({} groups, min market cap {}) ===",
        universe.len(),
        filter.min_market_cap
    );
    if !filter.exclude_keywords.is_empty() {
        println!("Excluded: {}", filter.exclude_keywords.join(", "));
    }
    println!();
    println!(
        "{:<8} {:<40} {:>10} {:>12} {:>5}",
        "Code", "Name", "MarketSum", "GroupSum", "Size"
    );
    println!("{}", "-".repeat(79));
    for rep in universe {
        println!(
            "{:<8} {:<40} {:>10} {:>12} {:>5}",
            rep.itemcode(),
            rep.itemname(),
            rep.market_sum,
            rep.group_market_sum,
            rep.group_size
        );
    }
    println!();
}

fn print_categories(universe: &EtfUniverse) {
    println!();
    for node in summarize_by_category(universe) {
        println!("{} — {}", node.category, node.total);
        for g in &node.groups {
            println!("    {:<36} {:>10}  ({})", g.group, g.group_market_sum, g.itemcode);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_requires_parallel() {
        assert!(Cli::try_parse_from(["etfscope", "put", "--config", "c.toml", "--workers", "4"])
            .is_err());

        let cli = Cli::try_parse_from([
            "etfscope", "put", "--config", "c.toml", "--parallel", "--workers", "4",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Put { parallel: true, workers: Some(4), .. }
        ));
    }

    #[test]
    fn json_requires_by_category() {
        assert!(Cli::try_parse_from(["etfscope", "universe", "--json"]).is_err());
        assert!(Cli::try_parse_from(["etfscope", "universe", "--by-category", "--json"]).is_ok());
    }
}
