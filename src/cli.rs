//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    read_date, strategy_params, validate_data_config, validate_strategy_config,
};
use crate::domain::error::DipshopError;
use crate::domain::ledger::TradeLedger;
use crate::domain::metrics::Metrics;
use crate::domain::price_table::PriceTable;
use crate::domain::strategy::{format_pct, StrategyParams};
use crate::domain::trigger::{level_label, triggers, LEVELS};
use crate::domain::universe::{missing_references, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;

pub const DEFAULT_LEDGER_PATH: &str = "trades.csv";

#[derive(Parser, Debug)]
#[command(name = "dipshop", about = "Yearly buy-the-dip backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overriding [data] prices
        #[arg(short, long)]
        prices: Option<PathBuf>,
        /// Comma-separated codes, overriding [data] codes
        #[arg(long)]
        codes: Option<String>,
        /// Ledger CSV, overriding [output] ledger
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration and show the trigger levels
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show symbols and date range of a price file
    Info {
        #[arg(short, long)]
        prices: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub prices: Option<PathBuf>,
    pub codes: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            codes,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                prices,
                codes,
                output,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { prices } => run_info(&CsvPriceAdapter::new(prices)),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DipshopError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        log::error!("{err}");
        ExitCode::from(&err)
    })
}

fn fail(err: DipshopError) -> ExitCode {
    log::error!("{err}");
    (&err).into()
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    log::info!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter, overrides) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let prices = CsvPriceAdapter::new(bt_config.prices.clone());
    run_backtest_pipeline(&prices, &CsvLedgerAdapter, &bt_config)
}

/// Validates every section and assembles the run configuration, applying `overrides`.
pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<BacktestConfig, DipshopError> {
    validate_data_config(adapter)?;
    validate_strategy_config(adapter)?;

    let prices = match &overrides.prices {
        Some(p) => p.clone(),
        None => adapter
            .get_nonempty("data", "prices")
            .map(PathBuf::from)
            .ok_or_else(|| DipshopError::ConfigMissing {
                section: "data".into(),
                key: "prices".into(),
            })?,
    };

    let codes = match overrides
        .codes
        .clone()
        .or_else(|| adapter.get_nonempty("data", "codes"))
    {
        Some(raw) => Some(parse_codes(&raw).map_err(|e| DipshopError::ConfigInvalid {
            section: "data".into(),
            key: "codes".into(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    let ledger_path = overrides
        .output
        .clone()
        .or_else(|| adapter.get_nonempty("output", "ledger").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH));

    Ok(BacktestConfig {
        prices,
        start_date: read_date(adapter, "data", "start_date")?,
        end_date: read_date(adapter, "data", "end_date")?,
        codes,
        ledger_path,
        print_trades: adapter.get_bool("output", "print_trades", false),
        params: strategy_params(adapter)?,
    })
}

/// Loads the price table and narrows it to the configured window and universe.
pub fn prepare_table(
    price_port: &dyn PricePort,
    bt_config: &BacktestConfig,
) -> Result<PriceTable, DipshopError> {
    log::info!("Loading prices from {}", price_port.source());
    let table = price_port
        .load_prices()?
        .between(bt_config.start_date, bt_config.end_date);
    let table = match &bt_config.codes {
        Some(codes) => table.restrict(codes)?,
        None => table,
    };

    if table.is_empty() {
        log::warn!("no price rows in the selected date range");
    }
    for missing in missing_references(&table) {
        log::warn!(
            "{}: no price on the first trading day of {}, no buys that year",
            missing.symbol,
            missing.year
        );
    }
    Ok(table)
}

pub fn run_backtest_pipeline(
    price_port: &dyn PricePort,
    ledger_port: &dyn LedgerPort,
    bt_config: &BacktestConfig,
) -> ExitCode {
    let table = match prepare_table(price_port, bt_config) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    log::info!(
        "Running backtest: {} symbols, {} rows ({} to {})",
        table.symbols().len(),
        table.row_count(),
        display_date(table.first_date()),
        display_date(table.last_date()),
    );

    let result = match backtest_engine::run_backtest(&table, &bt_config.params) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let metrics = Metrics::compute(&result, &table);
    print_summary(&metrics);
    if bt_config.print_trades {
        print_trades(&result.ledger);
    }

    match ledger_port.write(&result.ledger, &bt_config.ledger_path) {
        Ok(()) => {
            println!("\nLedger written to: {}", bt_config.ledger_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

pub fn print_summary(metrics: &Metrics) {
    println!("=== Aggregate Results ===");
    println!("Buys:             {}", metrics.total_buys);
    println!("Sells:            {}", metrics.total_sells);
    println!("Capital Deployed: {:.2}", metrics.capital_deployed);
    println!("Realized P&L:     {:+.2}", metrics.realized_pnl);
    println!("Unrealized P&L:   {:+.2}", metrics.unrealized_pnl);
    println!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    println!("Open Lots:        {}", metrics.open_lots);

    if !metrics.symbols.is_empty() {
        println!("\n=== Per-Symbol Summary ===");
        for s in &metrics.symbols {
            println!(
                "  {}: {} buys, {} sells, {} open shares, realized {:+.2}, unrealized {:+.2}",
                s.symbol, s.buys, s.sells, s.open_shares, s.realized_pnl, s.unrealized_pnl,
            );
        }
    }
}

pub fn print_trades(ledger: &TradeLedger) {
    println!("\n=== Trades ===");
    for r in ledger {
        println!(
            "{} {:<4} {:<12} {:>6} @ {:>10.2}  {}",
            r.date, r.action, r.symbol, r.shares, r.price, r.annotation
        );
    }
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    log::info!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter, overrides) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    println!("Prices:  {}", bt_config.prices.display());
    println!(
        "Range:   {} to {}",
        display_date(bt_config.start_date),
        display_date(bt_config.end_date)
    );
    match &bt_config.codes {
        Some(codes) => println!("Codes:   {}", codes.join(", ")),
        None => println!("Codes:   (all columns)"),
    }
    println!("Ledger:  {}", bt_config.ledger_path.display());
    print_levels(&bt_config.params);

    println!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    log::info!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let params = match validate_data_config(&adapter)
        .and_then(|()| validate_strategy_config(&adapter))
        .and_then(|()| strategy_params(&adapter))
    {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    print_levels(&params);
    println!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

/// Prints the sizing rules and the trigger ladder for a reference of 100.
pub fn print_levels(params: &StrategyParams) {
    println!("Lot size:       {:.2}", params.lot_size_cash);
    println!("Profit target:  {}%", params.profit_target_pct());
    println!("Trigger levels (reference 100):");
    let ladder = triggers(100.0, &params.offsets);
    for i in 0..LEVELS {
        println!(
            "  {}: -{}% -> {:.2}  [{}]",
            i + 1,
            format_pct(params.offsets[i]),
            ladder[i],
            level_label(&params.offsets, i)
        );
    }
}

pub fn run_info(price_port: &dyn PricePort) -> ExitCode {
    let table = match price_port.load_prices() {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    println!("Source:  {}", price_port.source());
    println!("Symbols: {}", table.symbols().len());
    println!("Rows:    {}", table.row_count());
    println!(
        "Range:   {} to {}",
        display_date(table.first_date()),
        display_date(table.last_date())
    );
    println!();
    for symbol in table.symbols() {
        let last = table
            .last_price(symbol)
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<12} {:>6} days  last {}",
            symbol,
            table.present_count(symbol),
            last
        );
    }
    ExitCode::SUCCESS
}

fn display_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}
