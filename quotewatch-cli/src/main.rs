//! quotewatch CLI: intraday dashboard in the terminal.
//!
//! Commands:
//! - `show`: one interaction, prints metrics and the latest rows
//! - `session`: reads commands from stdin and re-runs the pipeline after each one
//! - `config`: prints the effective configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use quotewatch_core::data::{AlphaVantageSource, DataSource, FileSource, SyntheticSource};
use quotewatch_core::domain::{ApiKey, Symbol};
use quotewatch_core::export::{export_json, write_csv};
use quotewatch_core::indicators::{AnnotatedSeries, IndicatorParams};
use quotewatch_core::{ChartType, Dashboard, DashboardConfig, DashboardView};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Placeholder credential for sources that never send one.
const OFFLINE_KEY: &str = "offline";
const SYNTHETIC_SEED: u64 = 42;
const SYNTHETIC_POINTS: usize = 390;

#[derive(Parser)]
#[command(
    name = "quotewatch",
    version,
    about = "quotewatch: intraday prices, SMA and RSI in the terminal"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one symbol and print the dashboard.
    Show {
        /// Ticker symbol (e.g., MSFT).
        symbol: String,

        #[command(flatten)]
        opts: DashboardArgs,

        /// Also write the annotated series to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the full view as JSON instead of the text dashboard.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive session over stdin: `symbol X`, `sma S L`, `rsi N`, `refresh`, `quit`.
    Session {
        /// Symbol to load on start.
        #[arg(long)]
        symbol: Option<String>,

        #[command(flatten)]
        opts: DashboardArgs,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DashboardArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Alpha Vantage API key.
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Short SMA window (5–50).
    #[arg(long)]
    sma_short: Option<usize>,

    /// Long SMA window (50–200).
    #[arg(long)]
    sma_long: Option<usize>,

    /// RSI window.
    #[arg(long)]
    rsi_window: Option<usize>,

    /// Chart type: candlestick or line.
    #[arg(long)]
    chart: Option<ChartType>,

    /// Number of table rows, newest first.
    #[arg(long)]
    rows: Option<usize>,

    /// Read the provider payload from a saved JSON file (or a directory of `SYMBOL.json`).
    #[arg(long, conflicts_with = "synthetic")]
    payload: Option<PathBuf>,

    /// Use deterministic synthetic data instead of the network.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Show {
            symbol,
            opts,
            csv,
            json,
        } => run_show(&symbol, &opts, csv, json),
        Commands::Session { symbol, opts } => run_session(symbol, &opts),
        Commands::Config { config } => run_config(config),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "quotewatch=debug,quotewatch_core=debug"
    } else {
        "quotewatch=info,quotewatch_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::from_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(DashboardConfig::default()),
    }
}

/// File config with command-line overrides applied, then validated.
fn effective_config(opts: &DashboardArgs) -> Result<DashboardConfig> {
    let mut config = load_config(opts.config.as_ref())?;
    if let Some(w) = opts.sma_short {
        config.indicators.sma_short_window = w;
    }
    if let Some(w) = opts.sma_long {
        config.indicators.sma_long_window = w;
    }
    if let Some(w) = opts.rsi_window {
        config.indicators.rsi_window = w;
    }
    if let Some(chart) = opts.chart {
        config.display.chart_type = chart;
    }
    if let Some(rows) = opts.rows {
        config.display.rows = rows;
    }
    config.validate()?;
    Ok(config)
}

fn build_source(
    opts: &DashboardArgs,
    config: &DashboardConfig,
) -> Result<(Box<dyn DataSource>, ApiKey)> {
    let given = opts.api_key.as_deref().filter(|k| !k.trim().is_empty());

    if let Some(path) = &opts.payload {
        let key = ApiKey::new(given.unwrap_or(OFFLINE_KEY))?;
        return Ok((Box::new(FileSource::new(path)), key));
    }
    if opts.synthetic {
        let key = ApiKey::new(given.unwrap_or(OFFLINE_KEY))?;
        let source = SyntheticSource::new(SYNTHETIC_SEED, config.source.interval, SYNTHETIC_POINTS);
        return Ok((Box::new(source), key));
    }

    let Some(raw) = given else {
        bail!("an API key is required: pass --api-key or set ALPHAVANTAGE_API_KEY");
    };
    let key = ApiKey::new(raw)?;
    let source = AlphaVantageSource::new(
        config.source.endpoint.clone(),
        config.source.interval,
        config.source.output_size,
        config.timeout(),
    )?;
    Ok((Box::new(source), key))
}

fn new_dashboard(
    source: Box<dyn DataSource>,
    config: &DashboardConfig,
) -> Dashboard<Box<dyn DataSource>> {
    Dashboard::new(
        source,
        config.source.interval,
        config.normalize.duplicate_policy,
        config.ttl(),
    )
}

fn run_show(symbol: &str, opts: &DashboardArgs, csv: Option<PathBuf>, json: bool) -> Result<()> {
    let config = effective_config(opts)?;
    let symbol = Symbol::new(symbol)?;
    let (source, key) = build_source(opts, &config)?;
    debug!(source = source.name(), symbol = %symbol, "show");

    let mut dashboard = new_dashboard(source, &config);
    let view = dashboard.load(&key, &symbol, &config.indicators)?;

    if let Some(path) = csv {
        write_csv(&path, &view.series)
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        eprintln!("CSV written to: {}", path.display());
    }

    if json {
        println!("{}", export_json(&view)?);
    } else {
        print_dashboard(&view, &config);
    }
    Ok(())
}

fn run_session(initial: Option<String>, opts: &DashboardArgs) -> Result<()> {
    let mut config = effective_config(opts)?;
    let (source, key) = build_source(opts, &config)?;
    let mut dashboard = new_dashboard(source, &config);

    let mut symbol = initial.as_deref().map(Symbol::new).transpose()?;
    if let Some(sym) = &symbol {
        refresh(&mut dashboard, &key, sym, &config);
    }

    println!("commands: symbol <TICKER> | sma <SHORT> <LONG> | rsi <N> | refresh | quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] | ["q"] => break,
            ["symbol", raw] => match Symbol::new(raw) {
                Ok(s) => symbol = Some(s),
                Err(e) => {
                    eprintln!("Error: {e}");
                    continue;
                }
            },
            ["sma", short, long] => {
                let (Ok(short), Ok(long)) = (short.parse::<usize>(), long.parse::<usize>()) else {
                    eprintln!("Error: sma expects two integers");
                    continue;
                };
                let candidate = IndicatorParams {
                    sma_short_window: short,
                    sma_long_window: long,
                    ..config.indicators
                };
                if let Err(e) = apply_params(&mut config, candidate) {
                    eprintln!("Error: {e}");
                    continue;
                }
            }
            ["rsi", window] => {
                let Ok(window) = window.parse::<usize>() else {
                    eprintln!("Error: rsi expects an integer");
                    continue;
                };
                let candidate = IndicatorParams {
                    rsi_window: window,
                    ..config.indicators
                };
                if let Err(e) = apply_params(&mut config, candidate) {
                    eprintln!("Error: {e}");
                    continue;
                }
            }
            ["refresh"] => {}
            _ => {
                eprintln!("Error: unknown command '{line}'");
                continue;
            }
        }

        match &symbol {
            Some(sym) => refresh(&mut dashboard, &key, sym, &config),
            None => eprintln!("Error: no symbol selected (try `symbol MSFT`)"),
        }
    }
    Ok(())
}

/// Accept new indicator windows only if the whole config stays valid.
fn apply_params(config: &mut DashboardConfig, params: IndicatorParams) -> Result<()> {
    let mut next = config.clone();
    next.indicators = params;
    next.validate()?;
    *config = next;
    Ok(())
}

fn refresh<S: DataSource>(
    dashboard: &mut Dashboard<S>,
    key: &ApiKey,
    symbol: &Symbol,
    config: &DashboardConfig,
) {
    match dashboard.load(key, symbol, &config.indicators) {
        Ok(view) => print_dashboard(&view, config),
        Err(e) => {
            warn!(kind = e.kind(), "interaction failed");
            eprintln!("Error: {e}");
        }
    }
}

fn run_config(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_ref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn print_dashboard(view: &DashboardView, config: &DashboardConfig) {
    let snap = &view.snapshot;
    let series = &view.series;
    let params = series.params();

    println!();
    println!(
        "{} {} bars  (as of {}{})",
        snap.symbol,
        series.series().interval(),
        snap.as_of.format("%Y-%m-%d %H:%M"),
        if view.from_cache { ", cached" } else { "" }
    );
    println!("{}", "-".repeat(60));
    println!(
        "  Last Price ({}):  ${:.2}   {:+.2} ({:+.2}%)",
        snap.symbol, snap.latest_close, snap.change, snap.change_pct
    );
    println!("  Day High:          ${:.2}", snap.day_high);
    println!("  Day Low:           ${:.2}", snap.day_low);

    let latest = series.latest();
    println!(
        "  SMA {}/{}:         {} / {}  ({})",
        params.sma_short_window,
        params.sma_long_window,
        fmt_opt(latest.and_then(|r| r.sma_short), 2),
        fmt_opt(latest.and_then(|r| r.sma_long), 2),
        series.sma_trend().label()
    );
    println!(
        "  RSI {}:            {}  ({})",
        params.rsi_window,
        fmt_opt(latest.and_then(|r| r.rsi), 2),
        series
            .rsi_zone()
            .map(|z| z.label())
            .unwrap_or("not enough data")
    );

    for a in &view.anomalies {
        println!("  ! {:?}: {} point(s) ({:?})", a.anomaly_type, a.count, a.severity);
    }

    println!();
    print_table(series, config);
}

fn print_table(series: &AnnotatedSeries, config: &DashboardConfig) {
    let rows = config.display.rows;
    match config.display.chart_type {
        ChartType::Candlestick => {
            println!(
                "{:<17} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>7}",
                "Time", "Open", "High", "Low", "Close", "Volume", "SMA S", "SMA L", "RSI"
            );
            println!("{}", "-".repeat(102));
            for row in series.rows().rev().take(rows) {
                let p = row.point;
                println!(
                    "{:<17} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10} {:>10} {:>10} {:>7}",
                    p.timestamp.format("%Y-%m-%d %H:%M"),
                    p.open,
                    p.high,
                    p.low,
                    p.close,
                    p.volume,
                    fmt_opt(row.sma_short, 2),
                    fmt_opt(row.sma_long, 2),
                    fmt_opt(row.rsi, 1),
                );
            }
        }
        ChartType::Line => {
            println!(
                "{:<17} {:>10} {:>10} {:>10} {:>7}",
                "Time", "Close", "SMA S", "SMA L", "RSI"
            );
            println!("{}", "-".repeat(58));
            for row in series.rows().rev().take(rows) {
                println!(
                    "{:<17} {:>10.2} {:>10} {:>10} {:>7}",
                    row.point.timestamp.format("%Y-%m-%d %H:%M"),
                    row.point.close,
                    fmt_opt(row.sma_short, 2),
                    fmt_opt(row.sma_long, 2),
                    fmt_opt(row.rsi, 1),
                );
            }
        }
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}
