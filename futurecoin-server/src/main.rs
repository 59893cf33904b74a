use std::error::Error;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use futurecoin::{Currency, IntervalClass, Symbol};
use futurecoin_server::{AppConfig, AppState, app, build_futurecoin};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction API (default)
    Serve {
        /// Listen port, overriding PORT
        #[arg(long)]
        port: Option<u16>,

        /// Listen address, overriding BIND
        #[arg(long)]
        bind: Option<String>,
    },

    /// Download history for several symbols and merge it into DATA_DIR
    Fetch {
        /// Comma-separated list of symbols (defaults to SUPPORTED_SYMBOLS)
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Interval class: daily or hourly
        #[arg(long, default_value = "daily")]
        interval: String,

        /// Candles per symbol (defaults to the configured limit)
        #[arg(long)]
        lookback: Option<u32>,

        /// Output currency (defaults to the model currency of the interval)
        #[arg(long)]
        currency: Option<String>,

        /// Fetch and merge without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        bind: None,
    }) {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                cfg.port = port;
            }
            if let Some(bind) = bind {
                cfg.bind = bind;
            }
            serve(cfg).await
        }
        Commands::Fetch {
            symbols,
            interval,
            lookback,
            currency,
            dry_run,
        } => {
            let interval = IntervalClass::from_str(&interval)?;
            let currency = match currency {
                Some(c) => Currency::from_str(&c)?,
                None => cfg.currencies.for_interval(interval),
            };
            let symbols = if symbols.is_empty() {
                cfg.supported_symbols.clone()
            } else {
                symbols
                    .iter()
                    .map(|s| Symbol::new(s))
                    .collect::<Result<Vec<_>, _>>()?
            };
            fetch(&cfg, &symbols, interval, lookback, currency, dry_run).await
        }
    }
}

async fn serve(cfg: AppConfig) -> Result<(), Box<dyn Error>> {
    let fc = build_futurecoin(&cfg)?;
    let addr = cfg.listen_addr();
    let state = AppState::new(fc, cfg);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("FutureCoin API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn fetch(
    cfg: &AppConfig,
    symbols: &[Symbol],
    interval: IntervalClass,
    lookback: Option<u32>,
    currency: Currency,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    let fc = build_futurecoin(cfg)?;
    let mut job = fc
        .download()
        .symbols(symbols)?
        .interval(interval)
        .target_currency(currency);
    if let Some(n) = lookback {
        job = job.lookback(n);
    }
    if dry_run {
        job = job.dry_run();
    }
    let report = job.run().await?;

    for w in &report.warnings {
        tracing::warn!(error = %w, "fetch warning");
    }
    for path in &report.files {
        tracing::info!(path = %path.display(), "wrote");
    }
    tracing::info!(
        datasets = report.datasets.len(),
        merged_rows = report.merged.as_ref().map_or(0, |m| m.rows().len()),
        dropped_without_rate = report.dropped_without_rate,
        warnings = report.warnings.len(),
        "fetch finished"
    );
    if report.datasets.is_empty() {
        return Err("no symbol could be fetched".into());
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
