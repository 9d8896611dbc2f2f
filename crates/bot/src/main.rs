//! BasicBot - Binance USDT-M futures order entry
//!
//! Places a MARKET or LIMIT order, or runs a TWAP of MARKET slices, against
//! the futures testnet by default.
//!
//! Exit codes: 0 on success, 1 when the exchange or the network failed the
//! request, 2 when the invocation was rejected before anything was sent.

use anyhow::Result;
use basicbot_core::{BotRuntime, Fixed, init_logging};
use basicbot_exchanges::binance::{DEFAULT_TIME_IN_FORCE, DEFAULT_TWAP_DURATION_SECS, DEFAULT_TWAP_SLICES};
use basicbot_exchanges::{
    Clock, ErrorKind, ExchangeError, ExecutionResult, FuturesConfig, FuturesRestClient, HttpTransport,
};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_INVALID: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
enum Side {
    Buy,
    Sell,
}

impl Side {
    fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
enum Mode {
    Market,
    Limit,
    Twap,
}

/// Simplified Binance Futures trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// API key (falls back to BINANCE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// API secret (falls back to BINANCE_API_SECRET)
    #[arg(long)]
    api_secret: Option<String>,

    /// Trading symbol, e.g. BTCUSDT
    #[arg(long)]
    symbol: String,

    #[arg(long, value_enum, ignore_case = true)]
    side: Side,

    /// MARKET, LIMIT or TWAP
    #[arg(long = "type", value_enum, ignore_case = true)]
    order_type: Mode,

    /// Quantity to trade (contracts)
    #[arg(long)]
    quantity: Fixed,

    /// Price for LIMIT orders
    #[arg(long)]
    price: Option<Fixed>,

    #[arg(long, default_value = DEFAULT_TIME_IN_FORCE)]
    time_in_force: String,

    /// Build and sign requests without sending them
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value_t = DEFAULT_TWAP_SLICES)]
    twap_slices: u32,

    /// TWAP total duration in seconds
    #[arg(long, default_value_t = DEFAULT_TWAP_DURATION_SECS, allow_negative_numbers = true)]
    twap_duration: i64,

    /// Override the REST base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Use the production endpoint instead of the testnet
    #[arg(long)]
    mainnet: bool,
}

fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let args = Args::parse();

    let code = match BotRuntime::new().block_on(run(args, |name| std::env::var(name).ok())) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            error!("Unhandled exception: {:#}", e);
            println!("Unhandled error: {e:#}");
            EXIT_FAILED
        }
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            EXIT_FAILED
        }
    };
    std::process::exit(code);
}

async fn run(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<i32> {
    let config = match build_config(&args, env) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            println!("Error: {e}");
            return Ok(EXIT_INVALID);
        }
    };

    let client = FuturesRestClient::new(config)?;
    Ok(dispatch(&args, &client).await)
}

async fn dispatch<T: HttpTransport, C: Clock>(args: &Args, client: &FuturesRestClient<T, C>) -> i32 {
    let symbol = args.symbol.to_ascii_uppercase();
    let side = args.side.as_str();

    match args.order_type {
        Mode::Market => {
            info!("Placing MARKET order {} {} {}", symbol, side, args.quantity);
            let result = client.place_market_order(&symbol, side, args.quantity).await;
            report(result)
        }
        Mode::Limit => {
            let Some(price) = args.price else {
                error!("LIMIT order requires --price");
                println!("Invalid order: LIMIT orders require --price");
                return EXIT_INVALID;
            };
            info!("Placing LIMIT order {} {} {} @ {}", symbol, side, args.quantity, price);
            let result = client
                .place_limit_order(&symbol, side, args.quantity, price, &args.time_in_force)
                .await;
            report(result)
        }
        Mode::Twap => {
            info!(
                "Placing TWAP order {} {} total={} slices={} duration={}s",
                symbol, side, args.quantity, args.twap_slices, args.twap_duration
            );
            match client
                .run_twap(&symbol, side, args.quantity, args.twap_slices, args.twap_duration)
                .await
            {
                Ok(run) => {
                    println!("TWAP results:");
                    for slice in run.iter() {
                        println!(" Slice {}: {}", slice.index, slice);
                    }
                    EXIT_OK
                }
                Err(e) => present_error(&e),
            }
        }
    }
}

/// Flags win over `env`, which is the process environment outside tests.
fn build_config(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> std::result::Result<FuturesConfig, ExchangeError> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| env("BINANCE_API_KEY"))
        .ok_or_else(|| ExchangeError::MissingCredentials("--api-key or BINANCE_API_KEY".to_string()))?;
    let api_secret = args
        .api_secret
        .clone()
        .or_else(|| env("BINANCE_API_SECRET"))
        .ok_or_else(|| ExchangeError::MissingCredentials("--api-secret or BINANCE_API_SECRET".to_string()))?;

    let mut config = if args.mainnet {
        FuturesConfig::mainnet()
    } else {
        FuturesConfig::testnet()
    };
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.as_str());
    }

    Ok(config
        .with_credentials(api_key, api_secret)
        .with_dry_run(args.dry_run))
}

fn report(result: basicbot_exchanges::Result<ExecutionResult>) -> i32 {
    match result {
        Ok(result) => {
            if let Some(ack) = result.order_ack() {
                info!("✅ Order {} {} status={}", ack.order_id, ack.symbol, ack.status);
            }
            println!("Result: {result}");
            EXIT_OK
        }
        Err(e) => present_error(&e),
    }
}

// Rejected locally, refused by the exchange, or never delivered
fn present_error(e: &ExchangeError) -> i32 {
    match e.kind() {
        ErrorKind::Validation => {
            error!("Invalid order: {}", e);
            println!("Invalid order: {e}");
            EXIT_INVALID
        }
        ErrorKind::Api => {
            error!("Binance API returned an error: {}", e);
            println!("Error: {e}");
            EXIT_FAILED
        }
        ErrorKind::Transport => {
            error!("Network error: {}", e);
            println!("Network error: {e}");
            EXIT_FAILED
        }
        ErrorKind::Internal => {
            error!("Unhandled exception: {}", e);
            println!("Unhandled error: {e}");
            EXIT_FAILED
        }
    }
}
