use anyhow::Context;
use api_client::{ApiClient, ApiError, BinanceClient, OrderResponse};
use clap::{Args, CommandFactory, Parser, Subcommand};
use comfy_table::{Cell, Table};
use configuration::{Config, Credentials};
use core_types::{MAX_TWAP_PARTS, OrderRequest, OrderSide, TimeInForce, TwapPlan};
use executor::{Executor, ExecutorError, OrderExecutor, TwapExecutor, TwapReport, check_server_time};
use rust_decimal::Decimal;
use std::process::ExitCode;
use std::sync::Arc;

/// The main entry point for the futures trading bot.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // No arguments at all: show help and leave without placing anything.
    if std::env::args_os().len() <= 1 {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error printing help: {}", e);
            return ExitCode::FAILURE;
        }
        println!();
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let config = match configuration::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Held until the end of main so buffered log lines reach the file.
    let _log_guard = match configuration::logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Simplified Binance USDT-M Futures trading bot (Testnet).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Place a single MARKET order.
    Market(MarketArgs),
    /// Place a single LIMIT order.
    Limit(LimitArgs),
    /// Split a quantity into equal MARKET orders spread over a duration.
    Twap(TwapArgs),
}

#[derive(Args, Debug)]
struct InstrumentArgs {
    /// Trading pair symbol, e.g. BTCUSDT.
    #[arg(long, value_parser = parse_symbol)]
    symbol: String,

    /// BUY or SELL.
    #[arg(long, value_enum, ignore_case = true)]
    side: OrderSide,
}

#[derive(Args, Debug)]
struct MarketArgs {
    #[command(flatten)]
    instrument: InstrumentArgs,

    /// Quantity to buy/sell.
    #[arg(long, value_parser = parse_positive_decimal)]
    quantity: Decimal,
}

#[derive(Args, Debug)]
struct LimitArgs {
    #[command(flatten)]
    instrument: InstrumentArgs,

    /// Quantity to buy/sell.
    #[arg(long, value_parser = parse_positive_decimal)]
    quantity: Decimal,

    /// Limit price.
    #[arg(long, value_parser = parse_positive_decimal)]
    price: Decimal,

    /// Time in force.
    #[arg(long, value_enum, ignore_case = true, default_value_t = TimeInForce::Gtc)]
    time_in_force: TimeInForce,

    /// Optional stop price.
    #[arg(long, value_parser = parse_positive_decimal)]
    stop_price: Option<Decimal>,
}

#[derive(Args, Debug)]
struct TwapArgs {
    #[command(flatten)]
    instrument: InstrumentArgs,

    /// Total quantity to buy/sell across all child orders.
    #[arg(long, value_parser = parse_positive_decimal)]
    quantity: Decimal,

    /// Number of child orders, at most 10000 [config default: 5].
    #[arg(
        long,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i64).range(..=i64::from(MAX_TWAP_PARTS))
    )]
    parts: Option<i64>,

    /// Duration in seconds; child orders are spread evenly [config default: 60].
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<i64>,
}

fn parse_symbol(raw: &str) -> Result<String, String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err("Symbol is required, e.g. BTCUSDT".to_string());
    }
    Ok(symbol)
}

fn parse_positive_decimal(raw: &str) -> Result<Decimal, String> {
    let value: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| format!("Not a valid number: {}", raw))?;
    if value <= Decimal::ZERO {
        return Err("Value must be positive".to_string());
    }
    Ok(value)
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Builds the shared client, checks the exchange clock and dispatches the command.
async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let api_client: Arc<dyn ApiClient> = Arc::new(
        BinanceClient::new(&cli.credentials, &config.exchange)
            .context("Failed to create the exchange client")?,
    );
    tracing::info!(base_url = %config.exchange.base_url, "Using exchange endpoint");

    check_server_time(api_client.as_ref()).await;

    let order_executor = Arc::new(OrderExecutor::new(Arc::clone(&api_client)));

    match cli.command {
        Commands::Market(args) => {
            let order = OrderRequest::market(&args.instrument.symbol, args.instrument.side, args.quantity);
            handle_single_order(order_executor.as_ref(), &order, "Order executed").await
        }
        Commands::Limit(args) => {
            let mut order = OrderRequest::limit(
                &args.instrument.symbol,
                args.instrument.side,
                args.quantity,
                args.price,
                args.time_in_force,
            );
            if let Some(stop_price) = args.stop_price {
                order = order.with_stop_price(stop_price);
            }
            handle_single_order(order_executor.as_ref(), &order, "Order placed").await
        }
        Commands::Twap(args) => {
            let plan = TwapPlan::new(
                args.quantity,
                args.parts.unwrap_or(config.twap.parts),
                args.duration.unwrap_or(config.twap.duration_secs),
            )
            .context("Invalid TWAP plan")?;
            handle_twap(order_executor, &args.instrument, plan).await
        }
    }
}

/// Places one order. Any failure is returned so the process exits non-zero.
async fn handle_single_order(
    executor: &dyn Executor,
    order: &OrderRequest,
    heading: &str,
) -> anyhow::Result<()> {
    match executor.execute(order).await {
        Ok(body) => {
            println!("{}:\n{}", heading, serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(ExecutorError::Api(ApiError::Http { status, body })) => {
            let reason = body
                .exchange_error()
                .map(|e| format!("code {}: {}", e.code, e.msg))
                .unwrap_or_else(|| body.to_string());
            anyhow::bail!("{} order rejected with HTTP {} ({})", order.order_type, status, reason)
        }
        Err(e) => Err(e).with_context(|| format!("{} order failed", order.order_type)),
    }
}

/// Runs the whole TWAP plan. Slice failures are reported, not returned.
async fn handle_twap(
    executor: Arc<OrderExecutor>,
    instrument: &InstrumentArgs,
    plan: TwapPlan,
) -> anyhow::Result<()> {
    let mut twap = TwapExecutor::new(executor, &instrument.symbol, instrument.side, plan);
    let report = twap.run().await?;

    println!("{}", twap_table(&report));
    println!("TWAP results:\n{}", serde_json::to_string_pretty(&report.outcomes)?);
    if report.failed() > 0 {
        tracing::warn!(
            failed = report.failed(),
            parts = report.parts,
            "TWAP finished with failed slices; reconcile before retrying"
        );
    }
    Ok(())
}

fn twap_table(report: &TwapReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Slice", "Quantity", "Result", "Detail"]);
    for outcome in &report.outcomes {
        let (result, detail) = match &outcome.result {
            Ok(body) => (
                "OK".to_string(),
                OrderResponse::from_value(body)
                    .map(|response| response.summary())
                    .unwrap_or_else(|| body.to_string()),
            ),
            Err(failure) => (
                match failure.status_code {
                    Some(status) => format!("FAILED ({})", status),
                    None => "FAILED".to_string(),
                },
                failure.error.clone(),
            ),
        };
        table.add_row(vec![
            Cell::new(format!("{}/{}", outcome.slice, report.parts)),
            Cell::new(outcome.quantity),
            Cell::new(result),
            Cell::new(detail),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["futures-bot", "--api-key", "k", "--api-secret", "s"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn minimal_market_order() {
        let cli = parse(&["market", "--symbol", "btcusdt", "--side", "buy", "--quantity", "0.001"]).unwrap();
        match cli.command {
            Commands::Market(args) => {
                assert_eq!(args.instrument.symbol, "BTCUSDT");
                assert_eq!(args.instrument.side, OrderSide::Buy);
                assert_eq!(args.quantity, Decimal::from_str("0.001").unwrap());
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.credentials.key, "k");
    }

    #[test]
    fn market_order_requires_quantity() {
        assert!(parse(&["market", "--symbol", "BTCUSDT", "--side", "BUY"]).is_err());
    }

    #[test]
    fn limit_order_requires_price() {
        assert!(parse(&["limit", "--symbol", "BTCUSDT", "--side", "SELL", "--quantity", "1"]).is_err());
    }

    #[test]
    fn limit_order_defaults_to_gtc() {
        let cli = parse(&[
            "limit", "--symbol", "BTCUSDT", "--side", "SELL", "--quantity", "1", "--price", "65000",
        ])
        .unwrap();
        match cli.command {
            Commands::Limit(args) => {
                assert_eq!(args.time_in_force, TimeInForce::Gtc);
                assert!(args.stop_price.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn twap_with_explicit_parts_and_duration() {
        let cli = parse(&[
            "twap", "--symbol", "BTCUSDT", "--side", "sell", "--quantity", "0.01", "--parts", "3",
            "--duration", "30",
        ])
        .unwrap();
        match cli.command {
            Commands::Twap(args) => {
                assert_eq!(args.parts, Some(3));
                assert_eq!(args.duration, Some(30));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn twap_parts_above_the_limit_are_rejected() {
        let twap = |parts: &str| {
            parse(&[
                "twap", "--symbol", "BTCUSDT", "--side", "buy", "--quantity", "1", "--parts", parts,
            ])
        };
        assert!(twap("10000").is_ok());
        assert!(twap("10001").is_err());
        assert!(twap("1000000000000").is_err());
        // Zero and negative values are clamped by the plan, not rejected here.
        assert!(twap("0").is_ok());
        assert!(twap("-3").is_ok());
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_quantities() {
        assert!(parse(&["market", "--symbol", "BTCUSDT", "--side", "BUY", "--quantity", "0"]).is_err());
        assert!(parse(&["market", "--symbol", "BTCUSDT", "--side", "BUY", "--quantity", "-1"]).is_err());
        assert!(parse(&["market", "--symbol", "BTCUSDT", "--side", "BUY", "--quantity", "abc"]).is_err());
    }

    #[test]
    fn rejects_unknown_side() {
        assert!(parse(&["market", "--symbol", "BTCUSDT", "--side", "HOLD", "--quantity", "1"]).is_err());
    }
}
