use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;

use auction_harness::client::OrderbookClient;
use auction_harness::config::HarnessConfig;
use auction_harness::market_maker::MarketMaker;
use auction_harness::mock::{self, MockState};
use auction_harness::telemetry;
use auction_harness::verifier::{begin_auction_test, HarnessReport};

#[derive(Debug, Parser)]
#[command(name = "auction-harness", about = "Seeds an order book and verifies auction settlement against it")]
struct Cli {
    /// Market to seed and sweep (overrides SYMBOL)
    #[arg(long)]
    symbol: Option<String>,

    /// Price the ladder is built around
    #[arg(long, default_value = "2000")]
    base_price: Decimal,

    /// Levels per side in the seeded ladder
    #[arg(long, default_value_t = MarketMaker::DEFAULT_DEPTH)]
    ladder_depth: u32,

    /// Depth levels requested per side (overrides DEPTH_LIMIT)
    #[arg(long)]
    limit: Option<u32>,

    /// Verify whatever already rests on the book
    #[arg(long)]
    skip_seed: bool,

    /// Run against an in-process mock order book instead of ORDERBOOK_HOST
    #[arg(long)]
    mock: bool,
}

fn print_summary(report: &HarnessReport) {
    println!("\n=== Auction Settlement ===");
    for scenario in &report.scenarios {
        let verdict = if scenario.passed() { "PASS" } else { "FAIL" };
        let fund = scenario.fund_amount.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let expected = scenario.expected_out.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let actual = scenario.amount_out.as_deref().unwrap_or("-");
        println!(
            "{:<14} {}  amountIn={} expected={} amountOut={}",
            scenario.scenario.to_string(),
            verdict,
            fund,
            expected,
            actual
        );
        if let Some(failure) = &scenario.failure {
            println!("               {}", failure);
        }
    }
    println!("==========================\n");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    telemetry::init_tracing("auction_harness=info");

    let cli = Cli::parse();
    let mut cfg = HarnessConfig::load().context("loading configuration")?;
    if let Some(symbol) = cli.symbol {
        cfg.symbol = symbol;
    }
    if let Some(limit) = cli.limit {
        cfg.depth_limit = limit;
    }
    cfg.validate()?;
    if !cli.skip_seed {
        cfg.check_ladder_depth(cli.ladder_depth)?;
    }
    telemetry::init_metrics(cfg.metrics_port)?;

    // Held for the whole run; dropping it stops the server.
    let mock_server = if cli.mock {
        let server = mock::spawn(MockState::new()).await.context("starting mock order book")?;
        cfg.orderbook_host = server.base_url();
        Some(server)
    } else {
        None
    };

    let client = OrderbookClient::new(&cfg.orderbook_host, cfg.credentials()?).with_depth_limit(cfg.depth_limit);
    info!(host = %client.base_url(), scheme = client.scheme(), symbol = %cfg.symbol, "Starting auction harness");

    if !cli.skip_seed {
        MarketMaker::new(&cfg.symbol)
            .with_depth(cli.ladder_depth)
            .seed(&client, cli.base_price)
            .await
            .context("seeding the order book")?;
    }

    let report = begin_auction_test(&client, &cfg.symbol).await;
    print_summary(&report);
    drop(mock_server);

    if !report.passed() {
        anyhow::bail!("auction settlement verification failed");
    }
    Ok(())
}
