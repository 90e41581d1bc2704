//! Hyperliquid spot TWAP mirror
//!
//! Watches a leader account's TWAP lifecycle on the websocket and mirrors
//! every spot TWAP on the follower account at a fixed USDC notional.

mod api;
mod bot;
mod error;
mod mirror;
mod models;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{
    ExchangeClient, InfoClient, MAINNET_API_URL, MAINNET_WS_URL, TESTNET_API_URL, TESTNET_WS_URL,
};
use crate::bot::{MirrorSession, SessionConfig};
use crate::mirror::{
    DryRunClient, MarketDataResolver, MirrorConfig, PositionSizer, TradingClient,
};
use crate::models::MarketRef;

/// Hyperliquid TWAP mirror CLI.
#[derive(Parser)]
#[command(name = "twap-mirror")]
#[command(about = "Mirror a Hyperliquid account's spot TWAP orders", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Use the testnet endpoints and signing source
    #[arg(long, env = "HYPERLIQUID_TESTNET")]
    testnet: bool,

    /// Override the REST API root
    #[arg(long, env = "HYPERLIQUID_BASE_URL")]
    base_url: Option<String>,

    /// Override the websocket endpoint
    #[arg(long, env = "HYPERLIQUID_WS_URL")]
    ws_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            if self.testnet { TESTNET_API_URL } else { MAINNET_API_URL }.to_string()
        })
    }

    fn ws_url(&self) -> String {
        self.ws_url.clone().unwrap_or_else(|| {
            if self.testnet { TESTNET_WS_URL } else { MAINNET_WS_URL }.to_string()
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start mirroring a leader's TWAPs
    Run {
        /// Leader wallet address
        #[arg(long, env = "LEADER_ADDRESS")]
        leader: String,

        /// Notional of every follower TWAP in USDC
        #[arg(short, long, default_value = "20")]
        notional: Decimal,

        /// Follower private key
        #[arg(long, env = "HYPERLIQUID_PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,

        /// Queue/stream poll timeout in milliseconds
        #[arg(long, default_value = "1000")]
        poll_ms: u64,

        /// Dry run (don't submit orders)
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve a coin and show the follower size it would get
    Resolve {
        /// Coin as it appears on the stream (`@107`, `PURR/USDC`)
        coin: String,

        /// Notional in USDC
        #[arg(short, long, default_value = "20")]
        notional: Decimal,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let base_url = cli.base_url();
    let ws_url = cli.ws_url();

    match cli.command {
        Commands::Run {
            leader,
            notional,
            private_key,
            poll_ms,
            dry_run,
        } => {
            let mirror = MirrorConfig {
                fixed_notional: notional,
                poll_timeout_ms: poll_ms,
                ..MirrorConfig::default()
            };

            // Fall back to dry-run when no usable key is configured
            let mut follower_address = None;
            let client: Arc<dyn TradingClient> = match (dry_run, private_key.as_deref()) {
                (false, Some(key)) => match ExchangeClient::new(key, &base_url, !cli.testnet) {
                    Ok(client) => {
                        info!(address = %client.address(), "Exchange client initialized");
                        follower_address = Some(client.address().to_string());
                        Arc::new(client)
                    }
                    Err(e) => {
                        warn!("Exchange client not configured: {:#}. Running in dry-run mode.", e);
                        Arc::new(DryRunClient::new())
                    }
                },
                (false, None) => {
                    warn!("HYPERLIQUID_PRIVATE_KEY not set. Running in dry-run mode.");
                    Arc::new(DryRunClient::new())
                }
                (true, _) => Arc::new(DryRunClient::new()),
            };
            let live = follower_address.is_some();

            let session_config = SessionConfig {
                ws_url: ws_url.clone(),
                leader_address: leader.clone(),
                follower_address,
                dry_run: !live,
                mirror,
            };

            let source = Arc::new(InfoClient::new(&base_url)?);
            let session = MirrorSession::new(session_config, client, source);

            println!("\n=== Hyperliquid TWAP Mirror ===");
            println!("Leader:   {}", leader);
            println!("Notional: ${}", notional);
            println!("Network:  {}", if cli.testnet { "testnet" } else { "mainnet" });
            println!("Mode:     {}", if live { "LIVE TRADING" } else { "DRY RUN (no real orders)" });
            println!("\nPress Ctrl+C to stop.\n");

            let report = session.run().await?;
            println!("\n{}", report);

            if let Some(e) = report.stream_error {
                bail!("Session ended on stream failure: {}", e);
            }
        }

        Commands::Resolve { coin, notional } => {
            let market = MarketRef::classify(&coin);
            if !market.is_spot() {
                println!("{} is not a spot market; it would be ignored.", coin);
                return Ok(());
            }

            let config = MirrorConfig {
                fixed_notional: notional,
                ..MirrorConfig::default()
            };
            let resolver = MarketDataResolver::new(
                Arc::new(InfoClient::new(&base_url)?),
                config.default_size_decimals,
            );
            let info = resolver.resolve(&coin, &market).await?;
            let size = PositionSizer::new(&config).follower_size(&coin, &info)?;

            println!("\n=== {} ===", coin);
            println!("Spot Index:      {}", info.asset_index);
            println!("Wire Asset:      {}", info.wire_asset());
            println!("Reference Price: {}", info.reference_price);
            println!("Size Decimals:   {}", info.size_decimals);
            println!("Follower Size:   {} (${} notional)", size, notional);
        }

        Commands::Config => {
            let config = MirrorConfig::default();

            println!("\n=== Mirror Configuration ===\n");
            println!("Endpoints:");
            println!("  Network:              {}", if cli.testnet { "testnet" } else { "mainnet" });
            println!("  REST:                 {}", base_url);
            println!("  WebSocket:            {}", ws_url);

            println!("\nSizing:");
            println!("  Fixed Notional:       ${}", config.fixed_notional);
            println!("  Default Size Decimals: {}", config.default_size_decimals);

            println!("\nLoops:");
            println!("  Poll Timeout:         {}ms", config.poll_timeout_ms);
            println!("  Heartbeat Interval:   {}s", config.heartbeat_interval_secs);
        }
    }

    Ok(())
}
