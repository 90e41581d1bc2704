//! Hyperliquid API clients for metadata lookups and TWAP execution.

mod exchange_client;
mod info_client;
mod types;

pub use exchange_client::ExchangeClient;
pub use info_client::InfoClient;
pub use types::*;

pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";
pub const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";
pub const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";
