//! Mirroring configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for follower sizing and the processing loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Notional value of every follower TWAP in USDC
    pub fixed_notional: Decimal,

    /// Size decimals used when a pair's token metadata is missing
    pub default_size_decimals: u32,

    /// Max wait on the queue/stream before re-checking the shutdown flag (milliseconds)
    pub poll_timeout_ms: u64,

    /// Interval between application-level websocket pings (seconds)
    pub heartbeat_interval_secs: u64,
}

impl MirrorConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            fixed_notional: dec!(20.0),   // $20 per mirrored TWAP
            default_size_decimals: 6,
            poll_timeout_ms: 1_000,
            heartbeat_interval_secs: 30,  // venue drops idle sockets after 60s
        }
    }
}
