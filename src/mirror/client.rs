//! Order-submission seam between the engine and the exchange.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

/// A follower TWAP ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TwapOrderRequest {
    /// Exchange asset id (spot index plus offset)
    pub asset: u32,
    pub is_buy: bool,
    pub size: Decimal,
    pub reduce_only: bool,
    pub minutes: u32,
    pub randomize: bool,
}

/// Places and cancels TWAP orders for the follower account.
#[async_trait]
pub trait TradingClient: Send + Sync {
    /// Returns the follower TWAP id assigned by the venue.
    async fn place_twap(&self, order: &TwapOrderRequest) -> Result<u64>;

    async fn cancel_twap(&self, asset: u32, twap_id: u64) -> Result<()>;
}

/// Logs orders instead of sending them. Hands out sequential fake ids.
pub struct DryRunClient {
    next_id: AtomicU64,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for DryRunClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradingClient for DryRunClient {
    async fn place_twap(&self, order: &TwapOrderRequest) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(
            asset = order.asset,
            side = if order.is_buy { "BUY" } else { "SELL" },
            size = %order.size,
            minutes = order.minutes,
            twap_id = id,
            "[DRY RUN] Would place TWAP"
        );
        Ok(id)
    }

    async fn cancel_twap(&self, asset: u32, twap_id: u64) -> Result<()> {
        info!(asset, twap_id, "[DRY RUN] Would cancel TWAP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_dry_run_ids_are_sequential() {
        let client = DryRunClient::new();
        let order = TwapOrderRequest {
            asset: 10005,
            is_buy: true,
            size: dec!(5),
            reduce_only: false,
            minutes: 5,
            randomize: false,
        };

        assert_eq!(client.place_twap(&order).await.unwrap(), 1);
        assert_eq!(client.place_twap(&order).await.unwrap(), 2);
        assert!(client.cancel_twap(10005, 1).await.is_ok());
    }
}
