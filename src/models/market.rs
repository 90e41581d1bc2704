//! Market identification and resolved spot asset data.

use rust_decimal::Decimal;
use serde::Serialize;

/// Offset added to a spot pair index to form the exchange's asset id.
pub const SPOT_ASSET_OFFSET: u32 = 10_000;

const INDEX_PREFIX: char = '@';

/// How a coin identifier on the stream refers to a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketRef {
    /// `@<index>` reference into the spot universe
    SpotIndex(u32),
    /// Slash-separated spot pair name such as `PURR/USDC`
    SpotPair(String),
    /// Perpetuals and anything unparseable
    NotSpot,
}

impl MarketRef {
    pub fn classify(coin: &str) -> Self {
        if coin.is_empty() || coin == "N/A" {
            return Self::NotSpot;
        }

        if let Some(rest) = coin.strip_prefix(INDEX_PREFIX) {
            return match rest.parse::<u32>() {
                Ok(index) => Self::SpotIndex(index),
                Err(_) => Self::NotSpot,
            };
        }

        if coin.contains('/') {
            Self::SpotPair(coin.to_string())
        } else {
            Self::NotSpot
        }
    }

    pub fn is_spot(&self) -> bool {
        !matches!(self, Self::NotSpot)
    }
}

/// Market data needed to size a follower order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetInfo {
    /// Index into the spot universe (without the exchange offset)
    pub asset_index: u32,

    /// Mid price, or mark price when no mid is quoted
    pub reference_price: Decimal,

    /// Decimal places allowed in the order quantity
    pub size_decimals: u32,
}

impl AssetInfo {
    /// Asset id as expected by exchange actions.
    pub fn wire_asset(&self) -> u32 {
        SPOT_ASSET_OFFSET + self.asset_index
    }
}
