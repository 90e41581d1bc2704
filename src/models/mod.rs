//! Data models for leader TWAP events and spot markets.

mod market;
mod twap;

pub use market::{AssetInfo, MarketRef};
pub use twap::{MirrorKey, TwapEvent, TwapSide, TwapStatus};
