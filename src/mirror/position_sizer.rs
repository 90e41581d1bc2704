//! Fixed-notional follower sizing.

use rust_decimal::Decimal;

use crate::error::{MirrorError, MirrorResult};
use crate::models::AssetInfo;

use super::MirrorConfig;

/// Converts a fixed USDC notional into a follower order quantity.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    fixed_notional: Decimal,
}

impl PositionSizer {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            fixed_notional: config.fixed_notional,
        }
    }

    /// `round(notional / price, size_decimals)`, half-to-even.
    ///
    /// Fails when the price is not positive or the result rounds to zero.
    pub fn follower_size(&self, coin: &str, info: &AssetInfo) -> MirrorResult<Decimal> {
        if info.reference_price <= Decimal::ZERO {
            return Err(MirrorError::sizing(
                coin,
                format!("non-positive reference price {}", info.reference_price),
            ));
        }

        let raw = self
            .fixed_notional
            .checked_div(info.reference_price)
            .ok_or_else(|| MirrorError::sizing(coin, "notional/price overflow"))?;

        let size = raw.round_dp(info.size_decimals);
        if size <= Decimal::ZERO {
            return Err(MirrorError::sizing(
                coin,
                format!(
                    "{} / {} rounds to {} at {} decimals",
                    self.fixed_notional, info.reference_price, size, info.size_decimals
                ),
            ));
        }

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn info(price: Decimal, decimals: u32) -> AssetInfo {
        AssetInfo {
            asset_index: 5,
            reference_price: price,
            size_decimals: decimals,
        }
    }

    #[test]
    fn test_fixed_notional_size() {
        let sizer = PositionSizer::new(&MirrorConfig::default());

        let size = sizer.follower_size("@5", &info(dec!(4.0), 2)).unwrap();
        assert_eq!(size, dec!(5.00));

        let size = sizer.follower_size("@5", &info(dec!(3), 3)).unwrap();
        assert_eq!(size, dec!(6.667));
    }

    #[test]
    fn test_zero_price_is_sizing_error() {
        let sizer = PositionSizer::new(&MirrorConfig::default());

        let err = sizer.follower_size("@5", &info(Decimal::ZERO, 2)).unwrap_err();
        assert!(matches!(err, MirrorError::Sizing { .. }));

        let err = sizer.follower_size("@5", &info(dec!(-1), 2)).unwrap_err();
        assert!(matches!(err, MirrorError::Sizing { .. }));
    }

    #[test]
    fn test_rounding_to_zero_is_sizing_error() {
        let sizer = PositionSizer::new(&MirrorConfig::default());

        // 20 / 100 = 0.2 rounds to 0 with no decimals
        let err = sizer.follower_size("@1", &info(dec!(100), 0)).unwrap_err();
        assert!(matches!(err, MirrorError::Sizing { .. }));
    }
}
