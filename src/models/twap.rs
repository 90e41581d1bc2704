//! TWAP lifecycle events observed on the leader's user stream.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a TWAP order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TwapSide {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "A")]
    Sell,
}

impl TwapSide {
    /// Venue wire code: `B` for bids, `A` for asks.
    pub fn as_wire(&self) -> &'static str {
        match self {
            TwapSide::Buy => "B",
            TwapSide::Sell => "A",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TwapSide::Buy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TwapSide::Buy => "BUY",
            TwapSide::Sell => "SELL",
        }
    }
}

/// Lifecycle state reported for a leader TWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwapStatus {
    Activated,
    Canceled,
    Terminated,
    Unknown,
}

impl TwapStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "activated" => Self::Activated,
            "canceled" | "cancelled" => Self::Canceled,
            "terminated" => Self::Terminated,
            _ => Self::Unknown,
        }
    }

    /// Canceled and terminated both end the leader order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Terminated)
    }
}

impl fmt::Display for TwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Activated => "activated",
            Self::Canceled => "canceled",
            Self::Terminated => "terminated",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single leader TWAP notification, decoded from a stream frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TwapEvent {
    /// Market identifier (`@107`, `PURR/USDC`, `BTC`, ...)
    pub coin: String,

    pub side: TwapSide,

    /// Leader's total TWAP size; only used for identity, never for sizing
    pub size_hint: Decimal,

    pub minutes: u32,
    pub randomize: bool,
    pub reduce_only: bool,

    /// Leader order creation time (ms since epoch)
    pub timestamp: u64,

    pub status: TwapStatus,

    /// Venue TWAP id, when the notification carries one
    pub twap_id: Option<u64>,
}

impl TwapEvent {
    pub fn key(&self) -> MirrorKey {
        MirrorKey::from_event(self)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp as i64).single()
    }
}

/// Stable identity of a leader TWAP across its lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorKey(String);

impl MirrorKey {
    pub fn from_event(event: &TwapEvent) -> Self {
        Self(format!(
            "{}_{}_{}_{}_{}",
            event.coin,
            event.side.as_wire(),
            event.size_hint,
            event.minutes,
            event.timestamp
        ))
    }
}

impl fmt::Display for MirrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(status: TwapStatus) -> TwapEvent {
        TwapEvent {
            coin: "@5".to_string(),
            side: TwapSide::Buy,
            size_hint: dec!(10.0),
            minutes: 5,
            randomize: false,
            reduce_only: false,
            timestamp: 1_700_000_000_000,
            status,
            twap_id: None,
        }
    }

    #[test]
    fn test_key_is_stable_across_lifecycle() {
        let activated = event(TwapStatus::Activated);
        let terminated = event(TwapStatus::Terminated);

        assert_eq!(activated.key(), terminated.key());
        assert_eq!(activated.key().to_string(), "@5_B_10.0_5_1700000000000");
    }

    #[test]
    fn test_key_distinguishes_side_and_timestamp() {
        let base = event(TwapStatus::Activated);

        let mut sell = base.clone();
        sell.side = TwapSide::Sell;
        assert_ne!(base.key(), sell.key());

        let mut later = base.clone();
        later.timestamp += 1;
        assert_ne!(base.key(), later.key());
    }

    #[test]
    fn test_status_from_wire() {
        assert_eq!(TwapStatus::from_wire("activated"), TwapStatus::Activated);
        assert_eq!(TwapStatus::from_wire("canceled"), TwapStatus::Canceled);
        assert_eq!(TwapStatus::from_wire("terminated"), TwapStatus::Terminated);
        assert_eq!(TwapStatus::from_wire("finished"), TwapStatus::Unknown);
        assert!(TwapStatus::Terminated.is_terminal());
        assert!(!TwapStatus::Activated.is_terminal());
    }
}
