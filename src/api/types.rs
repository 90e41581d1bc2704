//! Wire types for the Hyperliquid info, exchange and websocket APIs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TwapSide;

/// Spot pair entry in `spotMeta.universe`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPairMeta {
    /// Token indices: base first, quote second
    pub tokens: [usize; 2],
    pub name: String,
    pub index: u32,
}

/// Token entry in `spotMeta.tokens`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotToken {
    pub sz_decimals: u32,
    pub index: usize,
}

/// Response of `{"type":"spotMeta"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotMeta {
    pub universe: Vec<SpotPairMeta>,
    pub tokens: Vec<SpotToken>,
}

impl SpotMeta {
    pub fn pair_by_index(&self, index: u32) -> Option<&SpotPairMeta> {
        self.universe.iter().find(|p| p.index == index)
    }

    pub fn pair_by_name(&self, name: &str) -> Option<&SpotPairMeta> {
        self.universe.iter().find(|p| p.name == name)
    }

    pub fn token(&self, index: usize) -> Option<&SpotToken> {
        self.tokens.iter().find(|t| t.index == index)
    }
}

/// Per-pair context from `spotMetaAndAssetCtxs`, positionally aligned with the universe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotAssetContext {
    #[serde(default)]
    pub mark_px: Option<Decimal>,
    #[serde(default)]
    pub mid_px: Option<Decimal>,
}

/// Response of `{"type":"spotMetaAndAssetCtxs"}`: `[meta, [ctx, ...]]`.
pub type SpotMetaAndAssetCtxs = (SpotMeta, Vec<SpotAssetContext>);

/// Body of a POST to `/info`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InfoRequest {
    SpotMeta,
    SpotMetaAndAssetCtxs,
}

// ---------------------------------------------------------------------------
// Websocket
// ---------------------------------------------------------------------------

/// Outbound websocket control messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum WsRequest {
    Subscribe { subscription: Subscription },
    Ping,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Subscription {
    UserEvents { user: String },
}

impl WsRequest {
    pub fn user_events(user: &str) -> Self {
        Self::Subscribe {
            subscription: Subscription::UserEvents {
                user: user.to_string(),
            },
        }
    }
}

/// Inbound frame envelope. Only `channel` is required; `data` is channel-specific.
#[derive(Debug, Clone, Deserialize)]
pub struct WsEnvelope {
    pub channel: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` payload of the `user` channel. Keys other than `twapHistory` are ignored.
///
/// Entries stay raw so that each one is decoded on its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventsData {
    #[serde(default)]
    pub twap_history: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwapHistoryEntry {
    pub state: TwapState,
    pub status: TwapStatusWire,
    #[serde(default)]
    pub twap_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwapState {
    pub coin: String,
    pub side: TwapSide,
    pub sz: Decimal,
    pub minutes: u32,
    #[serde(default)]
    pub randomize: bool,
    #[serde(default)]
    pub reduce_only: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwapStatusWire {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Wire form of a TWAP placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TwapWire {
    /// Asset id (spot pairs carry the 10000 offset)
    pub a: u32,
    /// Is buy
    pub b: bool,
    /// Size, already trimmed of trailing zeros
    pub s: String,
    /// Reduce-only
    pub r: bool,
    /// Minutes
    pub m: u32,
    /// Randomize
    pub t: bool,
}

/// L1 actions this crate submits. Field order is part of the signed hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExchangeAction {
    TwapOrder { twap: TwapWire },
    TwapCancel { a: u32, t: u64 },
}

/// ECDSA signature as the exchange expects it.
#[derive(Debug, Clone, Serialize)]
pub struct WireSignature {
    pub r: String,
    pub s: String,
    pub v: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePayload {
    pub action: serde_json::Value,
    pub nonce: u64,
    pub signature: WireSignature,
    pub vault_address: Option<String>,
}

/// Top-level `/exchange` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", content = "response", rename_all = "camelCase")]
pub enum ExchangeResponse {
    Ok(ExchangeOk),
    Err(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeOk {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<ExchangeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeData {
    pub status: ActionStatus,
}

/// Per-action status inside a successful response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionStatus {
    Running { running: RunningTwap },
    Error { error: String },
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTwap {
    pub twap_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_subscription_message_shape() {
        let msg = serde_json::to_value(WsRequest::user_events("0xabc")).unwrap();
        assert_eq!(
            msg,
            serde_json::json!({
                "method": "subscribe",
                "subscription": {"type": "userEvents", "user": "0xabc"}
            })
        );

        let ping = serde_json::to_value(WsRequest::Ping).unwrap();
        assert_eq!(ping, serde_json::json!({"method": "ping"}));
    }

    #[test]
    fn test_spot_meta_and_ctxs_parse() {
        let raw = r#"[
            {"universe": [{"tokens": [1, 0], "name": "PURR/USDC", "index": 0, "isCanonical": true}],
             "tokens": [
                {"name": "USDC", "szDecimals": 8, "weiDecimals": 8, "index": 0},
                {"name": "PURR", "szDecimals": 0, "weiDecimals": 5, "index": 1}
             ]},
            [{"coin": "PURR/USDC", "markPx": "0.2", "midPx": null, "prevDayPx": "0.19", "dayNtlVlm": "100.0"}]
        ]"#;

        let (meta, ctxs): SpotMetaAndAssetCtxs = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.pair_by_name("PURR/USDC").map(|p| p.index), Some(0));
        assert_eq!(meta.token(1).map(|t| t.sz_decimals), Some(0));
        assert_eq!(ctxs[0].mark_px, Some(dec!(0.2)));
        assert_eq!(ctxs[0].mid_px, None);
    }

    #[test]
    fn test_twap_order_action_json() {
        let action = ExchangeAction::TwapOrder {
            twap: TwapWire {
                a: 10005,
                b: true,
                s: "5".to_string(),
                r: false,
                m: 5,
                t: false,
            },
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "twapOrder");
        assert_eq!(json["twap"]["a"], 10005);

        let cancel = serde_json::to_value(ExchangeAction::TwapCancel { a: 10005, t: 77 }).unwrap();
        assert_eq!(cancel, serde_json::json!({"type": "twapCancel", "a": 10005, "t": 77}));
    }

    #[test]
    fn test_exchange_response_variants() {
        let running: ExchangeResponse = serde_json::from_str(
            r#"{"status":"ok","response":{"type":"twapOrder","data":{"status":{"running":{"twapId":42}}}}}"#,
        )
        .unwrap();
        match running {
            ExchangeResponse::Ok(ok) => match ok.data.map(|d| d.status) {
                Some(ActionStatus::Running { running }) => assert_eq!(running.twap_id, 42),
                other => panic!("unexpected status: {:?}", other),
            },
            other => panic!("unexpected response: {:?}", other),
        }

        let cancelled: ExchangeResponse = serde_json::from_str(
            r#"{"status":"ok","response":{"type":"twapCancel","data":{"status":"success"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            cancelled,
            ExchangeResponse::Ok(ExchangeOk { data: Some(ExchangeData { status: ActionStatus::Text(_) }), .. })
        ));

        let err: ExchangeResponse =
            serde_json::from_str(r#"{"status":"err","response":"User or API Wallet does not exist."}"#)
                .unwrap();
        assert!(matches!(err, ExchangeResponse::Err(_)));
    }
}
