//! Websocket frame decoding.

use tracing::{debug, warn};

use crate::api::{TwapHistoryEntry, UserEventsData, WsEnvelope};
use crate::error::{MirrorError, MirrorResult};
use crate::models::{TwapEvent, TwapStatus};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    SubscriptionAck,
    /// TWAP lifecycle entries from the `user` channel, in frame order.
    /// `malformed` counts entries that failed to decode and were dropped.
    TwapEvents { events: Vec<TwapEvent>, malformed: u64 },
    Pong,
    Error(String),
    /// Any other channel, by name
    Other(String),
}

/// Parse a raw text frame.
///
/// Fails only on malformed JSON or a `user` payload that is not an object.
/// A bad `twapHistory` entry is dropped without affecting its siblings.
pub fn decode_frame(raw: &str) -> MirrorResult<Frame> {
    let envelope: WsEnvelope = serde_json::from_str(raw)?;

    let frame = match envelope.channel.as_str() {
        "subscriptionResponse" => Frame::SubscriptionAck,
        "pong" => Frame::Pong,
        "error" => Frame::Error(
            envelope
                .data
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| envelope.data.to_string()),
        ),
        "user" => {
            let data: UserEventsData = serde_json::from_value(envelope.data)?;
            let mut events = Vec::with_capacity(data.twap_history.len());
            let mut malformed = 0;

            for (position, raw) in data.twap_history.into_iter().enumerate() {
                match decode_entry(raw) {
                    Ok(event) => events.push(event),
                    Err(e) => {
                        malformed += 1;
                        warn!(position, error = %e, "Dropping malformed twapHistory entry");
                    }
                }
            }

            Frame::TwapEvents { events, malformed }
        }
        other => {
            debug!(channel = other, "Unhandled channel");
            Frame::Other(other.to_string())
        }
    };

    Ok(frame)
}

fn decode_entry(raw: serde_json::Value) -> MirrorResult<TwapEvent> {
    let entry: TwapHistoryEntry =
        serde_json::from_value(raw).map_err(|e| MirrorError::Decode(e.to_string()))?;
    let state = entry.state;

    Ok(TwapEvent {
        coin: state.coin,
        side: state.side,
        size_hint: state.sz,
        minutes: state.minutes,
        randomize: state.randomize,
        reduce_only: state.reduce_only,
        timestamp: state.timestamp,
        status: TwapStatus::from_wire(&entry.status.status),
        twap_id: entry.twap_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TwapSide;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_user_twap_history() {
        let raw = r#"{"channel":"user","data":{"twapHistory":[
            {"time":1700000000,"state":{"coin":"@107","side":"A","sz":"12.5","executedSz":"0.0",
             "executedNtl":"0.0","minutes":30,"randomize":true,"reduceOnly":false,
             "timestamp":1700000000123,"user":"0xleader"},
             "status":{"status":"activated"},"twapId":991},
            {"state":{"coin":"PURR/USDC","side":"B","sz":"100","minutes":5,"randomize":false,
             "reduceOnly":false,"timestamp":1700000000456},
             "status":{"status":"terminated"}}
        ]}}"#;

        let Frame::TwapEvents { events, malformed } = decode_frame(raw).unwrap() else {
            panic!("expected twap events");
        };

        assert_eq!(malformed, 0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].coin, "@107");
        assert_eq!(events[0].side, TwapSide::Sell);
        assert_eq!(events[0].size_hint, dec!(12.5));
        assert!(events[0].randomize);
        assert_eq!(events[0].status, TwapStatus::Activated);
        assert_eq!(events[0].twap_id, Some(991));
        assert_eq!(events[1].status, TwapStatus::Terminated);
        assert_eq!(events[1].twap_id, None);
    }

    #[test]
    fn test_decode_control_channels() {
        let ack = r#"{"channel":"subscriptionResponse","data":{"method":"subscribe","subscription":{"type":"userEvents","user":"0x1"}}}"#;
        assert_eq!(decode_frame(ack).unwrap(), Frame::SubscriptionAck);
        assert_eq!(decode_frame(r#"{"channel":"pong"}"#).unwrap(), Frame::Pong);
        assert_eq!(
            decode_frame(r#"{"channel":"error","data":"bad subscription"}"#).unwrap(),
            Frame::Error("bad subscription".to_string())
        );
        assert_eq!(
            decode_frame(r#"{"channel":"user","data":{"fills":[]}}"#).unwrap(),
            Frame::TwapEvents {
                events: vec![],
                malformed: 0
            }
        );
        assert_eq!(
            decode_frame(r#"{"channel":"trades","data":[]}"#).unwrap(),
            Frame::Other("trades".to_string())
        );
    }

    #[test]
    fn test_malformed_frames_fail() {
        assert!(matches!(decode_frame("not json"), Err(MirrorError::Decode(_))));
        assert!(matches!(decode_frame(r#"{"data":{}}"#), Err(MirrorError::Decode(_))));
        assert!(matches!(
            decode_frame(r#"{"channel":"user","data":"oops"}"#),
            Err(MirrorError::Decode(_))
        ));
    }

    #[test]
    fn test_bad_entry_keeps_its_siblings() {
        let raw = r#"{"channel":"user","data":{"twapHistory":[
            {"state":{}},
            {"state":{"coin":"@5","side":"B","sz":"10","minutes":5,"timestamp":1},
             "status":{"status":"activated"}},
            {"state":{"coin":"@6","side":"B","sz":"10","timestamp":2},
             "status":{"status":"activated"}}
        ]}}"#;

        let Frame::TwapEvents { events, malformed } = decode_frame(raw).unwrap() else {
            panic!("expected twap events");
        };

        assert_eq!(malformed, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].coin, "@5");
    }
}
