//! Mirror engine: turns one leader TWAP event into at most one follower action.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{MirrorError, MirrorResult};
use crate::models::{MarketRef, MirrorKey, TwapEvent, TwapStatus};

use super::{
    MappingStore, MarketDataResolver, MirrorMapping, PositionSizer, TradingClient,
    TwapOrderRequest,
};

/// Why an event produced no follower action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Activation for a key that already has a follower order
    AlreadyMirrored,
    /// Event carries the id of one of our own follower orders
    SelfOriginated,
    /// Terminal event for a leader order we never mirrored
    NotMirrored,
    UnknownStatus,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyMirrored => "already mirrored",
            Self::SelfOriginated => "self-originated",
            Self::NotMirrored => "not mirrored",
            Self::UnknownStatus => "unknown status",
        };
        f.write_str(s)
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorOutcome {
    Placed {
        key: MirrorKey,
        follower_order_id: u64,
        size: Decimal,
    },
    Cancelled {
        key: MirrorKey,
        follower_order_id: u64,
    },
    Skipped(SkipReason),
    /// Not a spot market
    Ignored,
}

pub struct TwapMirrorEngine {
    client: Arc<dyn TradingClient>,
    resolver: MarketDataResolver,
    sizer: PositionSizer,
}

impl TwapMirrorEngine {
    /// Create a new mirror engine.
    pub fn new(
        client: Arc<dyn TradingClient>,
        resolver: MarketDataResolver,
        sizer: PositionSizer,
    ) -> Self {
        Self {
            client,
            resolver,
            sizer,
        }
    }

    /// Handle a single event to completion.
    ///
    /// The store is only mutated after a successful placement or when a
    /// mirrored leader order ends.
    pub async fn handle(
        &self,
        store: &mut MappingStore,
        event: &TwapEvent,
    ) -> MirrorResult<MirrorOutcome> {
        let market = MarketRef::classify(&event.coin);
        if !market.is_spot() {
            debug!(coin = %event.coin, status = %event.status, "Ignoring non-spot TWAP");
            return Ok(MirrorOutcome::Ignored);
        }

        match event.status {
            TwapStatus::Activated => self.on_activated(store, event, &market).await,
            status if status.is_terminal() => self.on_terminal(store, event).await,
            _ => {
                debug!(coin = %event.coin, "Skipping TWAP with unrecognised status");
                Ok(MirrorOutcome::Skipped(SkipReason::UnknownStatus))
            }
        }
    }

    async fn on_activated(
        &self,
        store: &mut MappingStore,
        event: &TwapEvent,
        market: &MarketRef,
    ) -> MirrorResult<MirrorOutcome> {
        let key = event.key();

        if store.contains(&key) {
            debug!(key = %key, "TWAP already mirrored");
            return Ok(MirrorOutcome::Skipped(SkipReason::AlreadyMirrored));
        }

        if let Some(id) = event.twap_id.filter(|id| store.is_follower_order(*id)) {
            debug!(key = %key, twap_id = id, "Skipping our own follower TWAP");
            return Ok(MirrorOutcome::Skipped(SkipReason::SelfOriginated));
        }

        let info = self.resolver.resolve(&event.coin, market).await?;
        let size = self.sizer.follower_size(&event.coin, &info)?;

        let order = TwapOrderRequest {
            asset: info.wire_asset(),
            is_buy: event.side.is_buy(),
            size,
            reduce_only: event.reduce_only,
            minutes: event.minutes,
            randomize: event.randomize,
        };

        let follower_order_id =
            self.client
                .place_twap(&order)
                .await
                .map_err(|e| MirrorError::Submission {
                    action: "twapOrder",
                    reason: format!("{:#}", e),
                })?;

        store.put(MirrorMapping {
            key: key.clone(),
            follower_order_id,
            coin: event.coin.clone(),
            asset: order.asset,
        });

        info!(
            key = %key,
            coin = %event.coin,
            side = event.side.as_str(),
            size = %size,
            price = %info.reference_price,
            minutes = event.minutes,
            leader_created_at = ?event.created_at(),
            follower_order_id,
            "Mirrored leader TWAP"
        );

        Ok(MirrorOutcome::Placed {
            key,
            follower_order_id,
            size,
        })
    }

    async fn on_terminal(
        &self,
        store: &mut MappingStore,
        event: &TwapEvent,
    ) -> MirrorResult<MirrorOutcome> {
        let key = event.key();

        // Removed before the cancel so a failed cancel never leaves a stale entry.
        let Some(mapping) = store.remove(&key) else {
            debug!(key = %key, status = %event.status, "Leader TWAP ended without a mirror");
            return Ok(MirrorOutcome::Skipped(SkipReason::NotMirrored));
        };

        if let Err(e) = self
            .client
            .cancel_twap(mapping.asset, mapping.follower_order_id)
            .await
        {
            warn!(
                key = %key,
                follower_order_id = mapping.follower_order_id,
                error = %e,
                "Failed to cancel follower TWAP"
            );
            return Err(MirrorError::Submission {
                action: "twapCancel",
                reason: format!("{:#}", e),
            });
        }

        info!(
            key = %key,
            status = %event.status,
            follower_order_id = mapping.follower_order_id,
            "Cancelled follower TWAP"
        );

        Ok(MirrorOutcome::Cancelled {
            key,
            follower_order_id: mapping.follower_order_id,
        })
    }
}
