//! Spot market resolution: coin reference → asset index, price and precision.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::api::{SpotAssetContext, SpotMeta, SpotMetaAndAssetCtxs};
use crate::error::{MirrorError, MirrorResult};
use crate::models::{AssetInfo, MarketRef};

/// Read-only source of spot metadata.
#[async_trait]
pub trait SpotMetadataSource: Send + Sync {
    async fn spot_meta(&self) -> Result<SpotMeta>;

    async fn spot_meta_and_asset_ctxs(&self) -> Result<SpotMetaAndAssetCtxs>;
}

/// Stateless lookups over a [`SpotMetadataSource`]. Every call re-fetches.
#[derive(Clone)]
pub struct MarketDataResolver {
    source: Arc<dyn SpotMetadataSource>,
    default_size_decimals: u32,
}

impl MarketDataResolver {
    pub fn new(source: Arc<dyn SpotMetadataSource>, default_size_decimals: u32) -> Self {
        Self {
            source,
            default_size_decimals,
        }
    }

    /// Scan the spot universe for a pair name.
    pub async fn resolve_index_by_name(&self, name: &str) -> MirrorResult<u32> {
        let meta = self
            .source
            .spot_meta()
            .await
            .map_err(|e| MirrorError::resolution(name, format!("spotMeta: {:#}", e)))?;

        meta.pair_by_name(name)
            .map(|pair| pair.index)
            .ok_or_else(|| MirrorError::resolution(name, "pair not in spot universe"))
    }

    /// Price and precision for a known spot index.
    pub async fn resolve_by_index(&self, coin: &str, index: u32) -> MirrorResult<AssetInfo> {
        let (meta, ctxs) = self
            .source
            .spot_meta_and_asset_ctxs()
            .await
            .map_err(|e| MirrorError::resolution(coin, format!("spotMetaAndAssetCtxs: {:#}", e)))?;

        let ctx = ctxs
            .get(index as usize)
            .ok_or_else(|| MirrorError::resolution(coin, format!("no asset context at index {}", index)))?;

        let reference_price = reference_price(ctx)
            .ok_or_else(|| MirrorError::resolution(coin, "no positive mid or mark price"))?;

        let size_decimals = size_precision(&meta, index, self.default_size_decimals);

        debug!(
            coin = %coin,
            index,
            price = %reference_price,
            size_decimals,
            "Resolved spot asset"
        );

        Ok(AssetInfo {
            asset_index: index,
            reference_price,
            size_decimals,
        })
    }

    /// Name lookup (when needed) followed by index resolution.
    pub async fn resolve(&self, coin: &str, market: &MarketRef) -> MirrorResult<AssetInfo> {
        let index = match market {
            MarketRef::SpotIndex(index) => *index,
            MarketRef::SpotPair(name) => self.resolve_index_by_name(name).await?,
            MarketRef::NotSpot => {
                return Err(MirrorError::resolution(coin, "not a spot market"));
            }
        };

        self.resolve_by_index(coin, index).await
    }
}

/// Mid price if positive, otherwise mark price if positive.
pub fn reference_price(ctx: &SpotAssetContext) -> Option<Decimal> {
    ctx.mid_px
        .filter(|p| *p > Decimal::ZERO)
        .or_else(|| ctx.mark_px.filter(|p| *p > Decimal::ZERO))
}

/// Size decimals of the pair's base token, or `default` when unknown.
pub fn size_precision(meta: &SpotMeta, index: u32, default: u32) -> u32 {
    meta.pair_by_index(index)
        .and_then(|pair| meta.token(pair.tokens[0]))
        .map(|token| token.sz_decimals)
        .unwrap_or(default)
}
