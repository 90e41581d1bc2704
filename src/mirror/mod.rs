//! TWAP mirroring: decode leader events, decide, and act on the follower account.

mod client;
mod config;
mod decode;
mod engine;
mod ingester;
mod mapping_store;
mod position_sizer;
mod processor;
mod resolver;

pub use client::{DryRunClient, TradingClient, TwapOrderRequest};
pub use config::MirrorConfig;
pub use engine::{MirrorOutcome, TwapMirrorEngine};
pub use ingester::{EventIngester, IngestOutcome};
pub use mapping_store::{MappingStore, MirrorMapping};
pub use position_sizer::PositionSizer;
pub use processor::{ProcessorStats, ProcessorSummary, SequentialProcessor};
pub use resolver::{MarketDataResolver, SpotMetadataSource};
