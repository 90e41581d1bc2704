//! Mirror session: wires the websocket, the ingester and the processor together.
//!
//! Handles:
//! - Connecting and subscribing to the leader's user events
//! - Keeping the socket alive with application-level pings
//! - Running the ingester and the sequential processor until shutdown
//! - Reporting what the session did

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::api::WsRequest;
use crate::mirror::{
    EventIngester, IngestOutcome, MarketDataResolver, MirrorConfig, PositionSizer,
    ProcessorStats, ProcessorSummary, SequentialProcessor, SpotMetadataSource, TradingClient,
    TwapMirrorEngine,
};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Websocket endpoint
    pub ws_url: String,

    /// Address whose TWAPs are mirrored
    pub leader_address: String,

    /// Our own address, when a signing key is configured
    pub follower_address: Option<String>,

    /// Orders are logged instead of sent
    pub dry_run: bool,

    /// Sizing and loop configuration
    pub mirror: MirrorConfig,
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub frames_forwarded: u64,
    pub stats: ProcessorStats,
    /// Mirrors still active when the session stopped
    pub active_mirrors: usize,
    /// Set when the session ended because the stream failed
    pub stream_error: Option<String>,
}

impl std::fmt::Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stats)?;
        writeln!(f, "Forwarded:  {}", self.frames_forwarded)?;
        writeln!(f, "Active:     {}", self.active_mirrors)?;
        if let Some(e) = &self.stream_error {
            writeln!(f, "Stream:     {}", e)?;
        }
        Ok(())
    }
}

/// One monitoring session for a single leader.
pub struct MirrorSession {
    config: SessionConfig,
    engine: TwapMirrorEngine,
    shutdown: Arc<AtomicBool>,
}

impl MirrorSession {
    /// Create a new session; the engine is built from the session's mirror config.
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn TradingClient>,
        source: Arc<dyn SpotMetadataSource>,
    ) -> Self {
        let resolver = MarketDataResolver::new(source, config.mirror.default_size_decimals);
        let sizer = PositionSizer::new(&config.mirror);
        let engine = TwapMirrorEngine::new(client, resolver, sizer);

        Self {
            config,
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect, subscribe and mirror until ctrl-c or the stream ends.
    pub async fn run(self) -> Result<SessionReport> {
        let MirrorSession {
            config,
            engine,
            shutdown,
        } = self;

        if let Some(follower) = &config.follower_address {
            if follower.eq_ignore_ascii_case(&config.leader_address) {
                warn!(
                    address = %follower,
                    "Leader and follower are the same account; mirrored TWAPs may be mirrored again"
                );
            }
        }

        info!(
            leader = %config.leader_address,
            ws_url = %config.ws_url,
            dry_run = config.dry_run,
            notional = %config.mirror.fixed_notional,
            "Starting mirror session"
        );

        let (ws, _) = connect_async(config.ws_url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", config.ws_url))?;
        let (mut write, read) = ws.split();

        let subscribe = serde_json::to_string(&WsRequest::user_events(&config.leader_address))?;
        write
            .send(Message::Text(subscribe))
            .await
            .context("Failed to send subscription")?;
        info!(leader = %config.leader_address, "Subscribed to user events");

        // Register shutdown handler
        let ctrl_c_flag = shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            ctrl_c_flag.store(true, Ordering::SeqCst);
        });

        let poll_timeout = config.mirror.poll_timeout();
        let (tx, rx) = mpsc::unbounded_channel();

        let heartbeat_task = tokio::spawn(heartbeat(
            write,
            shutdown.clone(),
            config.mirror.heartbeat_interval(),
            poll_timeout,
        ));

        let processor = SequentialProcessor::new(engine, rx, shutdown.clone(), poll_timeout);
        let processor_task = tokio::spawn(processor.run());

        let ingester = EventIngester::new(tx, shutdown.clone(), poll_timeout);
        let ingest = tokio::spawn(ingester.run(read))
            .await
            .context("Ingester task panicked")?;

        // Whatever stopped the ingester stops the heartbeat too
        shutdown.store(true, Ordering::SeqCst);

        if let Some(e) = &ingest.error {
            error!(error = %e, forwarded = ingest.forwarded, "Session stream failed");
        }

        let summary = processor_task.await.context("Processor task panicked")?;
        if let Err(e) = heartbeat_task.await {
            warn!(error = %e, "Heartbeat task panicked");
        }

        for mapping in summary.store.iter() {
            info!(
                key = %mapping.key,
                coin = %mapping.coin,
                follower_order_id = mapping.follower_order_id,
                "Mirror still active at shutdown"
            );
        }

        info!(
            active_mirrors = summary.store.len(),
            placed = summary.stats.placed,
            cancelled = summary.stats.cancelled,
            "Mirror session complete"
        );

        Ok(SessionReport::new(ingest, summary))
    }
}

impl SessionReport {
    fn new(ingest: IngestOutcome, summary: ProcessorSummary) -> Self {
        Self {
            frames_forwarded: ingest.forwarded,
            active_mirrors: summary.store.len(),
            stats: summary.stats,
            stream_error: ingest.error.map(|e| e.to_string()),
        }
    }
}

/// Send a ping every `every` until shutdown, then a close frame.
async fn heartbeat<S>(mut sink: S, shutdown: Arc<AtomicBool>, every: Duration, poll: Duration)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let ping = match serde_json::to_string(&WsRequest::Ping) {
        Ok(ping) => ping,
        Err(e) => {
            error!(error = %e, "Failed to encode ping");
            return;
        }
    };

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    while !shutdown.load(Ordering::SeqCst) {
        if timeout(poll, ticker.tick()).await.is_err() {
            continue;
        }

        if let Err(e) = sink.send(Message::Text(ping.clone())).await {
            warn!(error = %e, "Heartbeat failed");
            return;
        }
        debug!("Heartbeat sent");
    }

    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(error = %e, "Failed to send close frame");
    }
}
