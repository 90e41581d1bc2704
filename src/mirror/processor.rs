//! Sequential event processor: the single consumer of the frame queue.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::decode::{decode_frame, Frame};
use super::{MappingStore, MirrorOutcome, TwapMirrorEngine};

/// Counters for one processing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    pub frames: u64,
    pub decode_errors: u64,
    pub events: u64,
    pub placed: u64,
    pub cancelled: u64,
    pub skipped: u64,
    pub ignored: u64,
    pub failed: u64,
}

impl fmt::Display for ProcessorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Mirror Statistics ===")?;
        writeln!(f, "Frames:     {} ({} malformed)", self.frames, self.decode_errors)?;
        writeln!(f, "Events:     {}", self.events)?;
        writeln!(f, "Placed:     {}", self.placed)?;
        writeln!(f, "Cancelled:  {}", self.cancelled)?;
        writeln!(f, "Skipped:    {} (non-spot: {})", self.skipped, self.ignored)?;
        writeln!(f, "Failed:     {}", self.failed)?;
        Ok(())
    }
}

/// What the processor hands back when it stops.
#[derive(Debug)]
pub struct ProcessorSummary {
    pub store: MappingStore,
    pub stats: ProcessorStats,
}

/// Awaits each event to completion before reading the next one.
pub struct SequentialProcessor {
    engine: TwapMirrorEngine,
    store: MappingStore,
    queue: UnboundedReceiver<String>,
    shutdown: Arc<AtomicBool>,
    poll_timeout: Duration,
    stats: ProcessorStats,
}

impl SequentialProcessor {
    /// Create a processor with an empty mapping store.
    pub fn new(
        engine: TwapMirrorEngine,
        queue: UnboundedReceiver<String>,
        shutdown: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            store: MappingStore::new(),
            queue,
            shutdown,
            poll_timeout,
            stats: ProcessorStats::default(),
        }
    }

    /// Run until the queue is closed and drained, or until shutdown is set
    /// and a poll interval passes with no frame.
    pub async fn run(mut self) -> ProcessorSummary {
        info!("Event processor started");

        loop {
            match timeout(self.poll_timeout, self.queue.recv()).await {
                Ok(Some(raw)) => self.process_frame(&raw).await,
                Ok(None) => {
                    debug!("Frame queue closed");
                    break;
                }
                Err(_) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }

        info!(
            frames = self.stats.frames,
            placed = self.stats.placed,
            active_mirrors = self.store.len(),
            "Event processor stopped"
        );

        ProcessorSummary {
            store: self.store,
            stats: self.stats,
        }
    }

    /// Decode one frame and run each of its events through the engine in order.
    pub async fn process_frame(&mut self, raw: &str) {
        self.stats.frames += 1;

        let events = match decode_frame(raw) {
            Ok(Frame::TwapEvents { events, malformed }) => {
                self.stats.decode_errors += malformed;
                events
            }
            Ok(Frame::SubscriptionAck) => {
                info!("Subscription confirmed");
                return;
            }
            Ok(Frame::Error(message)) => {
                warn!(message = %message, "Venue reported an error");
                return;
            }
            Ok(Frame::Pong) | Ok(Frame::Other(_)) => return,
            Err(e) => {
                self.stats.decode_errors += 1;
                warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        for event in events {
            self.stats.events += 1;

            match self.engine.handle(&mut self.store, &event).await {
                Ok(MirrorOutcome::Placed { .. }) => self.stats.placed += 1,
                Ok(MirrorOutcome::Cancelled { .. }) => self.stats.cancelled += 1,
                Ok(MirrorOutcome::Skipped(reason)) => {
                    self.stats.skipped += 1;
                    debug!(key = %event.key(), reason = %reason, "Event skipped");
                }
                Ok(MirrorOutcome::Ignored) => self.stats.ignored += 1,
                Err(e) => {
                    self.stats.failed += 1;
                    warn!(
                        key = %event.key(),
                        kind = e.kind(),
                        error = %e,
                        "Failed to mirror event"
                    );
                }
            }
        }
    }
}
