//! Stream ingester: the single producer of the frame queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use crate::error::MirrorError;

/// How an ingester run ended.
#[derive(Debug)]
pub struct IngestOutcome {
    /// Frames handed to the queue before stopping
    pub forwarded: u64,
    /// Set when the transport failed
    pub error: Option<MirrorError>,
}

/// Forwards raw text frames into the queue without inspecting them.
pub struct EventIngester {
    queue: UnboundedSender<String>,
    shutdown: Arc<AtomicBool>,
    poll_timeout: Duration,
}

impl EventIngester {
    /// Create an ingester feeding `queue`.
    pub fn new(
        queue: UnboundedSender<String>,
        shutdown: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            shutdown,
            poll_timeout,
        }
    }

    /// Pump frames until the stream ends, closes, fails or shutdown is set.
    ///
    /// The forwarded count is reported even when the stream fails. The queue
    /// sender is dropped on return so the processor can drain and stop.
    pub async fn run<S>(self, mut stream: S) -> IngestOutcome
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        let mut forwarded = 0u64;

        while !self.shutdown.load(Ordering::SeqCst) {
            let message = match timeout(self.poll_timeout, stream.next()).await {
                Err(_) => continue,
                Ok(None) => {
                    info!("Event stream ended");
                    break;
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, forwarded, "Event stream failed");
                    return IngestOutcome {
                        forwarded,
                        error: Some(e.into()),
                    };
                }
                Ok(Some(Ok(message))) => message,
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        debug!("Dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Close(frame) => {
                    info!(frame = ?frame, "Event stream closed by venue");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            if self.queue.send(text).is_err() {
                debug!("Frame queue receiver dropped");
                break;
            }
            forwarded += 1;
        }

        IngestOutcome {
            forwarded,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::sync::mpsc;

    fn ingester(shutdown: bool) -> (EventIngester, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ingester = EventIngester::new(
            tx,
            Arc::new(AtomicBool::new(shutdown)),
            Duration::from_millis(10),
        );
        (ingester, rx)
    }

    #[tokio::test]
    async fn test_forwards_frames_in_order() {
        let (ingester, mut rx) = ingester(false);
        let frames = stream::iter(vec![
            Ok(Message::Text("a".to_string())),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Binary(b"b".to_vec())),
            Ok(Message::Binary(vec![0xff, 0xfe])),
            Ok(Message::Text("c".to_string())),
        ]);

        let outcome = ingester.run(frames).await;
        assert_eq!(outcome.forwarded, 3);
        assert!(outcome.error.is_none());

        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert_eq!(rx.recv().await.as_deref(), Some("c"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stops_at_close_frame() {
        let (ingester, mut rx) = ingester(false);
        let frames = stream::iter(vec![
            Ok(Message::Text("a".to_string())),
            Ok(Message::Close(None)),
            Ok(Message::Text("late".to_string())),
        ]);

        assert_eq!(ingester.run(frames).await.forwarded, 1);
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_transport_error_is_stream_error() {
        let (ingester, mut rx) = ingester(false);
        let frames = stream::iter(vec![
            Ok(Message::Text("a".to_string())),
            Ok(Message::Text("b".to_string())),
            Err(tungstenite::Error::ConnectionClosed),
        ]);

        let outcome = ingester.run(frames).await;
        assert!(matches!(outcome.error, Some(MirrorError::Stream(_))));
        assert_eq!(outcome.forwarded, 2);
        // Already-queued frames survive for the processor
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_observes_shutdown_on_silent_stream() {
        let (ingester, _rx) = ingester(false);
        let shutdown = ingester.shutdown.clone();

        let handle = tokio::spawn(ingester.run(stream::pending::<Result<Message, tungstenite::Error>>()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown.store(true, Ordering::SeqCst);

        let outcome = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("ingester should notice shutdown")
            .unwrap();
        assert_eq!(outcome.forwarded, 0);
        assert!(outcome.error.is_none());
    }
}
