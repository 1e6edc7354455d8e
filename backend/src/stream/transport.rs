//! Push-channel transports.
//!
//! A transport turns [`SubscriptionParams`] into a stream of raw messages.
//! Dropping the returned stream closes the channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use super::{SubscriptionParams, TransportError};

/// One framed message from the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// SSE event name; `None` for the default `message` event.
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl RawMessage {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
            id: None,
        }
    }
}

pub type MessageStream = BoxStream<'static, Result<RawMessage, TransportError>>;

/// Opens push channels to the cluster producer.
#[async_trait]
pub trait ClusterTransport: Send + Sync {
    async fn connect(&self, params: &SubscriptionParams) -> Result<MessageStream, TransportError>;
}

// =============================================================================
// SSE over HTTP
// =============================================================================

#[cfg(feature = "http-client")]
pub use self::sse_http::SseTransport;

#[cfg(feature = "http-client")]
mod sse_http {
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use reqwest::header::{ACCEPT, CACHE_CONTROL};

    use super::{ClusterTransport, MessageStream};
    use crate::stream::sse::SseDecoder;
    use crate::stream::{SubscriptionParams, TransportError};

    /// Subscribes to `{base}/devices/{source}/stream/clusters`.
    #[derive(Debug, Clone)]
    pub struct SseTransport {
        client: reqwest::Client,
        base_url: reqwest::Url,
    }

    impl SseTransport {
        pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
            let base_url = reqwest::Url::parse(base_url)
                .map_err(|e| TransportError::Connect(format!("invalid producer url '{}': {}", base_url, e)))?;
            let client = reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .build()
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            Ok(Self { client, base_url })
        }

        /// Stream URL for `params`, with the source id as an encoded path segment.
        pub fn stream_url(&self, params: &SubscriptionParams) -> Result<reqwest::Url, TransportError> {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| TransportError::Connect(format!("producer url '{}' cannot be a base", self.base_url)))?
                .pop_if_empty()
                .extend(["devices", params.source_id.as_str(), "stream", "clusters"]);
            url.query_pairs_mut()
                .append_pair("numClusters", &params.cluster_count.to_string())
                .append_pair("intervalSeconds", &params.refresh_interval_secs.to_string());
            Ok(url)
        }
    }

    #[async_trait]
    impl ClusterTransport for SseTransport {
        async fn connect(&self, params: &SubscriptionParams) -> Result<MessageStream, TransportError> {
            let url = self.stream_url(params)?;
            log::info!("Opening cluster stream {}", url);

            let response = self
                .client
                .get(url)
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

            if !response.status().is_success() {
                return Err(TransportError::Status(response.status().as_u16()));
            }

            let mut body = Box::pin(response.bytes_stream());
            let stream = async_stream::stream! {
                let mut decoder = SseDecoder::new();
                while let Some(chunk) = body.next().await {
                    match chunk {
                        Ok(bytes) => {
                            for message in decoder.feed(&bytes) {
                                yield Ok(message);
                            }
                        }
                        Err(e) => {
                            yield Err(TransportError::Io(e.to_string()));
                            break;
                        }
                    }
                }
            };
            Ok(stream.boxed())
        }
    }
}

// =============================================================================
// In-memory channel
// =============================================================================

type Sender = mpsc::UnboundedSender<Result<RawMessage, TransportError>>;

#[derive(Default)]
struct ChannelState {
    senders: Vec<Sender>,
    connects: usize,
    refuse: usize,
    last_params: Option<SubscriptionParams>,
}

/// In-process transport fed by the caller.
///
/// Every `connect` opens a new channel; [`send`](Self::send) delivers to all
/// channels still open, so a leaked channel shows up as a duplicate delivery.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    state: Arc<Mutex<ChannelState>>,
    live: Arc<AtomicUsize>,
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `message` to every open channel. Returns how many received it.
    pub fn send(&self, message: RawMessage) -> usize {
        self.deliver(Ok(message))
    }

    /// Send `value` as JSON under `event`.
    pub fn send_json(&self, event: &str, value: &impl Serialize) -> usize {
        match serde_json::to_string(value) {
            Ok(data) => self.send(RawMessage::new(event, data)),
            Err(e) => {
                log::error!("Failed to serialize test message: {}", e);
                0
            }
        }
    }

    /// Push a transport error into every open channel.
    pub fn fail(&self, error: TransportError) -> usize {
        self.deliver(Err(error))
    }

    /// End every open channel as if the peer hung up.
    pub fn hang_up(&self) {
        self.state.lock().senders.clear();
    }

    /// Make the next `n` connection attempts fail.
    pub fn refuse_next(&self, n: usize) {
        self.state.lock().refuse = n;
    }

    /// Channels whose receiving stream is still alive.
    pub fn live_channels(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Successful and refused connection attempts.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    pub fn last_params(&self) -> Option<SubscriptionParams> {
        self.state.lock().last_params.clone()
    }

    fn deliver(&self, item: Result<RawMessage, TransportError>) -> usize {
        let mut state = self.state.lock();
        state.senders.retain(|tx| !tx.is_closed());
        state
            .senders
            .iter()
            .filter(|tx| tx.send(item.clone()).is_ok())
            .count()
    }
}

#[async_trait]
impl ClusterTransport for ChannelTransport {
    async fn connect(&self, params: &SubscriptionParams) -> Result<MessageStream, TransportError> {
        let mut rx = {
            let mut state = self.state.lock();
            state.connects += 1;
            state.last_params = Some(params.clone());
            if state.refuse > 0 {
                state.refuse -= 1;
                return Err(TransportError::Connect("connection refused".to_string()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            state.senders.push(tx);
            rx
        };

        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&self.live));
        let stream = async_stream::stream! {
            let _guard = guard;
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };
        Ok(stream.boxed())
    }
}
