//! Wormhole channel and event loop.
//!
//! This module implements the cross-domain request channel: a WebSocket
//! connection to a remote gateway, with request/response correlation,
//! the `ready` handshake, and FIFO queueing of requests submitted before
//! the channel is linked.
//!
//! # Event Loop
//!
//! The channel spawns a tokio task that handles:
//!
//! - Incoming gateway messages (`ready`, tagged responses)
//! - Outgoing requests from the local API
//! - Request/response correlation by monotonic request ID
//! - Pre-link queueing and the linked-state flush
//!
//! # Delivery Semantics
//!
//! Each request resolves exactly once. On success the success callback
//! fires with the payload, then the always callback, then the future
//! resolves. On failure the failure callback fires with the normalized
//! `{status, responseText}` error, then the always callback, then the
//! future rejects. Completion order across concurrent requests is
//! unspecified; only the pre-link queue flush is FIFO.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{AjaxParams, ChannelMessage, RequestEnvelope, ResponseEnvelope};
use crate::transport::Transport;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to their pending entries.
type PendingMap = FxHashMap<RequestId, PendingRequest>;

/// Success callback, invoked with the response payload.
pub type SuccessFn = Box<dyn FnOnce(&Value) + Send>;

/// Failure callback, invoked with the normalized error.
pub type FailureFn = Box<dyn FnOnce(&Error) + Send>;

/// Always callback, invoked after either branch.
pub type AlwaysFn = Box<dyn FnOnce() + Send>;

// ============================================================================
// AjaxCallbacks
// ============================================================================

/// Optional callback set attached to one request.
///
/// All callbacks are one-shot. The always callback runs after the
/// success or failure callback, exactly once per request.
#[derive(Default)]
pub struct AjaxCallbacks {
    success: Option<SuccessFn>,
    failure: Option<FailureFn>,
    always: Option<AlwaysFn>,
}

impl AjaxCallbacks {
    /// Creates an empty callback set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the success callback.
    #[inline]
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(&Value) + Send + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }

    /// Sets the failure callback.
    #[inline]
    #[must_use]
    pub fn on_failure(mut self, f: impl FnOnce(&Error) + Send + 'static) -> Self {
        self.failure = Some(Box::new(f));
        self
    }

    /// Sets the always callback.
    #[inline]
    #[must_use]
    pub fn on_always(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.always = Some(Box::new(f));
        self
    }
}

// ============================================================================
// PendingRequest
// ============================================================================

/// Bookkeeping for one in-flight request.
///
/// Owned by the correlation map from submission until its response is
/// dispatched; removed exactly once.
struct PendingRequest {
    /// Resolves the caller's future.
    response_tx: oneshot::Sender<Result<Value>>,
    /// Optional callback set.
    callbacks: AjaxCallbacks,
}

impl PendingRequest {
    /// Delivers the success branch: success callback, always callback,
    /// future resolution.
    fn succeed(self, payload: Value) {
        if let Some(f) = self.callbacks.success {
            f(&payload);
        }
        if let Some(f) = self.callbacks.always {
            f();
        }
        let _ = self.response_tx.send(Ok(payload));
    }

    /// Delivers the failure branch: failure callback, always callback,
    /// future rejection.
    fn fail(self, error: Error) {
        if let Some(f) = self.callbacks.failure {
            f(&error);
        }
        if let Some(f) = self.callbacks.always {
            f();
        }
        let _ = self.response_tx.send(Err(error));
    }
}

// ============================================================================
// AjaxFuture
// ============================================================================

/// Future resolving with one request's payload or normalized error.
///
/// Resolves consistently with the request's callbacks: the same branch,
/// after them.
#[must_use = "futures do nothing unless awaited"]
pub struct AjaxFuture {
    rx: oneshot::Receiver<Result<Value>>,
}

impl Future for AjaxFuture {
    type Output = Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// ChannelCommand
// ============================================================================

/// Internal commands for the event loop.
enum ChannelCommand {
    /// Send a request (or queue it while unlinked).
    Send { envelope: RequestEnvelope },
    /// Close the connection.
    Shutdown,
}

// ============================================================================
// Channel
// ============================================================================

/// Cross-domain request channel to a remote gateway.
///
/// Hides the connection mechanics behind a single asynchronous call
/// primitive: [`Channel::ajax`]. Requests submitted before the gateway's
/// `ready` handshake queue in submission order and flush FIFO once the
/// channel links.
///
/// # Thread Safety
///
/// `Channel` is `Send + Sync` and can be cloned across tasks; all clones
/// share one connection, one correlation map, and one ID sequence.
pub struct Channel {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ChannelCommand>,
    /// Correlation map (shared with event loop).
    pending: Arc<Mutex<PendingMap>>,
    /// Whether the `ready` handshake completed.
    linked: Arc<AtomicBool>,
    /// Next request ID to hand out.
    next_request: Arc<AtomicU64>,
}

impl Clone for Channel {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            pending: Arc::clone(&self.pending),
            linked: Arc::clone(&self.linked),
            next_request: Arc::clone(&self.next_request),
        }
    }
}

impl Channel {
    /// Connects to a gateway URL and spawns the event loop.
    ///
    /// The URL scheme must be `ws` or `wss`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is invalid or has a non-WebSocket scheme
    /// - [`Error::Connection`] if the gateway cannot be reached
    pub async fn connect(server_url: &str) -> Result<Self> {
        let url = Url::parse(server_url)
            .map_err(|e| Error::config(format!("invalid gateway URL {server_url:?}: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "gateway URL must use ws:// or wss://, got {:?}",
                url.scheme()
            )));
        }

        let (ws_stream, _) = tokio_tungstenite::connect_async(server_url)
            .await
            .map_err(|e| Error::connection(format!("gateway connect failed: {e}")))?;

        debug!(url = %server_url, "gateway connection established");

        Ok(Self::from_stream(ws_stream))
    }

    /// Creates a channel from an established WebSocket stream.
    ///
    /// Spawns the event loop task internally. The channel starts
    /// unlinked; the gateway is expected to send `{"type": "ready"}`
    /// once it has loaded.
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(PendingMap::default()));
        let linked = Arc::new(AtomicBool::new(false));

        tokio::spawn(run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&pending),
            Arc::clone(&linked),
        ));

        Self {
            command_tx,
            pending,
            linked,
            next_request: Arc::new(AtomicU64::new(RequestId::FIRST.value())),
        }
    }

    /// Submits a request and returns its future.
    ///
    /// Equivalent to [`Channel::ajax_with`] with no callbacks.
    pub fn ajax(&self, params: AjaxParams) -> AjaxFuture {
        self.ajax_with(params, AjaxCallbacks::new())
    }

    /// Submits a request with an attached callback set.
    ///
    /// Allocates the next request ID, registers the pending entry, and
    /// either sends the envelope immediately (linked) or queues it
    /// (unlinked). The returned future may be awaited instead of, or in
    /// addition to, the callbacks.
    pub fn ajax_with(&self, params: AjaxParams, callbacks: AjaxCallbacks) -> AjaxFuture {
        let request_id = RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed));
        let (response_tx, response_rx) = oneshot::channel();

        self.pending.lock().insert(
            request_id,
            PendingRequest {
                response_tx,
                callbacks,
            },
        );

        trace!(%request_id, url = %params.url, method = %params.method, "request submitted");

        let envelope = RequestEnvelope::new(request_id, params);
        if self
            .command_tx
            .send(ChannelCommand::Send { envelope })
            .is_err()
        {
            // Event loop is gone; fail the request it will never see.
            if let Some(entry) = self.pending.lock().remove(&request_id) {
                entry.fail(Error::ConnectionClosed);
            }
        }

        AjaxFuture { rx: response_rx }
    }

    /// Returns `true` once the `ready` handshake completed.
    ///
    /// The transition happens exactly once and never reverts.
    #[inline]
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Shuts down the channel.
    ///
    /// Outstanding requests fail with
    /// [`Error::ConnectionClosed`](crate::Error::ConnectionClosed).
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ChannelCommand::Shutdown);
    }
}

#[async_trait]
impl Transport for Channel {
    async fn ajax(&self, params: AjaxParams) -> Result<Value> {
        Channel::ajax(self, params).await
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Event loop that owns the WebSocket and the linked/queue state.
async fn run_event_loop<S>(
    ws_stream: WebSocketStream<S>,
    mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    pending: Arc<Mutex<PendingMap>>,
    linked: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut is_linked = false;
    let mut queue: VecDeque<RequestEnvelope> = VecDeque::new();

    loop {
        tokio::select! {
            // Incoming messages from the gateway
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match from_str::<ChannelMessage>(&text) {
                            Ok(ChannelMessage::Ready) => {
                                if is_linked {
                                    warn!("duplicate ready handshake, ignoring");
                                } else {
                                    is_linked = true;
                                    linked.store(true, Ordering::Release);
                                    debug!(queued = queue.len(), "channel linked, flushing queue");
                                    while let Some(envelope) = queue.pop_front() {
                                        send_envelope(&mut ws_write, envelope).await;
                                    }
                                }
                            }
                            Ok(ChannelMessage::Response(response)) => {
                                dispatch_response(response, &pending);
                            }
                            // The channel contract is fixed; anything else is a
                            // protocol violation. Drop the message, keep the loop.
                            Err(e) => {
                                error!(error = %e, text = %text, "unknown channel message, dropping");
                            }
                        }
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!("channel closed by gateway");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "channel transport error");
                        break;
                    }

                    None => {
                        debug!("channel stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            // Commands from the local API
            command = command_rx.recv() => {
                match command {
                    Some(ChannelCommand::Send { envelope }) => {
                        if is_linked {
                            send_envelope(&mut ws_write, envelope).await;
                        } else {
                            trace!(request_id = %envelope.request_id, "channel not linked, queueing");
                            queue.push_back(envelope);
                        }
                    }

                    Some(ChannelCommand::Shutdown) => {
                        debug!("shutdown command received");
                        let _ = ws_write.close().await;
                        break;
                    }

                    None => {
                        debug!("command channel closed");
                        break;
                    }
                }
            }
        }
    }

    fail_pending_requests(&pending);

    debug!("event loop terminated");
}

/// Posts one envelope across the channel.
///
/// Send failures are caught and logged here; the pending entry stays
/// registered. Abandonment is a higher layer's concern, and a throw
/// would desynchronize every other in-flight request.
async fn send_envelope<S>(
    ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
    envelope: RequestEnvelope,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let request_id = envelope.request_id;

    let json = match to_string(&envelope) {
        Ok(j) => j,
        Err(e) => {
            error!(%request_id, error = %e, "failed to serialize request envelope");
            return;
        }
    };

    if let Err(e) = ws_write.send(Message::Text(json.into())).await {
        warn!(%request_id, error = %e, "failed to post request across the channel");
        return;
    }

    trace!(%request_id, "request sent");
}

/// Routes a tagged response to its pending request, exactly once.
fn dispatch_response(response: ResponseEnvelope, pending: &Arc<Mutex<PendingMap>>) {
    let Some(entry) = pending.lock().remove(&response.request_id) else {
        warn!(request_id = %response.request_id, "response for unknown request");
        return;
    };

    if response.success {
        entry.succeed(response.data.unwrap_or(Value::Null));
    } else {
        entry.fail(Error::remote(response.status(), response.response_text()));
    }
}

/// Fails all pending requests when the connection goes away.
fn fail_pending_requests(pending: &Arc<Mutex<PendingMap>>) {
    let drained: Vec<_> = pending.lock().drain().collect();
    let count = drained.len();

    for (_, entry) in drained {
        entry.fail(Error::ConnectionClosed);
    }

    if count > 0 {
        debug!(count, "failed pending requests on close");
    }
}

// ============================================================================
// Tests
// ============================================================================
