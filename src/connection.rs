//! Background connection task for the order feed.
//!
//! One task exclusively owns the WebSocket handle and the reconnect timer;
//! the public [`OrderFeedClient`](crate::client::OrderFeedClient) talks to
//! it over a command channel. The task:
//!
//! 1. Opens the feed and sends the auth frame when a connect command arrives
//! 2. Reads frames in arrival order and routes them to the event bus
//! 3. Sends keepalive pings while idle and tears down unresponsive handles
//! 4. On connection loss, schedules reconnects with exponential backoff
//!
//! Because the task is the only connector, at most one handle and one
//! pending reconnect timer exist at any time. `disconnect()` clears the
//! shared retry flag before its command is queued, and every timer re-checks
//! that flag when it fires, so a disconnect deterministically suppresses any
//! reconnect that was already scheduled.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant as TokioInstant;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{error::Error as WsError, protocol::Message},
};

use crate::backoff::ReconnectPolicy;
use crate::decoder::{decode_frame, DecodeError};
use crate::error::{ComandaLinkError, Result};
use crate::event_bus::EventBus;
use crate::models::{
    ClientFrame, ConnectionError, ConnectionOptions, DisconnectReason, FeedEvent,
};

pub(crate) type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

/// Maximum sleep duration that won't overflow `Instant + Duration`.
/// ~100 years is far enough into the future to be effectively "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// WebSocket close code reported for abnormal closures.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Commands sent from the public API to the background connection task.
pub(crate) enum ConnCmd {
    /// Open the feed, or re-send the auth frame when a handle is already live.
    Connect { token: String },
    /// Close the live handle and stop reconnecting.
    Disconnect,
}

/// Observability flags shared between the client handle and the task.
#[derive(Clone)]
pub(crate) struct ConnectionShared {
    /// Whether the feed is currently open and authenticated.
    pub(crate) connected: Arc<AtomicBool>,
    /// Whether the session is still desired. Cleared synchronously by
    /// `disconnect()` and checked whenever a reconnect timer fires.
    pub(crate) retry_enabled: Arc<AtomicBool>,
    /// Reconnection attempt counter (resets on a successful open).
    pub(crate) reconnect_attempts: Arc<AtomicU32>,
}

impl ConnectionShared {
    pub(crate) fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            retry_enabled: Arc::new(AtomicBool::new(false)),
            reconnect_attempts: Arc::new(AtomicU32::new(0)),
        }
    }
}

/// Whether a lost connection should be re-established.
fn should_reconnect(
    options: &ConnectionOptions,
    shared: &ConnectionShared,
    token: &Option<String>,
) -> bool {
    options.auto_reconnect && shared.retry_enabled.load(Ordering::SeqCst) && token.is_some()
}

/// Open the WebSocket handle, bounded by the configured handshake timeout.
async fn open_feed(url: &str, options: &ConnectionOptions) -> Result<WebSocketStream> {
    let connect_fut = connect_async(url);
    let connect_result = if options.connect_timeout_ms > 0 {
        match tokio::time::timeout(
            Duration::from_millis(options.connect_timeout_ms),
            connect_fut,
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                return Err(ComandaLinkError::WebSocketError(format!(
                    "Connection timeout after {}ms",
                    options.connect_timeout_ms
                )));
            },
        }
    } else {
        connect_fut.await
    };

    match connect_result {
        Ok((stream, _response)) => Ok(stream),
        Err(WsError::Http(response)) => {
            let status = response.status();
            let body_text = response
                .into_body()
                .as_ref()
                .and_then(|b| {
                    if b.is_empty() {
                        None
                    } else {
                        Some(String::from_utf8_lossy(b).into_owned())
                    }
                })
                .unwrap_or_default();
            match status.as_u16() {
                401 => Err(ComandaLinkError::AuthenticationError(
                    "Unauthorized: feed requires valid credentials".to_string(),
                )),
                403 => Err(ComandaLinkError::AuthenticationError(
                    "Forbidden: access to the feed denied".to_string(),
                )),
                code => {
                    if body_text.is_empty() {
                        Err(ComandaLinkError::WebSocketError(format!(
                            "Feed HTTP error: {}",
                            code
                        )))
                    } else {
                        Err(ComandaLinkError::WebSocketError(format!(
                            "Feed HTTP error {}: {}",
                            code, body_text
                        )))
                    }
                },
            }
        },
        Err(e) => Err(ComandaLinkError::WebSocketError(format!(
            "Connection failed: {}",
            e
        ))),
    }
}

/// Send the `{"type":"auth","token":...}` frame.
async fn send_auth(ws: &mut WebSocketStream, token: &str) -> Result<()> {
    let frame = ClientFrame::Auth {
        token: token.to_string(),
    };
    let payload = serde_json::to_string(&frame).map_err(|e| {
        ComandaLinkError::SerializationError(format!("Failed to serialize auth frame: {}", e))
    })?;
    ws.send(Message::Text(payload.into()))
        .await
        .map_err(|e| ComandaLinkError::WebSocketError(format!("Failed to send auth frame: {}", e)))
}

/// Open the feed and authenticate. The caller treats inbound domain frames
/// as proof of an accepted token; there is no blocking wait for an ack.
async fn establish(
    url: &str,
    token: &str,
    options: &ConnectionOptions,
) -> Result<WebSocketStream> {
    let mut ws = open_feed(url, options).await?;
    send_auth(&mut ws, token).await?;
    Ok(ws)
}

/// Decode one inbound frame and fan it out, dropping bad frames with a log.
fn route_frame(text: &str, bus: &EventBus) {
    match decode_frame(text) {
        Ok(event) => bus.emit(&FeedEvent::Broadcast(event)),
        Err(DecodeError::UnknownType(name)) => {
            log::warn!(
                "[comanda-link] Dropping frame with unrecognized type '{}'",
                name
            );
        },
        Err(DecodeError::Malformed(e)) => {
            log::warn!("[comanda-link] Dropping malformed frame: {}", e);
        },
    }
}

/// The background task owning the feed connection.
pub(crate) async fn connection_task(
    mut cmd_rx: mpsc::Receiver<ConnCmd>,
    feed_url: String,
    options: ConnectionOptions,
    bus: EventBus,
    shared: ConnectionShared,
) {
    let policy =
        ReconnectPolicy::from_millis(options.reconnect_delay_ms, options.max_reconnect_delay_ms);
    let mut ws_stream: Option<WebSocketStream> = None;
    let mut token: Option<String> = None;
    let mut reconnect_pending = false;

    // Keepalive configuration
    let has_keepalive = options.ping_interval_ms != 0;
    let keepalive_dur = if has_keepalive {
        Duration::from_millis(options.ping_interval_ms)
    } else {
        FAR_FUTURE
    };
    let mut idle_deadline = TokioInstant::now() + keepalive_dur;

    // Pong timeout: after sending a Ping, *some* frame must arrive within
    // this window or the connection is considered dead.
    let pong_timeout_dur = Duration::from_millis(options.pong_timeout_ms);
    let has_pong_timeout = has_keepalive && options.pong_timeout_ms != 0;
    let mut awaiting_pong = false;
    let mut pong_deadline = TokioInstant::now() + FAR_FUTURE;

    loop {
        if let Some(ref mut ws) = ws_stream {
            // ── Connected: multiplex commands, frames, keepalive ─────────
            let idle_sleep = tokio::time::sleep_until(idle_deadline);
            tokio::pin!(idle_sleep);

            let pong_sleep = tokio::time::sleep_until(pong_deadline);
            tokio::pin!(pong_sleep);

            tokio::select! {
                biased;

                // No frame arrived since our keepalive Ping.
                _ = &mut pong_sleep, if has_pong_timeout && awaiting_pong => {
                    log::warn!(
                        "[comanda-link] No frame within {:?} of keepalive ping; treating connection as dead",
                        pong_timeout_dur,
                    );
                    shared.connected.store(false, Ordering::SeqCst);
                    bus.emit(&FeedEvent::Disconnected(DisconnectReason::new(
                        "Keepalive timeout: server unresponsive",
                    )));
                    awaiting_pong = false;
                    ws_stream = None;
                    reconnect_pending = should_reconnect(&options, &shared, &token);
                    continue;
                }

                // Commands from the public API
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ConnCmd::Connect { token: new_token }) => {
                            // A handle is live: re-send the auth frame with
                            // the new token instead of opening a second one.
                            token = Some(new_token.clone());
                            match send_auth(ws, &new_token).await {
                                Ok(()) => {
                                    log::debug!("[comanda-link] Re-sent auth frame on live connection");
                                },
                                Err(e) => {
                                    log::warn!("[comanda-link] Failed to re-send auth frame: {}", e);
                                    bus.emit(&FeedEvent::Error(ConnectionError::new(e.to_string(), true)));
                                    shared.connected.store(false, Ordering::SeqCst);
                                    bus.emit(&FeedEvent::Disconnected(DisconnectReason::with_code(
                                        format!("Send failed: {}", e),
                                        ABNORMAL_CLOSURE,
                                    )));
                                    ws_stream = None;
                                    reconnect_pending = should_reconnect(&options, &shared, &token);
                                },
                            }
                        },
                        Some(ConnCmd::Disconnect) => {
                            let _ = ws.close(None).await;
                            shared.connected.store(false, Ordering::SeqCst);
                            bus.emit(&FeedEvent::Disconnected(DisconnectReason::with_code(
                                "Client requested disconnect",
                                1000,
                            )));
                            ws_stream = None;
                            reconnect_pending = false;
                        },
                        None => {
                            // Client handle dropped: close quietly and exit.
                            let _ = ws.close(None).await;
                            shared.connected.store(false, Ordering::SeqCst);
                            return;
                        },
                    }
                }

                // Keepalive ping
                _ = &mut idle_sleep, if has_keepalive && !awaiting_pong => {
                    if let Err(e) = ws.send(Message::Ping(Bytes::new())).await {
                        log::warn!("[comanda-link] Keepalive ping failed: {}", e);
                        shared.connected.store(false, Ordering::SeqCst);
                        bus.emit(&FeedEvent::Disconnected(DisconnectReason::new(
                            format!("Keepalive ping failed: {}", e),
                        )));
                        ws_stream = None;
                        reconnect_pending = should_reconnect(&options, &shared, &token);
                        continue;
                    }
                    if has_pong_timeout {
                        awaiting_pong = true;
                        pong_deadline = TokioInstant::now() + pong_timeout_dur;
                    }
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                }

                // Inbound frames, processed strictly in arrival order
                frame = ws.next() => {
                    // Any frame proves the connection is alive.
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    if awaiting_pong {
                        awaiting_pong = false;
                        pong_deadline = TokioInstant::now() + FAR_FUTURE;
                    }

                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            route_frame(&text, &bus);
                        },
                        Some(Ok(Message::Binary(data))) => {
                            match std::str::from_utf8(&data) {
                                Ok(text) => route_frame(text, &bus),
                                Err(e) => {
                                    log::warn!("[comanda-link] Dropping non-UTF-8 binary frame: {}", e);
                                },
                            }
                        },
                        Some(Ok(Message::Close(close_frame))) => {
                            let reason = match close_frame {
                                Some(f) => DisconnectReason::with_code(
                                    f.reason.to_string(),
                                    f.code.into(),
                                ),
                                None => DisconnectReason::new("Server closed connection"),
                            };
                            log::info!("[comanda-link] Feed disconnected: {}", reason);
                            shared.connected.store(false, Ordering::SeqCst);
                            bus.emit(&FeedEvent::Disconnected(reason));
                            ws_stream = None;
                            reconnect_pending = should_reconnect(&options, &shared, &token);
                            continue;
                        },
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = ws.send(Message::Pong(payload)).await;
                        },
                        Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {},
                        Some(Err(e)) => {
                            // Transport error: surfaced as an error event;
                            // the close that follows drives reconnection.
                            let msg = e.to_string();
                            log::warn!("[comanda-link] WebSocket error: {}", msg);
                            bus.emit(&FeedEvent::Error(ConnectionError::new(msg.clone(), true)));
                            shared.connected.store(false, Ordering::SeqCst);
                            bus.emit(&FeedEvent::Disconnected(DisconnectReason::with_code(
                                format!("WebSocket error: {}", msg),
                                ABNORMAL_CLOSURE,
                            )));
                            ws_stream = None;
                            reconnect_pending = should_reconnect(&options, &shared, &token);
                            continue;
                        },
                        None => {
                            shared.connected.store(false, Ordering::SeqCst);
                            bus.emit(&FeedEvent::Disconnected(DisconnectReason::with_code(
                                "Connection closed unexpectedly",
                                ABNORMAL_CLOSURE,
                            )));
                            ws_stream = None;
                            reconnect_pending = should_reconnect(&options, &shared, &token);
                            continue;
                        },
                    }
                }
            }
        } else {
            // ── Not connected: wait for a command or run the backoff timer ──
            if reconnect_pending && should_reconnect(&options, &shared, &token) {
                if let Some(max) = options.max_reconnect_attempts {
                    if shared.reconnect_attempts.load(Ordering::SeqCst) >= max {
                        log::warn!(
                            "[comanda-link] Max reconnection attempts ({}) reached",
                            max
                        );
                        bus.emit(&FeedEvent::Error(ConnectionError::new(
                            format!("Max reconnection attempts ({}) reached", max),
                            false,
                        )));
                        reconnect_pending = false;
                        continue;
                    }
                }

                let attempt = shared.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
                let delay = policy.delay(attempt);
                log::info!(
                    "[comanda-link] Reconnecting in {:?} (attempt {})",
                    delay,
                    attempt + 1
                );

                let sleep_fut = tokio::time::sleep(delay);
                tokio::pin!(sleep_fut);

                let mut cancelled = false;
                loop {
                    tokio::select! {
                        biased;
                        cmd = cmd_rx.recv() => match cmd {
                            Some(ConnCmd::Connect { token: new_token }) => {
                                // Fresh connect supersedes the timer.
                                token = Some(new_token);
                                break;
                            },
                            Some(ConnCmd::Disconnect) => {
                                cancelled = true;
                                break;
                            },
                            None => return,
                        },
                        _ = &mut sleep_fut => break,
                    }
                }

                // The retry flag is re-checked after the timer fires so a
                // disconnect issued while we slept always wins.
                if cancelled || !shared.retry_enabled.load(Ordering::SeqCst) {
                    reconnect_pending = false;
                    continue;
                }
            } else {
                reconnect_pending = false;
                match cmd_rx.recv().await {
                    Some(ConnCmd::Connect { token: new_token }) => {
                        token = Some(new_token);
                    },
                    Some(ConnCmd::Disconnect) => continue, // idempotent with no handle
                    None => return,
                }
            }

            // Single open+authenticate site for first connects and reconnects.
            let Some(tok) = token.clone() else {
                log::debug!("[comanda-link] No token available; not opening the feed");
                reconnect_pending = false;
                continue;
            };
            match establish(&feed_url, &tok, &options).await {
                Ok(stream) => {
                    if !shared.retry_enabled.load(Ordering::SeqCst) {
                        // disconnect() arrived while the handshake was in
                        // flight; close the fresh handle without surfacing
                        // any lifecycle event for it.
                        let mut stream = stream;
                        let _ = stream.close(None).await;
                        reconnect_pending = false;
                        continue;
                    }
                    ws_stream = Some(stream);
                    reconnect_pending = false;
                    shared.reconnect_attempts.store(0, Ordering::SeqCst);
                    shared.connected.store(true, Ordering::SeqCst);
                    log::info!("[comanda-link] Feed connected");
                    bus.emit(&FeedEvent::Connected);
                    idle_deadline = TokioInstant::now() + keepalive_dur;
                    awaiting_pong = false;
                    pong_deadline = TokioInstant::now() + FAR_FUTURE;
                },
                Err(e) => {
                    log::warn!("[comanda-link] Connection attempt failed: {}", e);
                    bus.emit(&FeedEvent::Error(ConnectionError::new(e.to_string(), true)));
                    reconnect_pending = should_reconnect(&options, &shared, &token);
                },
            }
        }
    }
}
