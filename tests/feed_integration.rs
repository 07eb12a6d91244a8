//! End-to-end tests for the order feed client against an in-process
//! WebSocket server. Covers:
//!
//! - The auth handshake: `{"type":"auth","token":...}` is sent on open and
//!   a `connected` event fires.
//! - Typed dispatch: inbound broadcast frames reach exactly the subscribers
//!   registered for their kind.
//! - Fail-open decoding: malformed and unrecognized frames are dropped
//!   without closing the connection.
//! - Reconnection: an unclean close surfaces `disconnected` with code 1006
//!   and the client re-runs the open+auth sequence after the backoff delay.
//! - Disconnect: idempotent, and deterministically suppresses any scheduled
//!   reconnect.
//! - Re-auth: `connect` on a live connection re-sends the auth frame on the
//!   same socket instead of opening a second one.
//!
//! Every wait is wrapped in a generous timeout so a regression fails fast
//! instead of hanging the suite.

use comanda_link::{
    BroadcastEvent, ConnectionOptions, EventKind, FeedEvent, OrderFeedClient,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

const WAIT: Duration = Duration::from_secs(5);

/// Bind a listener on an ephemeral port and return it with its ws:// URL.
async fn bind_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let url = format!("ws://{}", listener.local_addr().expect("local addr"));
    (listener, url)
}

/// Subscribe to a kind, forwarding clones of every event into a channel.
fn record_events(
    client: &OrderFeedClient,
    kind: EventKind,
) -> (comanda_link::Subscription, mpsc::UnboundedReceiver<FeedEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub = client.subscribe(kind, move |event| {
        let _ = tx.send(event.clone());
    });
    (sub, rx)
}

#[tokio::test]
async fn test_connect_sends_auth_frame_and_emits_connected() {
    let (listener, url) = bind_server().await;

    let (auth_tx, mut auth_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = auth_tx.send(text.to_string());
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = OrderFeedClient::builder().url(&url).build().unwrap();
    let (_sub, mut connected_rx) = record_events(&client, EventKind::Connected);

    client.connect("abc").await.unwrap();

    let auth = timeout(WAIT, auth_rx.recv()).await.expect("auth frame").unwrap();
    let frame: serde_json::Value = serde_json::from_str(&auth).unwrap();
    assert_eq!(frame["type"], "auth");
    assert_eq!(frame["token"], "abc");

    let event = timeout(WAIT, connected_rx.recv()).await.expect("connected event").unwrap();
    assert!(matches!(event, FeedEvent::Connected));
    assert!(client.is_connected());
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_broadcast_frames_reach_their_subscribers() {
    let (listener, url) = bind_server().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.next().await; // auth
        ws.send(Message::Text(
            r#"{"type":"itemServed","data":{"orderId":"X","itemCode":"T-01-001-1","isServed":true}}"#
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = OrderFeedClient::builder().url(&url).build().unwrap();
    let (_served_sub, mut served_rx) = record_events(&client, EventKind::ItemServed);
    let (_paid_sub, mut paid_rx) = record_events(&client, EventKind::OrderPaid);

    client.connect("abc").await.unwrap();

    let event = timeout(WAIT, served_rx.recv()).await.expect("itemServed event").unwrap();
    match event {
        FeedEvent::Broadcast(BroadcastEvent::ItemServed {
            order_id,
            item_code,
            is_served,
            ..
        }) => {
            assert_eq!(order_id, "X");
            assert_eq!(item_code.as_deref(), Some("T-01-001-1"));
            assert!(is_served);
        },
        other => panic!("unexpected event: {:?}", other),
    }

    // The orderPaid subscriber saw nothing.
    assert!(paid_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_bad_frames_are_dropped_without_closing_the_connection() {
    let (listener, url) = bind_server().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.next().await; // auth
        for frame in [
            "not a frame at all",
            r#"{"missing":"type field"}"#,
            r#"{"type":"tableMoved","data":{"tableId":"5"}}"#,
            r#"{"type":"newOrder","data":{"orderId":"42","orderCode":"D-01-003"}}"#,
        ] {
            ws.send(Message::Text(frame.to_string().into())).await.unwrap();
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = OrderFeedClient::builder().url(&url).build().unwrap();
    let (_order_sub, mut order_rx) = record_events(&client, EventKind::NewOrder);
    let (_disc_sub, mut disc_rx) = record_events(&client, EventKind::Disconnected);

    client.connect("abc").await.unwrap();

    // Only the final, valid frame is delivered, in order, after the bad
    // ones were dropped.
    let event = timeout(WAIT, order_rx.recv()).await.expect("newOrder event").unwrap();
    match event {
        FeedEvent::Broadcast(BroadcastEvent::NewOrder { order_id, .. }) => {
            assert_eq!(order_id, "42");
        },
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(order_rx.try_recv().is_err());
    assert!(disc_rx.try_recv().is_err(), "bad frames must not close the connection");
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_unclean_close_reports_1006_and_reconnects() {
    let (listener, url) = bind_server().await;

    let (auth_tx, mut auth_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        // First connection: authenticated, then dropped without a close
        // handshake.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = auth_tx.send(text.to_string());
        }
        drop(ws);

        // Second connection: stays open.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = auth_tx.send(text.to_string());
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = OrderFeedClient::builder()
        .url(&url)
        .options(
            ConnectionOptions::new()
                .with_reconnect_delay_ms(100)
                .with_max_reconnect_delay_ms(1000),
        )
        .build()
        .unwrap();
    let (_conn_sub, mut connected_rx) = record_events(&client, EventKind::Connected);
    let (_disc_sub, mut disc_rx) = record_events(&client, EventKind::Disconnected);

    client.connect("abc").await.unwrap();

    timeout(WAIT, auth_rx.recv()).await.expect("first auth").unwrap();
    timeout(WAIT, connected_rx.recv()).await.expect("first connected").unwrap();

    let event = timeout(WAIT, disc_rx.recv()).await.expect("disconnected event").unwrap();
    match event {
        FeedEvent::Disconnected(reason) => assert_eq!(reason.code, Some(1006)),
        other => panic!("unexpected event: {:?}", other),
    }

    // The client re-runs the open+auth sequence on its own.
    let reauth = timeout(WAIT, auth_rx.recv()).await.expect("second auth").unwrap();
    let frame: serde_json::Value = serde_json::from_str(&reauth).unwrap();
    assert_eq!(frame["token"], "abc", "reconnect must reuse the stored token");
    timeout(WAIT, connected_rx.recv()).await.expect("second connected").unwrap();
    assert_eq!(client.reconnect_attempts(), 0, "counter resets on successful open");
}

#[tokio::test]
async fn test_disconnect_is_idempotent_and_suppresses_reconnects() {
    let (listener, url) = bind_server().await;

    let (accept_tx, mut accept_rx) = mpsc::unbounded_channel::<()>();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let _ = accept_tx.send(());
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await; // auth
            drop(ws); // force the client to schedule a reconnect
        }
    });

    let client = OrderFeedClient::builder()
        .url(&url)
        .options(
            ConnectionOptions::new()
                .with_reconnect_delay_ms(200)
                .with_max_reconnect_delay_ms(1000),
        )
        .build()
        .unwrap();
    let (_conn_sub, mut connected_rx) = record_events(&client, EventKind::Connected);

    client.connect("abc").await.unwrap();
    timeout(WAIT, accept_rx.recv()).await.expect("first accept").unwrap();
    timeout(WAIT, connected_rx.recv()).await.expect("first connected").unwrap();

    // The server has dropped us by now (or will shortly), so a reconnect
    // is or will be scheduled. Disconnect twice: the second call must be a
    // no-op, and the pending timer must never fire a new attempt.
    client.disconnect().await;
    client.disconnect().await;

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(accept_rx.try_recv().is_err(), "no reconnect after disconnect()");
    assert!(connected_rx.try_recv().is_err(), "no connected event after disconnect()");
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_connect_on_live_handle_resends_auth_instead_of_reopening() {
    let (listener, url) = bind_server().await;

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<String>();
    let (accept_tx, mut accept_rx) = mpsc::unbounded_channel::<()>();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let _ = accept_tx.send(());
            let msg_tx = msg_tx.clone();
            tokio::spawn(async move {
                let mut ws = accept_async(stream).await.unwrap();
                while let Some(Ok(frame)) = ws.next().await {
                    if let Message::Text(text) = frame {
                        let _ = msg_tx.send(text.to_string());
                    }
                }
            });
        }
    });

    let client = OrderFeedClient::builder().url(&url).build().unwrap();
    let (_conn_sub, mut connected_rx) = record_events(&client, EventKind::Connected);

    client.connect("first-token").await.unwrap();
    timeout(WAIT, connected_rx.recv()).await.expect("connected").unwrap();
    let first = timeout(WAIT, msg_rx.recv()).await.expect("first auth").unwrap();
    assert!(first.contains("first-token"));

    client.connect("second-token").await.unwrap();
    let second = timeout(WAIT, msg_rx.recv()).await.expect("second auth").unwrap();
    let frame: serde_json::Value = serde_json::from_str(&second).unwrap();
    assert_eq!(frame["type"], "auth");
    assert_eq!(frame["token"], "second-token");

    // Still exactly one TCP connection, and no second connected event.
    timeout(WAIT, accept_rx.recv()).await.expect("one accept").unwrap();
    assert!(accept_rx.try_recv().is_err(), "re-auth must not open a second handle");
    assert!(connected_rx.try_recv().is_err());
}
