use super::*;
use crate::stream::ChannelTransport;
use std::time::Instant;

fn options() -> ClientOptions {
    ClientOptions {
        reconnect: false,
        ..ClientOptions::default()
    }
}

fn client_with(options: ClientOptions) -> (ChannelTransport, StreamClient) {
    let transport = ChannelTransport::new();
    let client = StreamClient::new(Arc::new(transport.clone()), options);
    (transport, client)
}

fn params(k: u32) -> SubscriptionParams {
    SubscriptionParams::new("dev-1", k, 5)
}

fn snapshot(source: &str, id: &str, ts: i64) -> String {
    serde_json::json!({
        "updateId": id,
        "sessionId": format!("stream-{}", id),
        "timestamp": ts,
        "zones": [
            {"clusterId": 0, "centroidLat": 1.0, "centroidLon": 2.0, "pointCount": 1, "quality": "Good"}
        ],
        "totalPoints": 1,
        "metadata": {"deviceId": source}
    })
    .to_string()
}

fn send(transport: &ChannelTransport, id: &str, ts: i64) -> usize {
    transport.send(RawMessage::new("cluster-update", snapshot("dev-1", id, ts)))
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_open_receives_snapshot_and_goes_live() {
    let (transport, client) = client_with(options());
    assert_eq!(client.status(), ConnectionStatus::Idle);
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    assert_eq!(send(&transport, "u1", 100), 1);
    wait_for(|| client.latest().is_some()).await;

    let latest = client.latest().unwrap();
    assert_eq!(latest.update_id, "u1");
    assert_eq!(client.status(), ConnectionStatus::Live);
    assert!(client.state().connected());
}

#[tokio::test]
async fn test_invalid_params_rejected_before_connecting() {
    let (transport, client) = client_with(options());
    let err = client.open(SubscriptionParams::new("dev-1", 1, 5)).await.unwrap_err();
    assert!(matches!(err, VizError::InvalidParameters { .. }));
    assert_eq!(transport.connect_count(), 0);
}

#[tokio::test]
async fn test_malformed_message_keeps_last_snapshot_and_recovers() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    send(&transport, "u1", 100);
    wait_for(|| client.state().accepted == 1).await;

    transport.send(RawMessage::new("cluster-update", "{not json"));
    wait_for(|| client.state().rejected == 1).await;
    let state = client.state();
    assert!(state.stale);
    assert!(!state.connected());
    assert_eq!(client.latest().unwrap().update_id, "u1");

    send(&transport, "u2", 200);
    wait_for(|| client.state().accepted == 2).await;
    let state = client.state();
    assert!(!state.stale);
    assert!(state.connected());
    assert_eq!(state.last_error, None);
    assert_eq!(client.latest().unwrap().update_id, "u2");
}

#[tokio::test]
async fn test_out_of_order_snapshot_does_not_regress() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    send(&transport, "newer", 200);
    send(&transport, "older", 100);
    wait_for(|| client.state().out_of_order == 1).await;

    assert_eq!(client.latest().unwrap().update_id, "newer");
    assert_eq!(client.state().accepted, 1);
}

#[tokio::test]
async fn test_equal_timestamp_with_new_id_replaces() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    send(&transport, "a", 100);
    send(&transport, "b", 100);
    send(&transport, "b", 100);
    wait_for(|| client.state().accepted + client.state().out_of_order == 3).await;

    assert_eq!(client.latest().unwrap().update_id, "b");
    assert_eq!(client.state().accepted, 2);
}

#[tokio::test]
async fn test_open_same_params_is_idempotent() {
    let (transport, client) = client_with(options());
    let first = client.open(params(4)).await.unwrap();
    let second = client.open(params(4)).await.unwrap();
    assert_eq!(first, second);
    wait_for(|| transport.live_channels() == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.connect_count(), 1);
}

#[tokio::test]
async fn test_reopen_with_new_params_leaves_one_channel() {
    let (transport, client) = client_with(options());
    let first = client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    client.close(&first).await;
    let second = client.open(params(6)).await.unwrap();
    assert_ne!(first, second);
    wait_for(|| transport.connect_count() == 2 && transport.live_channels() == 1).await;
    assert_eq!(transport.last_params(), Some(params(6)));

    // Exactly one revision bump for one message: the old channel is gone.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let before = client.revision();
    assert_eq!(send(&transport, "u1", 100), 1);
    wait_for(|| client.state().accepted == 1).await;
    assert_eq!(client.revision() - before, 1);
}

#[tokio::test]
async fn test_param_change_replaces_channel_without_close() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;
    client.open(params(5)).await.unwrap();
    wait_for(|| transport.connect_count() == 2).await;
    wait_for(|| transport.live_channels() == 1).await;
    assert_eq!(send(&transport, "u1", 1), 1);
}

#[tokio::test]
async fn test_close_is_idempotent_and_stops_updates() {
    let (transport, client) = client_with(options());
    let handle = client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    client.close(&handle).await;
    assert_eq!(transport.live_channels(), 0);
    client.close(&handle).await;
    client.shutdown().await;

    assert_eq!(client.status(), ConnectionStatus::Closed);
    assert_eq!(send(&transport, "late", 100), 0);
    assert!(client.latest().is_none());
}

#[tokio::test]
async fn test_stale_handle_close_does_not_touch_new_subscription() {
    let (transport, client) = client_with(options());
    let old = client.open(params(4)).await.unwrap();
    client.open(params(8)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    client.close(&old).await;
    assert_eq!(transport.live_channels(), 1);
    assert_ne!(client.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn test_snapshot_kept_on_param_change_cleared_on_source_change() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;
    send(&transport, "u1", 100);
    wait_for(|| client.latest().is_some()).await;

    client.open(params(5)).await.unwrap();
    assert_eq!(client.latest().unwrap().update_id, "u1");

    client.open(SubscriptionParams::new("dev-2", 5, 5)).await.unwrap();
    assert!(client.latest().is_none());
}

#[tokio::test]
async fn test_first_snapshot_after_reopen_accepted_even_if_older() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;
    send(&transport, "u1", 500);
    wait_for(|| client.latest().is_some()).await;

    client.open(params(5)).await.unwrap();
    wait_for(|| transport.connect_count() == 2 && transport.live_channels() == 1).await;
    send(&transport, "restart", 10);
    wait_for(|| client.state().accepted == 2).await;
    assert_eq!(client.latest().unwrap().update_id, "restart");
}

#[tokio::test]
async fn test_transport_error_disconnects_and_keeps_snapshot() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;
    send(&transport, "u1", 100);
    wait_for(|| client.latest().is_some()).await;

    transport.fail(TransportError::Io("reset by peer".into()));
    wait_for(|| client.status() == ConnectionStatus::Disconnected).await;

    assert_eq!(client.latest().unwrap().update_id, "u1");
    assert!(client.state().last_error.unwrap().contains("reset by peer"));
    wait_for(|| transport.live_channels() == 0).await;
    assert_eq!(transport.connect_count(), 1);
}

#[tokio::test]
async fn test_reconnects_with_backoff_without_duplicate_channels() {
    let (transport, client) = client_with(ClientOptions {
        reconnect: true,
        backoff_base: Duration::from_millis(10),
        backoff_max: Duration::from_millis(40),
        ..ClientOptions::default()
    });
    transport.refuse_next(2);
    client.open(params(4)).await.unwrap();

    wait_for(|| transport.live_channels() == 1).await;
    assert_eq!(transport.connect_count(), 3);

    transport.hang_up();
    wait_for(|| transport.connect_count() == 4 && transport.live_channels() == 1).await;
    assert_eq!(send(&transport, "u1", 1), 1);
    wait_for(|| client.status() == ConnectionStatus::Live).await;
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let (transport, client) = client_with(ClientOptions {
        reconnect: true,
        backoff_base: Duration::from_millis(5),
        backoff_max: Duration::from_millis(5),
        max_attempts: Some(2),
        ..ClientOptions::default()
    });
    transport.refuse_next(10);
    client.open(params(4)).await.unwrap();

    wait_for(|| transport.connect_count() == 3).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.connect_count(), 3);
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_silence_marks_silent_until_next_snapshot() {
    let (transport, client) = client_with(ClientOptions {
        silence_timeout: Duration::from_millis(30),
        ..options()
    });
    client.open(params(4)).await.unwrap();
    wait_for(|| client.status() == ConnectionStatus::Silent).await;
    assert!(!client.state().connected());

    send(&transport, "u1", 1);
    wait_for(|| client.status() == ConnectionStatus::Live).await;
}

#[tokio::test]
async fn test_silence_notifies_once_per_transition() {
    let (_transport, client) = client_with(ClientOptions {
        silence_timeout: Duration::from_millis(20),
        ..options()
    });
    client.open(params(4)).await.unwrap();
    wait_for(|| client.status() == ConnectionStatus::Silent).await;

    let revision = client.revision();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(client.status(), ConnectionStatus::Silent);
    assert_eq!(client.revision(), revision);
}

#[tokio::test]
async fn test_zero_silence_timeout_disables_silence_check() {
    let (transport, client) = client_with(ClientOptions {
        silence_timeout: Duration::ZERO,
        ..options()
    });
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.status(), ConnectionStatus::Connecting);

    send(&transport, "u1", 1);
    wait_for(|| client.status() == ConnectionStatus::Live).await;
}

#[tokio::test]
async fn test_device_stream_payload_with_session_uuid_accepted() {
    let (transport, client) = client_with(options());
    client.open(SubscriptionParams::new("R58M123", 4, 5)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    let data = serde_json::json!({
        "updateId": "c3e1",
        "sessionId": "5f0c8a2e-3c1b-4a57-9d0e-2b7f6a1c4e88",
        "timestamp": 1_700_000_000_000i64,
        "zones": [{"clusterId": 0, "centerLat": 1.0, "centerLon": 2.0, "pointCount": 1, "quality": "Fair"}],
        "totalPoints": 1,
        "metadata": {"deviceId": "R58M123", "duration": 5000}
    });
    transport.send(RawMessage::new("cluster-update", data.to_string()));
    wait_for(|| client.latest().is_some()).await;

    let state = client.state();
    assert_eq!(state.rejected, 0);
    assert_eq!(state.last_error, None);
    assert_eq!(client.latest().unwrap().source_id, "R58M123");
}

#[tokio::test]
async fn test_other_events_are_not_decode_errors() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    transport.send(RawMessage::new("keep-alive", "ping"));
    send(&transport, "u1", 1);
    wait_for(|| client.state().accepted == 1).await;
    assert_eq!(client.state().rejected, 0);
}

#[tokio::test]
async fn test_snapshot_for_other_source_rejected() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    transport.send(RawMessage::new("cluster-update", snapshot("dev-9", "x", 1)));
    wait_for(|| client.state().rejected == 1).await;
    assert!(client.latest().is_none());
}

#[tokio::test]
async fn test_dropping_client_closes_channel() {
    let (transport, client) = client_with(options());
    client.open(params(4)).await.unwrap();
    wait_for(|| transport.live_channels() == 1).await;

    drop(client);
    wait_for(|| transport.live_channels() == 0).await;
}
