//! End-to-end over real WebSockets against the mock chat server

mod common;

use async_trait::async_trait;
use common::{wait_until, MockChatServer};
use std::sync::Arc;
use std::time::Duration;
use wirelink::{
    Command, CommandReply, CommandTable, ConnectionState, HeartbeatMode, InboundDispatcher,
    InboundFrame, LatencyProbe, OutboundMessage, SessionHandle, ShutdownSignal,
};

struct Echo;

#[async_trait]
impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo back your message"
    }

    async fn execute(&self, args: &[String]) -> CommandReply {
        if args.is_empty() {
            return CommandReply::unhandled();
        }
        CommandReply::handled(format!("> {}", args.join(" ")))
    }
}

#[tokio::test]
async fn test_connect_and_receive_identity() {
    let server = MockChatServer::start().await;
    let (session, mut inbound) = wirelink::builder()
        .url(server.ws_url())
        .build()
        .unwrap();

    session.connect().await.unwrap();
    assert!(session.is_connected());

    let frame = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
        .await
        .expect("identity frame")
        .unwrap();
    match frame {
        InboundFrame::Identity(identity) => {
            verbose_println!("identity: {:?}", identity);
            assert!(identity.connection_id.starts_with("conn-"));
            assert_eq!(identity.display_name, "Hermit");
        }
        other => panic!("unexpected frame: {:?}", other),
    }

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_heartbeat_ping_keeps_connection() {
    let server = MockChatServer::start().await;
    let (session, _inbound) = wirelink::builder()
        .url(server.ws_url())
        .ping_interval(Duration::from_millis(50))
        .heartbeat(Duration::from_millis(50), HeartbeatMode::TransportPing)
        .build()
        .unwrap();

    session.connect().await.unwrap();
    assert!(session.start_heartbeat().is_some());
    assert!(session.start_heartbeat().is_none());

    assert!(
        wait_until(Duration::from_secs(5), || session
            .metrics()
            .time_since_last_pong
            .is_some())
        .await
    );
    assert_eq!(session.state(), ConnectionState::Connected);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let server = MockChatServer::start().await;
    let (session, _inbound) = wirelink::builder()
        .url(server.ws_url())
        .build()
        .unwrap();
    session.connect().await.unwrap();

    server.kick_all();

    assert!(
        wait_until(Duration::from_secs(10), || session.metrics().reconnect_count == 1
            && session.is_connected())
        .await
    );
    session
        .send(OutboundMessage::send_message("after reconnect"))
        .await
        .unwrap();
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_echo_command_round_trip() {
    let server = MockChatServer::start().await;
    let (session, inbound) = wirelink::builder()
        .url(server.ws_url())
        .build()
        .unwrap();
    session.connect().await.unwrap();

    let handle: Arc<dyn SessionHandle> = Arc::new(session.clone());
    let dispatcher = InboundDispatcher::new(
        Arc::clone(&handle),
        Arc::new(CommandTable::new().with(Echo)),
        "$",
        ">",
        Arc::new(LatencyProbe::new()),
    );
    let shutdown = Arc::new(ShutdownSignal::new());
    let dispatch_task = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { dispatcher.run(inbound, async move { shutdown.wait().await }).await })
    };

    assert!(wait_until(Duration::from_secs(5), || handle.identity().is_some()).await);

    server.say("user-1", "Alice", "$echo hello world");

    let expected = r#"{"action":"sendMessage","data":{"message":"> hello world"}}"#;
    assert!(
        wait_until(Duration::from_secs(5), || server
            .received()
            .iter()
            .any(|text| text == expected))
        .await
    );

    // The relayed copy of our own reply is not treated as a command
    tokio::time::sleep(Duration::from_millis(100)).await;
    let replies = server
        .received()
        .iter()
        .filter(|text| text.contains("sendMessage"))
        .count();
    assert_eq!(replies, 1);

    shutdown.trigger();
    dispatch_task.await.unwrap();
    session.close().await.unwrap();
}
