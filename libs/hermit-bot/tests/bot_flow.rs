//! Integration test: the bot end to end over an in-memory chat endpoint

use async_trait::async_trait;
use hermit_bot::{Bot, HermitConfig, ShutdownManager};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wirelink::{
    ConnectionState, Connector, Result, TransportPair, TransportSink, TransportStream, WsMessage,
};

const BOT_ID: &str = "bot-1";

/// Answers `getId` with an identity frame and records everything written
#[derive(Default)]
struct ChatEndpoint {
    written: Mutex<Vec<String>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<Result<WsMessage>>>>,
}

impl ChatEndpoint {
    fn deliver(&self, json: String) {
        if let Some(tx) = self.inbound.lock().as_ref() {
            let _ = tx.send(Ok(WsMessage::Text(json)));
        }
    }

    fn say(&self, sender: &str, text: &str) {
        self.deliver(format!(
            r#"{{"message":"{}","sender":"{}","senderName":"{}"}}"#,
            text, sender, sender
        ));
    }

    /// Chat texts the bot sent
    fn replies(&self) -> Vec<String> {
        self.written
            .lock()
            .iter()
            .filter_map(|raw| {
                let value: serde_json::Value = serde_json::from_str(raw).ok()?;
                value["data"]["message"].as_str().map(str::to_string)
            })
            .collect()
    }
}

#[derive(Clone, Default)]
struct ChatConnector {
    endpoint: Arc<ChatEndpoint>,
}

#[async_trait]
impl Connector for ChatConnector {
    async fn connect(&self, _url: &str, _handshake_timeout: Duration) -> Result<TransportPair> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.endpoint.inbound.lock() = Some(tx);
        Ok(TransportPair::new(
            Box::new(ChatSink {
                endpoint: Arc::clone(&self.endpoint),
            }),
            Box::new(ChatStream { rx }),
        ))
    }
}

struct ChatSink {
    endpoint: Arc<ChatEndpoint>,
}

#[async_trait]
impl TransportSink for ChatSink {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if let WsMessage::Text(text) = message {
            if text.contains("\"getId\"") {
                self.endpoint.deliver(format!(
                    r#"{{"connectionId":"{}","name":"Hermit"}}"#,
                    BOT_ID
                ));
            }
            self.endpoint.written.lock().push(text);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct ChatStream {
    rx: mpsc::UnboundedReceiver<Result<WsMessage>>,
}

#[async_trait]
impl TransportStream for ChatStream {
    async fn next(&mut self) -> Option<Result<WsMessage>> {
        self.rx.recv().await
    }
}

fn config() -> HermitConfig {
    let config = HermitConfig::parse(
        r#"
bot:
  prefix: "$"
  response_prefix: ">"
websocket:
  url: "ws://in-memory"
"#,
    )
    .unwrap();
    config.validate().unwrap();
    config
}

async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_bot_answers_commands_and_shuts_down() {
    let connector = ChatConnector::default();
    let endpoint = Arc::clone(&connector.endpoint);
    let mut bot = Bot::with_connector(config(), connector).unwrap();
    let session = bot.session().clone();
    let shutdown = ShutdownManager::new();

    let runner = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { bot.run(&shutdown).await })
    };

    assert!(eventually(|| session.state() == ConnectionState::Connected).await);
    assert!(
        eventually(|| {
            use wirelink::SessionHandle;
            session.identity().is_some()
        })
        .await
    );

    endpoint.say("alice", "$echo hello world");
    assert!(eventually(|| endpoint.replies().contains(&"> hello world".to_string())).await);

    endpoint.say("alice", "$help echo");
    assert!(
        eventually(|| endpoint
            .replies()
            .contains(&"echo - Echo back your message".to_string()))
        .await
    );

    endpoint.say("alice", "$ping");
    assert!(
        eventually(|| endpoint
            .replies()
            .iter()
            .any(|r| r.starts_with("> Pong! (Latency: ") && r.ends_with("ms)")))
        .await
    );

    // Our own messages are never treated as commands
    let before = endpoint.replies().len();
    endpoint.say(BOT_ID, "$echo myself");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(endpoint.replies().len(), before);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("bot should stop")
        .unwrap()
        .unwrap();
    assert_eq!(session.state(), ConnectionState::Closed);
}
