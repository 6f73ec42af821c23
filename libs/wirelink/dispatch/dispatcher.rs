use crate::command::CommandRegistry;
use crate::core::events::SessionEvent;
use crate::dispatch::latency::{latency_millis, LatencyProbe};
use crate::dispatch::queue::InboundReceiver;
use crate::error::WireError;
use crate::message::{ChatFrame, Identity, InboundFrame, OutboundMessage};
use crate::session::SessionHandle;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Routes inbound frames to identity tracking, latency replies and commands
///
/// Frames are handled one at a time in queue order.
pub struct InboundDispatcher {
    session: Arc<dyn SessionHandle>,
    registry: Arc<dyn CommandRegistry>,
    prefix: String,
    response_prefix: String,
    probe: Arc<LatencyProbe>,
}

impl InboundDispatcher {
    pub fn new(
        session: Arc<dyn SessionHandle>,
        registry: Arc<dyn CommandRegistry>,
        prefix: impl Into<String>,
        response_prefix: impl Into<String>,
        probe: Arc<LatencyProbe>,
    ) -> Self {
        Self {
            session,
            registry,
            prefix: prefix.into(),
            response_prefix: response_prefix.into(),
            probe,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn response_prefix(&self) -> &str {
        &self.response_prefix
    }

    pub fn probe(&self) -> &Arc<LatencyProbe> {
        &self.probe
    }

    /// Consume frames until `shutdown` resolves or the queue closes
    pub async fn run<S>(&self, mut receiver: InboundReceiver, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        debug!("Inbound dispatcher started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Inbound dispatcher received shutdown signal");
                    break;
                }
                frame = receiver.recv() => match frame {
                    Some(frame) => self.handle_frame(frame).await,
                    None => {
                        debug!("Inbound queue closed");
                        break;
                    }
                },
            }
        }

        debug!("Inbound dispatcher exiting");
    }

    pub async fn handle_frame(&self, frame: InboundFrame) {
        match frame {
            InboundFrame::Identity(identity) => self.handle_identity(identity).await,
            InboundFrame::Chat(chat) => self.handle_chat(chat).await,
        }
    }

    async fn handle_identity(&self, identity: Identity) {
        if self.session.assign_identity(identity.clone()) {
            info!(
                "Connected as: {} ({})",
                identity.display_name, identity.connection_id
            );
            self.session.observe(SessionEvent::Identified(identity));
        }

        if let Some(elapsed) = self.probe.take_elapsed() {
            self.session.observe(SessionEvent::Latency(elapsed));
            let text = format!(
                "{} Pong! (Latency: {:.2}ms)",
                self.response_prefix,
                latency_millis(elapsed)
            );
            if let Err(e) = self.reply(text).await {
                error!("Failed to send ping response: {}", e);
            }
        }
    }

    async fn handle_chat(&self, chat: ChatFrame) {
        let own_id = self
            .session
            .identity()
            .map(|identity| identity.connection_id)
            .unwrap_or_default();
        if chat.text.is_empty() || chat.sender_id == own_id {
            return;
        }

        let mut tokens = chat.text.split_whitespace();
        let Some(first) = tokens.next() else {
            return;
        };

        if let Some(name) = first.strip_prefix(self.prefix.as_str()) {
            let args: Vec<String> = tokens.map(str::to_string).collect();
            let reply = self.registry.execute(name, &args).await;
            if reply.is_sendable() {
                if let Err(e) = self.reply(reply.text).await {
                    error!("Failed to send message: {}", e);
                }
            }
        }

        info!("{}: {}", chat.sender_name, chat.text);
    }

    /// Send a chat reply, retrying once after a rate-limit rejection
    async fn reply(&self, text: String) -> crate::error::Result<()> {
        let message = OutboundMessage::send_message(text);
        match self.session.send(message.clone()).await {
            Err(WireError::RateLimited { route, retry_after }) => {
                warn!("Rate limited on {}, retrying in {:?}", route, retry_after);
                tokio::time::sleep(retry_after).await;
                self.session.send(message).await
            }
            other => other,
        }
    }
}
