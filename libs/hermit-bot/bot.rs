//! Bot wiring: one session, one dispatcher, the built-in commands

use crate::commands::build_registry;
use crate::config::HermitConfig;
use crate::utils::ShutdownManager;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use wirelink::{
    ConnectionSession, Connector, InboundDispatcher, InboundReceiver, LatencyProbe,
    SessionBuilder, SessionEvent, SessionHandle, TungsteniteConnector,
};

/// How often the event logger drains the session's event channel
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct Bot {
    config: HermitConfig,
    session: ConnectionSession,
    inbound: Option<InboundReceiver>,
    dispatcher: Arc<InboundDispatcher>,
}

impl Bot {
    /// Build the bot against the configured endpoint
    pub fn new(config: HermitConfig) -> Result<Self> {
        Self::with_connector(config, TungsteniteConnector)
    }

    /// Build the bot over a custom transport
    pub fn with_connector(config: HermitConfig, connector: impl Connector) -> Result<Self> {
        info!("Initializing...");

        let mut builder = SessionBuilder::from_config(config.session_config())
            .connector(connector)
            .reconnect_strategy(config.reconnect_strategy());
        if let Some(limiter) = config.rate_limiter()? {
            builder = builder.rate_limiter(Arc::new(limiter));
        }
        let (session, inbound) = builder.build().context("Failed to build session")?;

        info!("Loading commands");
        let handle: Arc<dyn SessionHandle> = Arc::new(session.clone());
        let probe = Arc::new(LatencyProbe::new());
        let registry = build_registry(
            Arc::clone(&handle),
            Arc::clone(&probe),
            &config.bot.response_prefix,
        );
        debug!("Registered commands: {:?}", registry.catalog());

        let dispatcher = InboundDispatcher::new(
            handle,
            Arc::new(registry),
            config.bot.prefix.clone(),
            config.bot.response_prefix.clone(),
            probe,
        );

        Ok(Self {
            config,
            session,
            inbound: Some(inbound),
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn config(&self) -> &HermitConfig {
        &self.config
    }

    /// Connect and start the heartbeat
    pub async fn start(&self) -> Result<()> {
        self.session
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {}", self.config.websocket.url))?;

        info!("Loading events");
        self.session.start_heartbeat();
        Ok(())
    }

    /// Start, dispatch inbound frames until shutdown, then close the session
    pub async fn run(&mut self, shutdown: &ShutdownManager) -> Result<()> {
        let inbound = self
            .inbound
            .take()
            .context("Bot is already running")?;

        self.start().await?;

        let dispatch_task = {
            let dispatcher = Arc::clone(&self.dispatcher);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                dispatcher
                    .run(inbound, async move { shutdown.wait().await })
                    .await;
            })
        };

        let events_task = {
            let session = self.session.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { log_events(session, shutdown).await })
        };

        shutdown.wait().await;

        info!("Stopping bot");
        if let Err(e) = self.session.close().await {
            warn!("Error closing session: {}", e);
        }
        if let Err(e) = dispatch_task.await {
            error!("Dispatcher task failed: {}", e);
        }
        if let Err(e) = events_task.await {
            error!("Event logger task failed: {}", e);
        }

        let metrics = self.session.metrics();
        info!(
            "Session stats: sent={}, received={}, dropped={}, reconnects={}",
            metrics.messages_sent,
            metrics.messages_received,
            metrics.frames_dropped,
            metrics.reconnect_count
        );
        Ok(())
    }
}

/// Log session events until shutdown
async fn log_events(session: ConnectionSession, shutdown: ShutdownManager) {
    let mut ticker = tokio::time::interval(EVENT_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }
        while let Some(event) = session.try_recv_event() {
            log_event(&event);
        }
    }

    // Drain whatever close() published
    while let Some(event) = session.try_recv_event() {
        log_event(&event);
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Latency(elapsed) => debug!("Latency probe answered in {:?}", elapsed),
        SessionEvent::Reconnecting(attempt) => debug!("Reconnect attempt {}", attempt),
        SessionEvent::ReconnectExhausted { attempts } => {
            error!("Gave up reconnecting after {} attempts", attempts)
        }
        SessionEvent::FrameDropped => debug!("Inbound frame dropped"),
        other => debug!("Session event: {:?}", other),
    }
}
