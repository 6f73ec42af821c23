//! tokio-tungstenite transport

use crate::error::{Result, WireError};
use crate::transport::{Connector, TransportPair, TransportSink, TransportStream, WsMessage};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects with `tokio_tungstenite::connect_async`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str, handshake_timeout: Duration) -> Result<TransportPair> {
        let request = url
            .into_client_request()
            .map_err(|e| WireError::Handshake(format!("invalid endpoint {}: {}", url, e)))?;

        let (ws_stream, response) = tokio::time::timeout(handshake_timeout, connect_async(request))
            .await
            .map_err(|_| {
                WireError::Handshake(format!("handshake timed out after {:?}", handshake_timeout))
            })?
            .map_err(|e| WireError::Handshake(format!("failed to establish connection: {}", e)))?;

        debug!(status = %response.status(), "Handshake complete with {}", url);

        let (write, read) = ws_stream.split();
        Ok(TransportPair::new(
            Box::new(TungsteniteSink { inner: write }),
            Box::new(TungsteniteStream { inner: read }),
        ))
    }
}

struct TungsteniteSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSink for TungsteniteSink {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        self.inner
            .send(ws_message_to_tungstenite(message))
            .await
            .map_err(map_tungstenite_error)
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await.map_err(map_tungstenite_error)
    }
}

struct TungsteniteStream {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl TransportStream for TungsteniteStream {
    async fn next(&mut self) -> Option<Result<WsMessage>> {
        self.inner
            .next()
            .await
            .map(|r| r.map(tungstenite_to_ws_message).map_err(map_tungstenite_error))
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
        WsMessage::Ping(data) => Message::Ping(data),
        WsMessage::Pong(data) => Message::Pong(data),
        WsMessage::Close(frame) => Message::Close(frame.map(|(code, reason)| CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        })),
    }
}

/// Convert tungstenite Message to WsMessage
fn tungstenite_to_ws_message(msg: Message) -> WsMessage {
    match msg {
        Message::Text(text) => WsMessage::Text(text),
        Message::Binary(data) => WsMessage::Binary(data),
        Message::Ping(data) => WsMessage::Ping(data),
        Message::Pong(data) => WsMessage::Pong(data),
        Message::Close(frame) => {
            WsMessage::Close(frame.map(|f| (u16::from(f.code), f.reason.into_owned())))
        }
        Message::Frame(frame) => WsMessage::Binary(frame.into_data()),
    }
}

fn map_tungstenite_error(err: tungstenite::Error) -> WireError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            WireError::ConnectionClosed(err.to_string())
        }
        other => WireError::Transport(other.to_string()),
    }
}
