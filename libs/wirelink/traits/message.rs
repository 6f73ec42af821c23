//! Wire format
//!
//! Outbound frames are `{"action": "...", "data": {...}}` with `data`
//! omitted when there is no payload. Inbound frames are flat objects; the
//! presence of `connectionId` marks an identity frame, anything else is chat.

use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action requesting this connection's identity
pub const ACTION_GET_ID: &str = "getId";
/// Action carrying a chat message
pub const ACTION_SEND_MESSAGE: &str = "sendMessage";

/// An outbound request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    action: String,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl OutboundMessage {
    pub fn new(action: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            action: action.into(),
            payload,
        }
    }

    /// `{"action":"getId"}`
    pub fn get_id() -> Self {
        Self::new(ACTION_GET_ID, None)
    }

    /// `{"action":"sendMessage","data":{"message":text}}`
    pub fn send_message(text: impl Into<String>) -> Self {
        Self::new(
            ACTION_SEND_MESSAGE,
            Some(serde_json::json!({ "message": text.into() })),
        )
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Rate-limit route for this message
    pub fn route(&self) -> &str {
        &self.action
    }

    /// Serialize to the JSON text sent on the wire
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(WireError::from)
    }

    /// Text of a `sendMessage` payload, if any
    pub fn message_text(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
    }
}

/// Identity assigned to this connection by the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub connection_id: String,
    pub display_name: String,
}

/// A chat payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFrame {
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Identity(Identity),
    Chat(ChatFrame),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    #[serde(default)]
    connection_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    sender_name: Option<String>,
}

impl InboundFrame {
    /// Decode a JSON text frame
    pub fn decode(text: &str) -> Result<Self> {
        let raw: RawFrame = serde_json::from_str(text)?;
        Ok(match raw.connection_id.filter(|id| !id.is_empty()) {
            Some(connection_id) => InboundFrame::Identity(Identity {
                connection_id,
                display_name: raw.name.unwrap_or_default(),
            }),
            None => InboundFrame::Chat(ChatFrame {
                sender_id: raw.sender.unwrap_or_default(),
                sender_name: raw.sender_name.unwrap_or_default(),
                text: raw.message.unwrap_or_default(),
            }),
        })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, InboundFrame::Identity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_id_omits_data() {
        assert_eq!(
            OutboundMessage::get_id().encode().unwrap(),
            r#"{"action":"getId"}"#
        );
    }

    #[test]
    fn test_send_message_shape() {
        let msg = OutboundMessage::send_message("hello world");
        let value: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(value["action"], "sendMessage");
        assert_eq!(value["data"]["message"], "hello world");
        assert_eq!(msg.message_text(), Some("hello world"));
        assert_eq!(msg.route(), ACTION_SEND_MESSAGE);
    }

    #[test]
    fn test_decode_identity() {
        let frame = InboundFrame::decode(r#"{"connectionId":"abc","name":"Hermit"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Identity(Identity {
                connection_id: "abc".into(),
                display_name: "Hermit".into(),
            })
        );
    }

    #[test]
    fn test_decode_chat() {
        let frame = InboundFrame::decode(
            r#"{"message":"$echo hi","sender":"u1","senderName":"Alice"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            InboundFrame::Chat(ChatFrame {
                sender_id: "u1".into(),
                sender_name: "Alice".into(),
                text: "$echo hi".into(),
            })
        );
    }

    #[test]
    fn test_empty_connection_id_is_chat() {
        let frame = InboundFrame::decode(r#"{"connectionId":"","message":"x"}"#).unwrap();
        assert!(!frame.is_identity());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(InboundFrame::decode("not json").is_err());
    }
}
