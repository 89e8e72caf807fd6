//! Wire frames exchanged over the chat socket.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Room identifier. The service sends numbers, but string ids are echoed back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomId {
    Number(i64),
    Name(String),
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomId::Number(id) => write!(f, "{id}"),
            RoomId::Name(name) => write!(f, "{name}"),
        }
    }
}

/// A user entry inside presence payloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub name: Option<String>,
}

/// Chat text payload of `message` / `messageEnd` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
}

/// Payload of a `files` frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesPayload {
    /// Author of the upload.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileRecord {
    /// Stored file name under `/storage/files/`.
    #[serde(default)]
    pub name: Option<String>,
    /// Extension including the leading dot, e.g. `.png`.
    #[serde(default)]
    pub extension: Option<String>,
}

/// Inbound socket frame, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "loadUsers")]
    LoadUsers {
        #[serde(default)]
        data: HashMap<String, Vec<UserRecord>>,
    },
    #[serde(rename = "enter")]
    Enter {
        #[serde(default)]
        data: UserRecord,
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
    },
    #[serde(rename = "exit")]
    Exit {
        #[serde(default)]
        data: UserRecord,
        #[serde(rename = "roomId", default)]
        room_id: Option<RoomId>,
    },
    #[serde(rename = "files")]
    Files {
        #[serde(default)]
        data: Option<FilesPayload>,
    },
    #[serde(rename = "message")]
    Message {
        data: ChatMessage,
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    #[serde(rename = "messageEnd")]
    MessageEnd {
        data: ChatMessage,
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Parse a text frame. Malformed payloads yield `None` and are dropped by the caller.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(frame) => Some(frame),
            Err(error) => {
                tracing::debug!(%error, "dropping malformed frame");
                None
            }
        }
    }

    /// Chat text and its room, for `message` and `messageEnd` frames.
    pub fn chat(&self) -> Option<(&ChatMessage, &RoomId)> {
        match self {
            InboundFrame::Message { data, room_id } | InboundFrame::MessageEnd { data, room_id } => {
                Some((data, room_id))
            }
            _ => None,
        }
    }
}

/// Outbound chat message frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    pub data: String,
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
}

impl OutboundFrame {
    pub fn message(text: impl Into<String>, room_id: RoomId) -> Self {
        Self {
            kind: "message",
            data: text.into(),
            room_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
