use serde::{Deserialize, Serialize};

/// Route every node exposes for the single remote operation.
pub const ENDPOINT_MESSAGE: &str = "/internal/message";

/// Opaque, totally-ordered node identifier.
///
/// The ordering is plain lexicographic byte comparison and doubles as the
/// Bully rank: the higher id wins elections. Ids are unique per node and
/// static for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// True when `self` ranks strictly higher than `other`.
    pub fn outranks(&self, other: &NodeId) -> bool {
        self.0 > other.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of protocol message kinds.
///
/// On the wire each kind is its numeric tag (1..=6). Decoding any other tag
/// is a protocol-integrity violation surfaced as
/// [`ProtocolError::UnknownMessageKind`], never a condition to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum MessageKind {
    Ping = 1,
    Pong = 2,
    Election = 3,
    Alive = 4,
    Elected = 5,
    Ok = 6,
}

impl From<MessageKind> for u32 {
    fn from(kind: MessageKind) -> u32 {
        kind as u32
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = ProtocolError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(MessageKind::Ping),
            2 => Ok(MessageKind::Pong),
            3 => Ok(MessageKind::Election),
            4 => Ok(MessageKind::Alive),
            5 => Ok(MessageKind::Elected),
            6 => Ok(MessageKind::Ok),
            other => Err(ProtocolError::UnknownMessageKind(other)),
        }
    }
}

/// One request or reply of the election protocol.
///
/// Every exchange is synchronous: a node sends a `Message` and awaits a
/// `Message` back over the peer's persistent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub from_peer_id: NodeId,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(from_peer_id: NodeId, kind: MessageKind) -> Self {
        Self { from_peer_id, kind }
    }

    pub fn is_pong(&self) -> bool {
        self.kind == MessageKind::Pong
    }

    pub fn is_alive(&self) -> bool {
        self.kind == MessageKind::Alive
    }
}

/// Faults in the wire contract itself, as opposed to unreachable peers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A wire tag outside the closed kind set. Wire-compatibility bug on the
    /// sender, not a runtime condition of this node.
    #[error("unknown message kind tag {0}")]
    UnknownMessageKind(u32),

    /// `Pong`, `Alive` and `Ok` only ever travel as replies.
    #[error("{0:?} is reply-only and not valid as a request")]
    UnexpectedRequest(MessageKind),
}
