//! Control tokens exchanged as frame payloads.

/// Handshake role token for producers.
pub const PUB: &[u8] = b"pub";
/// Handshake role token for consumers.
pub const SUB: &[u8] = b"sub";
/// Success acknowledgment, sent by either side.
pub const OK: &[u8] = b"ok";
/// Failure acknowledgment sent by the broker.
pub const FAILED: &[u8] = b"failed";
/// Sent by a subscriber once it is ready for its first message.
pub const PREPARED: &[u8] = b"prepared";

/// What a connection declared itself to be in the first handshake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl Role {
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            PUB => Some(Self::Producer),
            SUB => Some(Self::Consumer),
            _ => None,
        }
    }

    pub fn token(self) -> &'static [u8] {
        match self {
            Self::Producer => PUB,
            Self::Consumer => SUB,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Producer => "pub",
            Self::Consumer => "sub",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
