use std::time::Duration;
use strum_macros::{Display, EnumString};

/// Lifecycle of a telemetry link.
///
/// The declaration order is the only order in which a link may move:
/// `Connecting -> HandshakePending -> Ready`, with `Closed` reachable from
/// every state and final.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkState {
    /// The transport is being opened.
    Connecting,
    /// The handshake was sent, the relay has not acknowledged it yet.
    HandshakePending,
    /// Command traffic is permitted.
    Ready,
    Closed,
}

impl LinkState {
    /// Whether a link in this state may move to `next`.
    pub fn may_advance_to(self, next: LinkState) -> bool { next > self }
}

/// When a link considers its handshake complete.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, EnumString)]
pub enum HandshakePolicy {
    /// Only an explicit success acknowledgment from the relay.
    #[default]
    #[strum(serialize = "explicit")]
    ExplicitSuccess,
    /// Any inbound message after the handshake.
    #[strum(serialize = "first-message")]
    FirstMessage,
}

/// Settings shared by every link of a session.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// WebSocket URL of the telemetry relay.
    pub relay_url: String,
    /// Opaque client identifier sent as `localIPAddress` in the handshake.
    pub client_id: String,
    /// Upper bound for opening the transport.
    pub connect_timeout: Duration,
    /// Upper bound for reaching `Ready` once the handshake is sent.
    pub handshake_timeout: Option<Duration>,
    pub handshake_policy: HandshakePolicy,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The handshake has not completed yet.
    NotReady,
    /// The link is closed; no further traffic is possible.
    LinkClosed,
    /// Opening or writing to the transport failed.
    TransportFailure(String),
}

impl std::error::Error for LinkError {}
impl From<tokio_tungstenite::tungstenite::Error> for LinkError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        LinkError::TransportFailure(value.to_string())
    }
}
