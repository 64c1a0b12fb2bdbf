//! Wire format of the telemetry relay.
//!
//! Every frame is a JSON text message. The client writes one handshake frame
//! followed by command frames of the shape
//! `{"command": <tag>, "flight_id": <id>, "value"?: {latitude, longitude, altitude}}`.
//! The relay's own vocabulary is open-ended: apart from the handshake
//! acknowledgment and echoed commands, inbound frames are passed on as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

/// Word the relay uses to acknowledge a handshake.
const ACK_WORD: &str = "success";
/// Object fields that may carry the acknowledgment word.
const ACK_FIELDS: [&str; 4] = ["status", "message", "type", "result"];

/// A geographic point a flight should loiter around or look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self { Self { latitude, longitude, altitude } }
}

/// The wire tag of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum CommandTag {
    #[strum(serialize = "ADDLOOKHERE")]
    #[serde(rename = "ADDLOOKHERE")]
    AddLook,
    #[strum(serialize = "ADDLOITERHERE")]
    #[serde(rename = "ADDLOITERHERE")]
    AddLoiter,
    #[strum(serialize = "REMOVELOOKHERE")]
    #[serde(rename = "REMOVELOOKHERE")]
    RemoveLook,
    #[strum(serialize = "REMOVELOITERHERE")]
    #[serde(rename = "REMOVELOITERHERE")]
    RemoveLoiter,
}

impl CommandTag {
    pub fn is_add(self) -> bool { matches!(self, CommandTag::AddLook | CommandTag::AddLoiter) }
}

/// What a command asks the flight to do. Add actions carry their target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandAction {
    AddLook(GeoPoint),
    AddLoiter(GeoPoint),
    RemoveLook,
    RemoveLoiter,
}

impl CommandAction {
    /// Builds an action from its tag. Add tags require a point, remove tags
    /// ignore it.
    ///
    /// # Errors
    /// `CodecError::MissingValue` for an add tag without a point.
    pub fn from_tag(tag: CommandTag, point: Option<GeoPoint>) -> Result<Self, CodecError> {
        match (tag, point) {
            (CommandTag::AddLook, Some(p)) => Ok(CommandAction::AddLook(p)),
            (CommandTag::AddLoiter, Some(p)) => Ok(CommandAction::AddLoiter(p)),
            (CommandTag::RemoveLook, _) => Ok(CommandAction::RemoveLook),
            (CommandTag::RemoveLoiter, _) => Ok(CommandAction::RemoveLoiter),
            (CommandTag::AddLook | CommandTag::AddLoiter, None) => Err(CodecError::MissingValue),
        }
    }

    pub fn tag(&self) -> CommandTag {
        match self {
            CommandAction::AddLook(_) => CommandTag::AddLook,
            CommandAction::AddLoiter(_) => CommandTag::AddLoiter,
            CommandAction::RemoveLook => CommandTag::RemoveLook,
            CommandAction::RemoveLoiter => CommandTag::RemoveLoiter,
        }
    }

    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            CommandAction::AddLook(p) | CommandAction::AddLoiter(p) => Some(*p),
            CommandAction::RemoveLook | CommandAction::RemoveLoiter => None,
        }
    }

    /// The action that withdraws this one, `None` for remove actions.
    pub fn revocation(&self) -> Option<CommandAction> {
        match self {
            CommandAction::AddLook(_) => Some(CommandAction::RemoveLook),
            CommandAction::AddLoiter(_) => Some(CommandAction::RemoveLoiter),
            CommandAction::RemoveLook | CommandAction::RemoveLoiter => None,
        }
    }
}

/// A command addressed to one flight. Commands are plain values: the relay
/// neither acknowledges nor correlates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    flight_id: String,
    action: CommandAction,
}

impl Command {
    pub fn new(flight_id: impl Into<String>, action: CommandAction) -> Self {
        Self { flight_id: flight_id.into(), action }
    }
    pub fn add_look(flight_id: impl Into<String>, point: GeoPoint) -> Self {
        Self::new(flight_id, CommandAction::AddLook(point))
    }
    pub fn add_loiter(flight_id: impl Into<String>, point: GeoPoint) -> Self {
        Self::new(flight_id, CommandAction::AddLoiter(point))
    }
    pub fn remove_look(flight_id: impl Into<String>) -> Self { Self::new(flight_id, CommandAction::RemoveLook) }
    pub fn remove_loiter(flight_id: impl Into<String>) -> Self {
        Self::new(flight_id, CommandAction::RemoveLoiter)
    }

    pub fn flight_id(&self) -> &str { &self.flight_id }
    pub fn action(&self) -> &CommandAction { &self.action }
    pub fn tag(&self) -> CommandTag { self.action.tag() }

    /// The command that withdraws this one on the same flight.
    pub fn revocation(&self) -> Option<Command> {
        self.action.revocation().map(|action| Command::new(self.flight_id.clone(), action))
    }
}

/// An inbound relay message.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// The relay accepted the handshake.
    HandshakeAck,
    /// The relay echoed a command.
    Echo(Command),
    /// Any other well-formed JSON message.
    Unrecognized(Value),
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload is not UTF-8 JSON.
    Malformed(String),
    /// Serialization of an outbound frame failed.
    Encode(String),
    /// An add command without a target point.
    MissingValue,
}

impl std::error::Error for CodecError {}

#[derive(Serialize)]
struct HandshakeFrame<'a> {
    flight_id: &'a str,
    auth_token: &'a str,
    #[serde(rename = "localIPAddress")]
    local_ip_address: &'a str,
}

#[derive(Serialize)]
struct CommandFrameOut<'a> {
    command: CommandTag,
    flight_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<GeoPoint>,
}

#[derive(Deserialize)]
struct CommandFrameIn {
    command: CommandTag,
    flight_id: String,
    #[serde(default)]
    value: Option<GeoPoint>,
}

/// Serializes the first frame of a telemetry session.
///
/// # Errors
/// `CodecError::Encode` if serialization fails.
pub fn encode_handshake(flight_id: &str, auth_token: &str, client_id: &str) -> Result<String, CodecError> {
    let frame = HandshakeFrame { flight_id, auth_token, local_ip_address: client_id };
    serde_json::to_string(&frame).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Serializes a command into its relay frame.
///
/// # Errors
/// `CodecError::Encode` if serialization fails.
pub fn encode(command: &Command) -> Result<String, CodecError> {
    let frame = CommandFrameOut {
        command: command.tag(),
        flight_id: command.flight_id(),
        value: command.action().point(),
    };
    serde_json::to_string(&frame).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Interprets an inbound relay payload.
///
/// # Errors
/// `CodecError::Malformed` if the payload is neither JSON nor the bare
/// acknowledgment word.
pub fn decode(payload: &[u8]) -> Result<RelayEvent, CodecError> {
    let text = std::str::from_utf8(payload).map_err(|e| CodecError::Malformed(e.to_string()))?;
    if text.trim().eq_ignore_ascii_case(ACK_WORD) {
        return Ok(RelayEvent::HandshakeAck);
    }
    let value: Value = serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))?;
    if is_ack(&value) {
        return Ok(RelayEvent::HandshakeAck);
    }
    if let Some(command) = as_echo(&value) {
        return Ok(RelayEvent::Echo(command));
    }
    Ok(RelayEvent::Unrecognized(value))
}

fn is_ack(value: &Value) -> bool {
    let is_ack_word = |v: &Value| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(ACK_WORD));
    match value {
        Value::String(_) => is_ack_word(value),
        Value::Object(map) => {
            map.get(ACK_WORD).and_then(Value::as_bool) == Some(true)
                || ACK_FIELDS.iter().any(|field| map.get(*field).is_some_and(is_ack_word))
        }
        _ => false,
    }
}

fn as_echo(value: &Value) -> Option<Command> {
    value.get("command")?;
    let frame: CommandFrameIn = serde_json::from_value(value.clone()).ok()?;
    let action = CommandAction::from_tag(frame.command, frame.value).ok()?;
    Some(Command::new(frame.flight_id, action))
}
