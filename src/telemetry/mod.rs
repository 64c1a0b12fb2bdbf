//! Telemetry relay connections: the per-flight link state machine and the
//! codec for the frames it exchanges with the relay.

pub mod command_codec;
mod link_state;
mod telemetry_link;


pub use command_codec::{CodecError, Command, CommandAction, CommandTag, GeoPoint, RelayEvent};
pub use link_state::{HandshakePolicy, LinkConfig, LinkError, LinkState};
pub use telemetry_link::{LinkEvent, TelemetryLink};
