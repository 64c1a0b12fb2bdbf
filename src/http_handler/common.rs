use std::fmt;
use std::sync::Arc;

/// Bearer token handed out by the login endpoint.
///
/// The token is immutable once issued and cheap to clone, so the flight
/// directory and every telemetry link can hold their own handle to it.
/// `Debug` output never contains the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Arc<str>);

impl AuthToken {
    pub fn new(raw: impl Into<Arc<str>>) -> Self { Self(raw.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AuthToken(***)") }
}

/// A live flight as reported by the flight query endpoint.
///
/// The backend addresses a flight by two identifiers: `flightId` is used for
/// the telemetry handshake, `id` is used inside command payloads.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    #[serde(rename = "flightId")]
    flight_id: String,
    id: String,
}

impl Flight {
    pub fn new(flight_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self { flight_id: flight_id.into(), id: id.into() }
    }
    pub fn flight_id(&self) -> &str { &self.flight_id }
    pub fn id(&self) -> &str { &self.id }
}
