use crate::flight_ops::{AuthSession, FlightDirectory};
use crate::http_handler::{
    common::{AuthToken, Flight},
    http_client::HTTPClient,
};
use crate::telemetry::{LinkConfig, TelemetryLink};
use std::sync::Arc;

/// Struct bundling what every flight operation after login needs: the HTTP
/// client, the session token and the relay settings.
///
/// The token is shared read-only; cloning a `Keychain` never copies the
/// underlying client or configuration.
#[derive(Clone, Debug)]
pub struct Keychain {
    /// The HTTP client for the REST endpoints.
    client: Arc<HTTPClient>,
    /// The bearer token of the logged-in session.
    token: AuthToken,
    /// Settings applied to every telemetry link.
    link_config: Arc<LinkConfig>,
}

impl Keychain {
    /// Creates a new `Keychain` for an authenticated session.
    ///
    /// # Arguments
    /// - `client`: The HTTP client the session logged in with.
    /// - `session`: The authenticated session providing the token.
    /// - `link_config`: The relay settings for every link opened from this keychain.
    pub fn new(client: Arc<HTTPClient>, session: &AuthSession, link_config: Arc<LinkConfig>) -> Self {
        Self { client, token: session.token().clone(), link_config }
    }

    /// Provides a cloned reference to the HTTP client.
    pub fn client(&self) -> Arc<HTTPClient> { Arc::clone(&self.client) }

    /// Provides the session token.
    pub fn token(&self) -> &AuthToken { &self.token }

    /// Provides a flight directory backed by this keychain's client.
    pub fn directory(&self) -> FlightDirectory { FlightDirectory::new(self.client()) }

    /// Opens a telemetry link for `flight`, addressed by its `flightId`.
    pub fn open_link(&self, flight: &Flight) -> TelemetryLink {
        TelemetryLink::open(flight.flight_id(), self.token.clone(), Arc::clone(&self.link_config))
    }
}
