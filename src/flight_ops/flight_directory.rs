use crate::http_handler::{
    common::{AuthToken, Flight},
    http_client::HTTPClient,
    http_request::{flight_query_get::FlightQueryRequest, request_common::NoBodyHTTPRequestType},
    http_response::response_common::{ResponseError, Transient},
};
use crate::log;
use std::sync::Arc;
use strum_macros::Display;

/// Lists the flights the backend currently reports as live.
///
/// Filtering happens server-side through the `live=true` query parameter.
/// Every call is a fresh snapshot; nothing is cached.
#[derive(Debug, Clone)]
pub struct FlightDirectory {
    client: Arc<HTTPClient>,
}

impl FlightDirectory {
    pub fn new(client: Arc<HTTPClient>) -> Self { Self { client } }

    /// Fetches the live flights. An empty list means no flight is live.
    ///
    /// # Errors
    /// `DirectoryError::Request` on transport or status failures,
    /// `DirectoryError::MissingData` if the body lacks the flight list.
    pub async fn list_live_flights(&self, token: &AuthToken) -> Result<Vec<Flight>, DirectoryError> {
        let request = FlightQueryRequest { auth_token: token.clone() };
        let flights = request
            .send_request(&self.client)
            .await?
            .into_flights()
            .ok_or(DirectoryError::MissingData)?;
        log!("Flight directory reports {} live flight(s).", flights.len());
        Ok(flights)
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    Request(ResponseError),
    MissingData,
}

impl Transient for DirectoryError {
    fn is_transient(&self) -> bool {
        match self {
            DirectoryError::Request(e) => e.is_transient(),
            DirectoryError::MissingData => false,
        }
    }
}

impl std::error::Error for DirectoryError {}
impl From<ResponseError> for DirectoryError {
    fn from(value: ResponseError) -> Self { DirectoryError::Request(value) }
}
