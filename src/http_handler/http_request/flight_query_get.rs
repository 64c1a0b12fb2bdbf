use super::flight_query::FlightQueryResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};
use crate::http_handler::common::AuthToken;

/// Request type for the flight query endpoint, restricted to live flights.
#[derive(Debug)]
pub(crate) struct FlightQueryRequest {
    pub(crate) auth_token: AuthToken,
}

impl NoBodyHTTPRequestType for FlightQueryRequest {}

impl HTTPRequestType for FlightQueryRequest {
    type Response = FlightQueryResponse;
    fn endpoint(&self) -> &'static str { "/api/v1.0/flight/query" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("auth_token", self.auth_token.as_str().to_string()),
            ("live", String::from("true")),
        ]
    }
}
