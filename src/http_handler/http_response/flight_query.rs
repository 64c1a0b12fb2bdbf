use crate::http_handler::common::Flight;
use crate::http_handler::http_response::response_common::SerdeJSONBodyHTTPResponseType;

/// Response type for the flight query endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct FlightQueryResponse {
    data: Option<Vec<Flight>>,
}

impl SerdeJSONBodyHTTPResponseType for FlightQueryResponse {}

impl FlightQueryResponse {
    pub(crate) fn into_flights(self) -> Option<Vec<Flight>> { self.data }
}
