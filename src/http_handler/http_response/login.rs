use crate::http_handler::http_response::response_common::SerdeJSONBodyHTTPResponseType;

/// Response type for the /auth/login endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct LoginResponse {
    data: Option<LoginData>,
}

#[derive(serde::Deserialize, Debug)]
struct LoginData {
    #[serde(rename = "authToken")]
    auth_token: Option<String>,
}

impl SerdeJSONBodyHTTPResponseType for LoginResponse {}

impl LoginResponse {
    /// The issued token, if the response carried a non-empty one.
    pub(crate) fn into_auth_token(self) -> Option<String> {
        self.data.and_then(|d| d.auth_token).filter(|t| !t.is_empty())
    }
}
