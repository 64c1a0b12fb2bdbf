use crate::http_handler::{
    common::AuthToken,
    http_client::HTTPClient,
    http_request::{login_post::LoginRequest, request_common::JSONBodyHTTPRequestType},
    http_response::response_common::{ResponseError, Transient},
};
use crate::info;
use strum_macros::Display;

/// An authenticated session with the flight operations backend.
///
/// Holds the bearer token issued by the login endpoint. The token is never
/// refreshed; it is assumed valid for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: AuthToken,
}

impl AuthSession {
    /// Logs in with the given credentials.
    ///
    /// # Errors
    /// `AuthError::Request` if the exchange fails or the backend rejects the
    /// credentials, `AuthError::MissingToken` if the response carries no token.
    pub async fn login(client: &HTTPClient, username: &str, password: &str) -> Result<Self, AuthError> {
        let request = LoginRequest { username: username.to_string(), password: password.to_string() };
        let response = request.send_request(client).await?;
        let token = response.into_auth_token().ok_or(AuthError::MissingToken)?;
        info!("Logged in to {} as {username}.", client.url());
        Ok(Self { token: AuthToken::new(token) })
    }

    pub fn token(&self) -> &AuthToken { &self.token }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum AuthError {
    Request(ResponseError),
    MissingToken,
}

impl Transient for AuthError {
    fn is_transient(&self) -> bool {
        match self {
            AuthError::Request(e) => e.is_transient(),
            AuthError::MissingToken => false,
        }
    }
}

impl std::error::Error for AuthError {}
impl From<ResponseError> for AuthError {
    fn from(value: ResponseError) -> Self { AuthError::Request(value) }
}
