use super::login::LoginResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};
use std::fmt;

/// Request type for the /auth/login endpoint.
#[derive(serde::Serialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl JSONBodyHTTPRequestType for LoginRequest {
    type Body = LoginRequest;
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for LoginRequest {
    type Response = LoginResponse;
    fn endpoint(&self) -> &'static str { "/auth/login" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
