use strum_macros::Display;

pub(crate) trait JSONBodyHTTPResponseType: HTTPResponseType {
    async fn parse_json_body(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>
    where Self::ParsedResponseType: for<'de> serde::Deserialize<'de> {
        Ok(response.json::<Self::ParsedResponseType>().await?)
    }
}

pub(crate) trait SerdeJSONBodyHTTPResponseType {}

impl<T> JSONBodyHTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
}

impl<T> HTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
    type ParsedResponseType = T;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let resp = Self::unwrap_return_code(response)?;
        Self::parse_json_body(resp).await
    }
}

pub(crate) trait HTTPResponseType {
    type ParsedResponseType;
    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>;

    fn unwrap_return_code(response: reqwest::Response) -> Result<reqwest::Response, ResponseError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_server_error() {
            Err(ResponseError::InternalServer(status.as_u16()))
        } else if status.is_client_error() {
            Err(ResponseError::BadRequest(status.as_u16()))
        } else {
            Err(ResponseError::Unknown)
        }
    }
}

/// Failure classes of a single REST exchange with the backend.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// 5xx status code.
    InternalServer(u16),
    /// 4xx status code, e.g. rejected credentials or an unknown token.
    BadRequest(u16),
    NoConnection,
    Timeout,
    /// The body was not the JSON shape the endpoint documents.
    MalformedBody,
    Unknown,
}

/// Errors that may clear up when the same request is repeated.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for ResponseError {
    fn is_transient(&self) -> bool {
        matches!(self, ResponseError::InternalServer(_) | ResponseError::NoConnection | ResponseError::Timeout)
    }
}

impl std::error::Error for ResponseError {}
impl From<reqwest::Error> for ResponseError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ResponseError::Timeout
        } else if value.is_connect() {
            ResponseError::NoConnection
        } else if value.is_decode() {
            ResponseError::MalformedBody
        } else if let Some(status) = value.status() {
            if status.is_server_error() {
                ResponseError::InternalServer(status.as_u16())
            } else {
                ResponseError::BadRequest(status.as_u16())
            }
        } else {
            ResponseError::Unknown
        }
    }
}
