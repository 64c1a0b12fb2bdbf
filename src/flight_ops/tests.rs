use super::{AuthError, AuthSession, DirectoryError, FlightDirectory};
use crate::http_handler::{
    common::{AuthToken, Flight},
    http_client::HTTPClient,
    http_response::response_common::ResponseError,
};
use crate::test_fixtures::{Canned, HttpFixture};
use std::sync::Arc;
use std::time::Duration;

const LOGIN_OK: &str = r#"{"data":{"authToken":"tok-1"}}"#;

#[tokio::test]
async fn test_login_returns_token() {
    let backend = HttpFixture::serve(vec![("/auth/login", vec![Canned::json(200, LOGIN_OK)])]).await;
    let session = AuthSession::login(&backend.client(), "u", "p").await.unwrap();
    assert_eq!(session.token(), &AuthToken::new("tok-1"));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /auth/login "));
    let body = requests[0].split("\r\n\r\n").nth(1).unwrap();
    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(body, serde_json::json!({"username": "u", "password": "p"}));
}

#[tokio::test]
async fn test_login_rejected() {
    let backend =
        HttpFixture::serve(vec![("/auth/login", vec![Canned::json(401, r#"{"error":"bad credentials"}"#)])]).await;
    let result = AuthSession::login(&backend.client(), "u", "wrong").await;
    assert_eq!(result.unwrap_err(), AuthError::Request(ResponseError::BadRequest(401)));
}

#[tokio::test]
async fn test_login_without_token() {
    for body in [r#"{"data":{}}"#, r#"{"data":{"authToken":""}}"#, r"{}"] {
        let backend = HttpFixture::serve(vec![("/auth/login", vec![Canned::json(200, body)])]).await;
        let result = AuthSession::login(&backend.client(), "u", "p").await;
        assert_eq!(result.unwrap_err(), AuthError::MissingToken, "{body}");
    }
}

#[tokio::test]
async fn test_login_server_error() {
    let backend = HttpFixture::serve(vec![("/auth/login", vec![Canned::json(502, "{}")])]).await;
    let result = AuthSession::login(&backend.client(), "u", "p").await;
    assert_eq!(result.unwrap_err(), AuthError::Request(ResponseError::InternalServer(502)));
}

#[tokio::test]
async fn test_login_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HTTPClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let result = AuthSession::login(&client, "u", "p").await;
    assert_eq!(result.unwrap_err(), AuthError::Request(ResponseError::NoConnection));
}

#[tokio::test]
async fn test_live_flights() {
    let backend = HttpFixture::serve(vec![(
        "/api/v1.0/flight/query",
        vec![Canned::json(200, r#"{"data":[{"flightId":"F1","id":"I1"},{"flightId":"F2","id":"I2"}]}"#)],
    )])
    .await;
    let directory = FlightDirectory::new(Arc::new(backend.client()));
    let flights = directory.list_live_flights(&AuthToken::new("tok-1")).await.unwrap();
    assert_eq!(flights, vec![Flight::new("F1", "I1"), Flight::new("F2", "I2")]);

    let request_line = backend.requests()[0].lines().next().unwrap().to_string();
    assert!(request_line.starts_with("GET /api/v1.0/flight/query?"));
    assert!(request_line.contains("auth_token=tok-1"));
    assert!(request_line.contains("live=true"));
}

#[tokio::test]
async fn test_no_live_flights() {
    let backend =
        HttpFixture::serve(vec![("/api/v1.0/flight/query", vec![Canned::json(200, r#"{"data":[]}"#)])]).await;
    let directory = FlightDirectory::new(Arc::new(backend.client()));
    let flights = directory.list_live_flights(&AuthToken::new("tok-1")).await.unwrap();
    assert!(flights.is_empty());
}

#[tokio::test]
async fn test_malformed_flight_list() {
    let cases = [
        (r#"{"flights":[]}"#, DirectoryError::MissingData),
        (r#"{"data":[{"id":"I1"}]}"#, DirectoryError::Request(ResponseError::MalformedBody)),
        ("not json", DirectoryError::Request(ResponseError::MalformedBody)),
    ];
    for (body, expected) in cases {
        let backend =
            HttpFixture::serve(vec![("/api/v1.0/flight/query", vec![Canned::json(200, body)])]).await;
        let directory = FlightDirectory::new(Arc::new(backend.client()));
        let result = directory.list_live_flights(&AuthToken::new("tok-1")).await;
        assert_eq!(result.unwrap_err(), expected, "{body}");
    }
}

#[tokio::test]
async fn test_directory_rejects_unknown_token() {
    let backend = HttpFixture::serve(vec![("/api/v1.0/flight/query", vec![Canned::json(403, "{}")])]).await;
    let directory = FlightDirectory::new(Arc::new(backend.client()));
    let result = directory.list_live_flights(&AuthToken::new("stale")).await;
    assert_eq!(result.unwrap_err(), DirectoryError::Request(ResponseError::BadRequest(403)));
}
