//! Loopback stand-ins for the flight operations backend and the telemetry relay.

use crate::http_handler::http_client::HTTPClient;
use crate::telemetry::{HandshakePolicy, LinkConfig};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const FRAME_WAIT: Duration = Duration::from_secs(5);

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub(crate) struct Canned {
    status: u16,
    body: String,
}

impl Canned {
    pub(crate) fn json(status: u16, body: &str) -> Self { Self { status, body: body.to_string() } }
}

/// A minimal HTTP/1.1 responder. Every route answers with its canned
/// responses in order; the last one repeats once the others are used up.
pub(crate) struct HttpFixture {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HttpFixture {
    pub(crate) async fn serve(routes: Vec<(&'static str, Vec<Canned>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes: Arc<Mutex<HashMap<&'static str, Vec<Canned>>>> =
            Arc::new(Mutex::new(routes.into_iter().collect()));
        let requests_local = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes_local = Arc::clone(&routes);
                let requests_conn = Arc::clone(&requests_local);
                tokio::spawn(async move {
                    let _ = Self::answer(socket, &routes_local, &requests_conn).await;
                });
            }
        });
        Self { addr, requests }
    }

    async fn answer(
        mut socket: TcpStream,
        routes: &Mutex<HashMap<&'static str, Vec<Canned>>>,
        requests: &Mutex<Vec<String>>,
    ) -> Result<(), std::io::Error> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buffer.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
        }
        let request = String::from_utf8_lossy(&buffer).to_string();
        let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
        let path = target.split('?').next().unwrap_or("/").to_string();
        requests.lock().unwrap().push(request);

        let canned = {
            let mut routes = routes.lock().unwrap();
            match routes.get_mut(path.as_str()) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if queue.len() == 1 => queue[0].clone(),
                _ => Canned::json(404, "{}"),
            }
        };
        let reply = format!(
            "HTTP/1.1 {} Fixture\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            canned.status,
            canned.body.len(),
            canned.body
        );
        socket.write_all(reply.as_bytes()).await?;
        socket.shutdown().await
    }

    pub(crate) fn base_url(&self) -> String { format!("http://{}", self.addr) }

    pub(crate) fn client(&self) -> HTTPClient {
        HTTPClient::new(&self.base_url(), Duration::from_secs(2)).unwrap()
    }

    /// All raw requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }
}

/// How the relay answers a client's handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckMode {
    /// Reply with a `success` acknowledgment.
    Success,
    /// Reply with an informational message that is not an acknowledgment.
    Informational,
    /// Never reply.
    Silent,
    /// Drop the socket without a closing handshake.
    Drop,
    /// Acknowledge, then stop reading while keeping the socket open.
    Stall,
    /// Acknowledge every flight except the one with this `flight_id`.
    SilentFor(&'static str),
}

/// A WebSocket relay on loopback that records every text frame it receives.
pub(crate) struct RelayFixture {
    addr: SocketAddr,
    frames: mpsc::UnboundedReceiver<String>,
    outbound: broadcast::Sender<String>,
}

impl RelayFixture {
    pub(crate) async fn start(ack: AckMode) -> Self { Self::start_held(ack, None).await }

    /// Like `start`, but the first connection's WebSocket upgrade is held back
    /// until `hold` resolves, keeping that client in its connecting phase.
    pub(crate) async fn start_held(ack: AckMode, hold: Option<oneshot::Receiver<()>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (outbound, _) = broadcast::channel(16);
        let outbound_local = outbound.clone();
        tokio::spawn(async move {
            let mut hold = hold;
            while let Ok((socket, _)) = listener.accept().await {
                let frames_conn = frames_tx.clone();
                let outbound_conn = outbound_local.subscribe();
                let hold_conn = hold.take();
                tokio::spawn(async move {
                    if let Some(h) = hold_conn {
                        let _ = h.await;
                    }
                    Self::serve_connection(socket, ack, frames_conn, outbound_conn).await;
                });
            }
        });
        Self { addr, frames, outbound }
    }

    async fn serve_connection(
        socket: TcpStream,
        ack: AckMode,
        frames: mpsc::UnboundedSender<String>,
        mut outbound: broadcast::Receiver<String>,
    ) {
        let Ok(ws) = accept_async(socket).await else { return };
        let (mut tx, mut rx) = ws.split();
        let Some(Ok(Message::Text(handshake))) = rx.next().await else { return };
        let flight_id = serde_json::from_str::<serde_json::Value>(&handshake)
            .ok()
            .and_then(|h| h["flight_id"].as_str().map(str::to_string));
        let _ = frames.send(handshake);
        match ack {
            AckMode::SilentFor(silent) if flight_id.as_deref() == Some(silent) => {}
            AckMode::Success | AckMode::SilentFor(_) => {
                let _ = tx.send(Message::Text(r#"{"status":"success"}"#.to_string())).await;
            }
            AckMode::Stall => {
                let _ = tx.send(Message::Text(r#"{"status":"success"}"#.to_string())).await;
                std::future::pending::<()>().await;
            }
            AckMode::Informational => {
                let _ = tx.send(Message::Text(r#"{"message":"flight is warming up"}"#.to_string())).await;
            }
            AckMode::Silent => {}
            AckMode::Drop => return,
        }
        loop {
            tokio::select! {
                msg = rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => { let _ = frames.send(text); }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                Ok(out) = outbound.recv() => {
                    if tx.send(Message::Text(out)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    pub(crate) fn url(&self) -> String { format!("ws://{}/telemetry", self.addr) }

    pub(crate) fn link_config(&self) -> Arc<LinkConfig> { Arc::new(self.link_config_owned()) }

    pub(crate) fn link_config_owned(&self) -> LinkConfig {
        LinkConfig {
            relay_url: self.url(),
            client_id: String::from("fixture-client.local"),
            connect_timeout: Duration::from_secs(5),
            handshake_timeout: None,
            handshake_policy: HandshakePolicy::ExplicitSuccess,
        }
    }

    /// Next frame received from any client. Panics after a few seconds.
    pub(crate) async fn next_frame(&mut self) -> String {
        tokio::time::timeout(FRAME_WAIT, self.frames.recv())
            .await
            .expect("relay fixture received no frame")
            .expect("relay fixture stopped")
    }

    /// Next frame parsed as JSON.
    pub(crate) async fn next_json(&mut self) -> serde_json::Value {
        serde_json::from_str(&self.next_frame().await).unwrap()
    }

    /// Whether any frame arrives within `wait`.
    pub(crate) async fn is_quiet_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.frames.recv()).await.is_err()
    }

    /// Pushes a text frame to every connected client.
    pub(crate) fn push(&self, text: &str) { let _ = self.outbound.send(text.to_string()); }
}
