use super::command_codec::{self, CodecError, Command, RelayEvent};
use super::link_state::{HandshakePolicy, LinkConfig, LinkError, LinkState};
use crate::http_handler::common::AuthToken;
use crate::{cmd, error, event, info, log, warn};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Notify, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type RelaySink = SplitSink<RelayStream, Message>;
type RelayInbound = SplitStream<RelayStream>;

/// What observers of a link receive: a decoded relay message, or the reason
/// a payload could not be decoded.
pub type LinkEvent = Result<RelayEvent, CodecError>;

/// An encoded command waiting for the link's writer.
struct SendRequest {
    frame: String,
    reply: oneshot::Sender<Result<(), LinkError>>,
}

impl SendRequest {
    fn reject(self, reason: LinkError) { let _ = self.reply.send(Err(reason)); }
}

/// Handle to the telemetry connection of a single flight.
///
/// Each link is driven by its own task, which exclusively owns the socket and
/// is the only writer of the link's state. The handle talks to that task via
/// channels: sends are queued and answered one by one, state is published
/// through a `watch` channel and inbound relay messages are fanned out on a
/// `broadcast` channel. Dropping the handle closes the link.
///
/// Closing never waits on a pending write: the in-flight send and every queued
/// one resolve to `LinkClosed`.
pub struct TelemetryLink {
    flight_id: String,
    state: watch::Receiver<LinkState>,
    requests: mpsc::Sender<SendRequest>,
    close_signal: Arc<Notify>,
    events: broadcast::Sender<LinkEvent>,
    /// Receiver created at open, handed to the first subscriber.
    first_subscriber: Mutex<Option<broadcast::Receiver<LinkEvent>>>,
}

impl TelemetryLink {
    /// Capacity of the outbound command queue.
    const REQUEST_QUEUE: usize = 32;
    /// Relay events buffered per observer before it starts lagging.
    const EVENT_BUFFER: usize = 64;

    /// Opens a link to the relay for `flight_id`. Must be called from within
    /// a tokio runtime. The returned link starts out `Connecting`.
    pub fn open(flight_id: impl Into<String>, token: AuthToken, config: Arc<LinkConfig>) -> Self {
        let flight_id = flight_id.into();
        let (state_tx, state) = watch::channel(LinkState::Connecting);
        let (requests, request_rx) = mpsc::channel(Self::REQUEST_QUEUE);
        let (events, _) = broadcast::channel(Self::EVENT_BUFFER);
        let close_signal = Arc::new(Notify::new());
        let first_subscriber = Mutex::new(Some(events.subscribe()));
        let driver = LinkDriver {
            shared: LinkShared { flight_id: flight_id.clone(), config, state: state_tx, events: events.clone() },
            token,
            requests: request_rx,
            close_signal: Arc::clone(&close_signal),
        };
        log!("Opening telemetry link for flight {flight_id}.");
        tokio::spawn(driver.run());
        Self { flight_id, state, requests, close_signal, events, first_subscriber }
    }

    pub fn flight_id(&self) -> &str { &self.flight_id }

    /// Snapshot of the current state.
    pub fn state(&self) -> LinkState { *self.state.borrow() }

    /// A receiver that observes every state transition of this link.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> { self.state.clone() }

    /// Waits until the handshake completed.
    ///
    /// # Errors
    /// `LinkError::LinkClosed` if the link closed before becoming ready.
    pub async fn ready(&self) -> Result<(), LinkError> {
        let mut state = self.watch_state();
        let reached = state.wait_for(|s| *s >= LinkState::Ready).await.map(|s| *s);
        match reached {
            Ok(LinkState::Ready) => Ok(()),
            _ => Err(LinkError::LinkClosed),
        }
    }

    /// Waits until the link is closed.
    pub async fn closed(&self) {
        let mut state = self.watch_state();
        let _ = state.wait_for(|s| *s == LinkState::Closed).await;
    }

    /// Sends a command to the relay.
    ///
    /// Returns once the transport accepted the frame. Nothing is written
    /// unless the link is `Ready`.
    ///
    /// # Errors
    /// `NotReady` before the handshake completed, `LinkClosed` once the link is
    /// closed, `TransportFailure` if the write failed (which also closes the link).
    pub async fn send_command(&self, command: &Command) -> Result<(), LinkError> {
        Self::admit(self.state())?;
        let frame = command_codec::encode(command).map_err(|e| LinkError::TransportFailure(e.to_string()))?;
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(SendRequest { frame, reply })
            .await
            .map_err(|_| LinkError::LinkClosed)?;
        outcome.await.unwrap_or(Err(LinkError::LinkClosed))
    }

    fn admit(state: LinkState) -> Result<(), LinkError> {
        match state {
            LinkState::Ready => Ok(()),
            LinkState::Closed => Err(LinkError::LinkClosed),
            LinkState::Connecting | LinkState::HandshakePending => Err(LinkError::NotReady),
        }
    }

    /// Tears down the transport and waits until the link is `Closed`.
    /// Calling it on a closed link returns immediately.
    pub async fn close(&self) {
        self.close_signal.notify_one();
        self.closed().await;
    }

    /// A receiver for every relay message arriving while the link is `Ready`.
    ///
    /// The first subscriber also gets the messages that arrived before it
    /// subscribed, up to the per-observer buffer. Later subscribers only see
    /// messages from the moment they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        let early = self.first_subscriber.lock().unwrap_or_else(PoisonError::into_inner).take();
        early.unwrap_or_else(|| self.events.subscribe())
    }

    /// Registers `observer` for every relay message arriving while the link
    /// is `Ready`. The observer runs on its own task until the link closes.
    pub fn on_event<F>(&self, mut observer: F) -> JoinHandle<()>
    where
        F: FnMut(LinkEvent) + Send + 'static,
    {
        let mut events = self.subscribe();
        let mut state = self.watch_state();
        let flight_id = self.flight_id.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    received = events.recv() => match received {
                        Ok(event) => observer(event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!("Observer of flight {flight_id} missed {missed} relay event(s).");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    () = async { let _ = state.wait_for(|s| *s == LinkState::Closed).await; } => {
                        loop {
                            match events.try_recv() {
                                Ok(event) => observer(event),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        })
    }
}

impl fmt::Debug for TelemetryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryLink")
            .field("flight_id", &self.flight_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) { self.close_signal.notify_one(); }
}

/// The task side of a `TelemetryLink`.
struct LinkDriver {
    shared: LinkShared,
    token: AuthToken,
    requests: mpsc::Receiver<SendRequest>,
    close_signal: Arc<Notify>,
}

/// What the reading half of a link needs while the writing half owns the queue.
struct LinkShared {
    flight_id: String,
    config: Arc<LinkConfig>,
    state: watch::Sender<LinkState>,
    events: broadcast::Sender<LinkEvent>,
}

impl LinkDriver {
    /// Upper bound for the closing handshake once the link is torn down.
    const CLOSE_GRACE: Duration = Duration::from_secs(1);

    async fn run(mut self) {
        let outcome = match self.connect().await {
            Ok(Some(stream)) => self.drive(stream).await,
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        self.shut_down(outcome);
    }

    /// Opens the transport. `Ok(None)` means the link was closed by its owner
    /// while connecting.
    async fn connect(&mut self) -> Result<Option<RelayStream>, LinkError> {
        let url = self.shared.config.relay_url.clone();
        let timeout = self.shared.config.connect_timeout;
        let opening = tokio::time::timeout(timeout, connect_async(url.as_str()));
        tokio::pin!(opening);
        loop {
            tokio::select! {
                opened = &mut opening => {
                    return match opened {
                        Ok(Ok((stream, _))) => Ok(Some(stream)),
                        Ok(Err(e)) => Err(e.into()),
                        Err(_) => Err(LinkError::TransportFailure(format!(
                            "relay not reachable within {}ms",
                            timeout.as_millis()
                        ))),
                    };
                }
                () = self.close_signal.notified() => return Ok(None),
                request = self.requests.recv() => match request {
                    Some(request) => request.reject(LinkError::NotReady),
                    None => return Ok(None),
                },
            }
        }
    }

    /// Runs the handshake and then serves sends and inbound messages until
    /// the link ends. `Ok` is an orderly close by either side.
    ///
    /// Writer, reader, close signal and handshake watchdog race each other, so
    /// a write the relay does not drain never holds up a close.
    async fn drive(&mut self, stream: RelayStream) -> Result<(), LinkError> {
        let (mut sink, mut inbound) = stream.split();
        let handshake = command_codec::encode_handshake(
            &self.shared.flight_id,
            self.token.as_str(),
            &self.shared.config.client_id,
        )
        .map_err(|e| LinkError::TransportFailure(e.to_string()))?;
        tokio::select! {
            sent = sink.send(Message::Text(handshake)) => sent?,
            () = self.close_signal.notified() => return Ok(()),
        }
        self.shared.advance(LinkState::HandshakePending);
        log!("Handshake sent for flight {}.", self.shared.flight_id);

        let handshake_deadline = self.shared.config.handshake_timeout.map(|t| Instant::now() + t);
        let outcome = tokio::select! {
            failure = self.shared.handshake_watchdog(handshake_deadline) => Err(failure),
            () = self.close_signal.notified() => Ok(()),
            written = Self::write_requests(&mut self.requests, &mut sink, &self.shared) => written,
            read = self.shared.read_inbound(&mut inbound) => read,
        };
        if outcome.is_ok() && tokio::time::timeout(Self::CLOSE_GRACE, sink.close()).await.is_err() {
            warn!("Relay of flight {} did not complete the closing handshake.", self.shared.flight_id);
        }
        outcome
    }

    /// Writes queued commands until the queue closes or a write fails.
    /// A request dropped mid-write resolves its sender to `LinkClosed`.
    async fn write_requests(
        requests: &mut mpsc::Receiver<SendRequest>,
        sink: &mut RelaySink,
        shared: &LinkShared,
    ) -> Result<(), LinkError> {
        while let Some(SendRequest { frame, reply }) = requests.recv().await {
            if shared.current() != LinkState::Ready {
                let _ = reply.send(Err(LinkError::NotReady));
                continue;
            }
            match sink.send(Message::Text(frame.clone())).await {
                Ok(()) => {
                    cmd!("Flight {} <- {frame}", shared.flight_id);
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let failure = LinkError::from(e);
                    let _ = reply.send(Err(failure.clone()));
                    return Err(failure);
                }
            }
        }
        Ok(())
    }

    fn shut_down(mut self, outcome: Result<(), LinkError>) {
        self.shared.advance(LinkState::Closed);
        match outcome {
            Ok(()) => info!("Telemetry link for flight {} closed.", self.shared.flight_id),
            Err(e) => error!("Telemetry link for flight {} failed: {e:?}", self.shared.flight_id),
        }
        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            request.reject(LinkError::LinkClosed);
        }
    }
}

impl LinkShared {
    fn current(&self) -> LinkState { *self.state.borrow() }

    /// Moves to `next` if that is a forward transition.
    fn advance(&self, next: LinkState) -> bool {
        self.state.send_if_modified(|state| {
            if state.may_advance_to(next) {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Resolves with a failure if the link is not `Ready` by `deadline`,
    /// never resolves otherwise.
    async fn handshake_watchdog(&self, deadline: Option<Instant>) -> LinkError {
        let Some(deadline) = deadline else { return std::future::pending().await };
        let mut state = self.state.subscribe();
        let reached = tokio::time::timeout_at(deadline, state.wait_for(|s| *s >= LinkState::Ready)).await.is_ok();
        if reached {
            std::future::pending().await
        } else {
            LinkError::TransportFailure(String::from("handshake was not acknowledged in time"))
        }
    }

    async fn read_inbound(&self, inbound: &mut RelayInbound) -> Result<(), LinkError> {
        while let Some(received) = inbound.next().await {
            match received? {
                Message::Text(text) => self.on_inbound(text.as_bytes()),
                Message::Binary(bytes) => self.on_inbound(&bytes),
                Message::Close(frame) => {
                    log!("Relay closed the link for flight {}: {frame:?}", self.flight_id);
                    return Ok(());
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn on_inbound(&self, payload: &[u8]) {
        let decoded = command_codec::decode(payload);
        match self.current() {
            LinkState::HandshakePending => {
                let acknowledged = match self.config.handshake_policy {
                    HandshakePolicy::ExplicitSuccess => matches!(decoded, Ok(RelayEvent::HandshakeAck)),
                    HandshakePolicy::FirstMessage => true,
                };
                if acknowledged && self.advance(LinkState::Ready) {
                    info!("Telemetry link for flight {} is ready.", self.flight_id);
                } else {
                    event!("Flight {} awaits its handshake, relay says {decoded:?}", self.flight_id);
                }
            }
            LinkState::Ready => {
                event!("Flight {} -> {decoded:?}", self.flight_id);
                let _ = self.events.send(decoded);
            }
            LinkState::Connecting | LinkState::Closed => {}
        }
    }
}
