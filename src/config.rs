use crate::orchestrator::{FlightSelection, RetryPolicy};
use crate::telemetry::{CommandAction, CommandTag, GeoPoint, HandshakePolicy, LinkConfig};
use std::{env, fmt, str::FromStr, time::Duration};
use strum_macros::Display;

/// Runtime configuration of the client, read from `FLIGHT_OPS_*` environment
/// variables with built-in defaults.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    username: String,
    password: String,
    http_timeout: Duration,
    link: LinkConfig,
    selection: FlightSelection,
    retry: RetryPolicy,
    commands: Vec<CommandAction>,
}

impl ClientConfig {
    const DEFAULT_BASE_URL: &'static str = "https://labs.asteria.co.in";
    const DEFAULT_TELEMETRY_URL: &'static str = "wss://labs.asteria.co.in/telemetry";
    const DEFAULT_CREDENTIAL_USER: &'static str = "username";
    const DEFAULT_CREDENTIAL_PASS: &'static str = "password";
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 15;
    const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    const DEFAULT_RETRY_DELAY_MS: u64 = 500;
    const DEFAULT_COMMANDS: &'static str = "ADDLOOKHERE:13.07595,77.76085,100.007";

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| env::var(key).ok()) }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// `ConfigError` if a present value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let http_timeout_secs = parse_or(&lookup, "FLIGHT_OPS_HTTP_TIMEOUT_SECS", Self::DEFAULT_HTTP_TIMEOUT_SECS)?;
        let connect_timeout_secs =
            parse_or(&lookup, "FLIGHT_OPS_CONNECT_TIMEOUT_SECS", Self::DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let handshake_timeout_secs =
            parse_or(&lookup, "FLIGHT_OPS_HANDSHAKE_TIMEOUT_SECS", Self::DEFAULT_HANDSHAKE_TIMEOUT_SECS)?;
        let retry_attempts = parse_or(&lookup, "FLIGHT_OPS_RETRY_ATTEMPTS", Self::DEFAULT_RETRY_ATTEMPTS)?;
        let retry_delay_ms = parse_or(&lookup, "FLIGHT_OPS_RETRY_DELAY_MS", Self::DEFAULT_RETRY_DELAY_MS)?;

        let link = LinkConfig {
            relay_url: text("FLIGHT_OPS_TELEMETRY_URL", Self::DEFAULT_TELEMETRY_URL),
            client_id: lookup("FLIGHT_OPS_CLIENT_ID")
                .unwrap_or_else(|| format!("{}.local", uuid::Uuid::new_v4())),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            handshake_timeout: (handshake_timeout_secs > 0).then(|| Duration::from_secs(handshake_timeout_secs)),
            handshake_policy: parse_or(&lookup, "FLIGHT_OPS_HANDSHAKE_POLICY", HandshakePolicy::default())?,
        };

        Ok(Self {
            base_url: text("FLIGHT_OPS_BASE_URL", Self::DEFAULT_BASE_URL),
            username: text("FLIGHT_OPS_USERNAME", Self::DEFAULT_CREDENTIAL_USER),
            password: text("FLIGHT_OPS_PASSWORD", Self::DEFAULT_CREDENTIAL_PASS),
            http_timeout: Duration::from_secs(http_timeout_secs),
            link,
            selection: parse_or(&lookup, "FLIGHT_OPS_SELECTION", FlightSelection::First)?,
            retry: RetryPolicy { attempts: retry_attempts.max(1), base_delay: Duration::from_millis(retry_delay_ms) },
            commands: parse_command_plan(&text("FLIGHT_OPS_COMMANDS", Self::DEFAULT_COMMANDS))?,
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }
    pub fn username(&self) -> &str { &self.username }
    pub fn password(&self) -> &str { &self.password }
    pub fn http_timeout(&self) -> Duration { self.http_timeout }
    pub fn link(&self) -> &LinkConfig { &self.link }
    pub fn selection(&self) -> FlightSelection { self.selection }
    pub fn retry(&self) -> RetryPolicy { self.retry }
    /// Actions issued to every controlled flight, in order.
    pub fn commands(&self) -> &[CommandAction] { &self.commands }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("http_timeout", &self.http_timeout)
            .field("link", &self.link)
            .field("selection", &self.selection)
            .field("retry", &self.retry)
            .field("commands", &self.commands)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// Parses a `;`-separated list of `TAG` or `TAG:latitude,longitude,altitude`
/// entries, e.g. `ADDLOITERHERE:13.07,77.76,120;REMOVELOOKHERE`.
///
/// # Errors
/// `ConfigError::InvalidCommand` naming the first entry that does not parse.
pub fn parse_command_plan(raw: &str) -> Result<Vec<CommandAction>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_command_entry(entry).ok_or_else(|| ConfigError::InvalidCommand(entry.to_string())))
        .collect()
}

fn parse_command_entry(entry: &str) -> Option<CommandAction> {
    let (tag, point) = match entry.split_once(':') {
        Some((tag, coordinates)) => (tag, Some(parse_point(coordinates)?)),
        None => (entry, None),
    };
    let tag = CommandTag::from_str(tag.trim()).ok()?;
    if !tag.is_add() && point.is_some() {
        return None;
    }
    CommandAction::from_tag(tag, point).ok()
}

fn parse_point(coordinates: &str) -> Option<GeoPoint> {
    let values = coordinates
        .split(',')
        .map(|v| v.trim().parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;
    match values.as_slice() {
        [latitude, longitude, altitude] => Some(GeoPoint::new(*latitude, *longitude, *altitude)),
        _ => None,
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    InvalidCommand(String),
}

impl std::error::Error for ConfigError {}
