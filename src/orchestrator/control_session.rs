use super::control_report::{ControlReport, ControlledFlight, FailedFlight};
use crate::config::ClientConfig;
use crate::flight_ops::{AuthError, AuthSession, DirectoryError};
use crate::http_handler::{common::Flight, http_client::HTTPClient};
use crate::keychain::Keychain;
use crate::telemetry::{Command, LinkConfig, LinkError, TelemetryLink};
use crate::{error, info, log, warn};
use futures::future::join_all;
use std::sync::Arc;
use strum_macros::Display;

/// Drives a control session from login to command issuance.
///
/// Login and flight discovery run in sequence; the selected flights are then
/// commanded concurrently, each over its own telemetry link.
pub struct Orchestrator {
    config: ClientConfig,
    client: Arc<HTTPClient>,
    link_config: Arc<LinkConfig>,
}

impl Orchestrator {
    pub fn new(config: ClientConfig, client: Arc<HTTPClient>) -> Self {
        let link_config = Arc::new(config.link().clone());
        Self { config, client, link_config }
    }

    /// Logs in, retrying transient failures.
    ///
    /// # Errors
    /// `OrchestratorError::Auth` once the retry policy gives up.
    pub async fn login(&self) -> Result<Keychain, OrchestratorError> {
        let session = self
            .config
            .retry()
            .run("Login", || {
                AuthSession::login(&self.client, self.config.username(), self.config.password())
            })
            .await?;
        Ok(Keychain::new(Arc::clone(&self.client), &session, Arc::clone(&self.link_config)))
    }

    /// Logs in, lists live flights, opens a link to every selected flight and
    /// issues the configured commands once each link is ready.
    ///
    /// No live flights is not an error: the report then has no controlled
    /// flights. A flight whose link fails is reported as failed and does not
    /// affect the other flights.
    ///
    /// # Errors
    /// `Auth` if login fails, `Directory` if the flight query fails.
    pub async fn run(&self) -> Result<ControlReport, OrchestratorError> {
        let keychain = self.login().await?;
        let directory = keychain.directory();
        let flights = self
            .config
            .retry()
            .run("Flight query", || directory.list_live_flights(keychain.token()))
            .await?;
        if flights.is_empty() {
            warn!("No live flights. Nothing to control.");
            return Ok(ControlReport::default());
        }

        let selected = self.config.selection().select(&flights);
        info!("Taking control of {} of {} live flight(s).", selected.len(), flights.len());
        let links: Vec<(Flight, TelemetryLink)> =
            selected.iter().map(|flight| (flight.clone(), keychain.open_link(flight))).collect();

        let outcomes =
            join_all(links.iter().map(|(flight, link)| self.command_flight(flight, link))).await;

        let mut report = ControlReport::default();
        for ((flight, link), outcome) in links.into_iter().zip(outcomes) {
            match outcome {
                Ok(issued) => report.controlled.push(ControlledFlight { flight, link, issued }),
                Err(e) => {
                    error!("Could not command flight {}: {e:?}", flight.flight_id());
                    link.close().await;
                    report.failed.push(FailedFlight { flight, error: e });
                }
            }
        }
        Ok(report)
    }

    /// Waits for the link to become ready and issues the command plan.
    /// Commands address the flight by its `id`. Flights are commanded
    /// concurrently, a relay that never acknowledges only stalls its own flight.
    async fn command_flight(&self, flight: &Flight, link: &TelemetryLink) -> Result<Vec<Command>, LinkError> {
        link.ready().await?;
        let mut issued = Vec::new();
        for action in self.config.commands() {
            let command = Command::new(flight.id(), *action);
            link.send_command(&command).await?;
            issued.push(command);
        }
        log!("Issued {} command(s) to flight {}.", issued.len(), flight.flight_id());
        Ok(issued)
    }

    /// Withdraws every add command still in effect and closes all links.
    /// Returns the number of remove commands sent.
    pub async fn revoke(&self, report: ControlReport) -> usize {
        let mut revoked = 0;
        for controlled in report.controlled {
            for revocation in controlled.outstanding_revocations() {
                match controlled.link.send_command(&revocation).await {
                    Ok(()) => revoked += 1,
                    Err(e) => {
                        warn!(
                            "Could not send {} to flight {}: {e:?}",
                            revocation.tag(),
                            controlled.flight.flight_id()
                        );
                        break;
                    }
                }
            }
            controlled.link.close().await;
        }
        for failed in report.failed {
            log!("Flight {} was not controlled ({}).", failed.flight.flight_id(), failed.error);
        }
        revoked
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    Auth(AuthError),
    Directory(DirectoryError),
}

impl std::error::Error for OrchestratorError {}
impl From<AuthError> for OrchestratorError {
    fn from(value: AuthError) -> Self { OrchestratorError::Auth(value) }
}
impl From<DirectoryError> for OrchestratorError {
    fn from(value: DirectoryError) -> Self { OrchestratorError::Directory(value) }
}
