use crate::http_handler::common::Flight;
use crate::telemetry::{Command, LinkError, TelemetryLink};

/// Outcome of `Orchestrator::run`.
#[derive(Debug, Default)]
pub struct ControlReport {
    pub(super) controlled: Vec<ControlledFlight>,
    pub(super) failed: Vec<FailedFlight>,
}

impl ControlReport {
    /// Flights with a ready link and their issued commands.
    pub fn controlled(&self) -> &[ControlledFlight] { &self.controlled }
    pub fn failed(&self) -> &[FailedFlight] { &self.failed }
    pub fn controlled_count(&self) -> usize { self.controlled.len() }
}

#[derive(Debug)]
pub struct ControlledFlight {
    pub(super) flight: Flight,
    pub(super) link: TelemetryLink,
    pub(super) issued: Vec<Command>,
}

impl ControlledFlight {
    pub fn flight(&self) -> &Flight { &self.flight }
    pub fn link(&self) -> &TelemetryLink { &self.link }
    pub fn issued(&self) -> &[Command] { &self.issued }

    /// Remove commands that withdraw every add command still in effect,
    /// most recent first.
    pub fn outstanding_revocations(&self) -> Vec<Command> {
        let mut outstanding: Vec<Command> = Vec::new();
        for command in &self.issued {
            match command.revocation() {
                Some(revocation) => {
                    outstanding.retain(|r| *r != revocation);
                    outstanding.push(revocation);
                }
                None => outstanding.retain(|r| r != command),
            }
        }
        outstanding.reverse();
        outstanding
    }
}

/// A selected flight that could not be brought under control.
#[derive(Debug)]
pub struct FailedFlight {
    pub(super) flight: Flight,
    pub(super) error: LinkError,
}

impl FailedFlight {
    pub fn flight(&self) -> &Flight { &self.flight }
    pub fn error(&self) -> &LinkError { &self.error }
}
