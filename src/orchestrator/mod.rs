//! Sequencing of a control session: login, flight discovery, one telemetry
//! link per selected flight, command issuance and revocation.

mod control_report;
mod control_session;
mod flight_selection;
mod retry;


pub use control_report::{ControlReport, ControlledFlight, FailedFlight};
pub use control_session::{Orchestrator, OrchestratorError};
pub use flight_selection::FlightSelection;
pub use retry::RetryPolicy;
