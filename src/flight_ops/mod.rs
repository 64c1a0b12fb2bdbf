//! One-shot REST collaborators of the orchestrator: logging in and listing
//! the flights that are currently live.

mod auth_session;
mod flight_directory;

#[cfg(test)]
mod tests;

pub use auth_session::{AuthError, AuthSession};
pub use flight_directory::{DirectoryError, FlightDirectory};
