use crate::http_handler::common::Flight;
use strum_macros::{Display, EnumString};

/// Which of the live flights a session takes control of.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FlightSelection {
    /// Only the first flight the directory lists.
    #[strum(serialize = "first")]
    First,
    /// Every live flight, each on its own link.
    #[strum(serialize = "all")]
    All,
}

impl FlightSelection {
    pub fn select<'a>(&self, flights: &'a [Flight]) -> &'a [Flight] {
        match self {
            FlightSelection::First => &flights[..flights.len().min(1)],
            FlightSelection::All => flights,
        }
    }
}
