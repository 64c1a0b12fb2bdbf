pub mod flight_query;
pub mod login;
pub mod response_common;
