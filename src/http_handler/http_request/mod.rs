use super::http_response::{flight_query, login};

pub mod flight_query_get;
pub mod login_post;
pub mod request_common;
