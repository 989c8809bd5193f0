//! HTTP middleware.

mod cors;
mod request_logger;

pub use cors::cors;
pub use request_logger::{REQUEST_ID_HEADER, RequestLogger};
