//! CORS policy.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

use super::request_logger::REQUEST_ID_HEADER;

/// Frontend origins allowed in development.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Build the CORS middleware. Production allows same-origin requests only.
pub fn cors(is_development: bool) -> Cors {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors = if is_development {
        DEV_ORIGINS
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    } else {
        Cors::default()
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE, request_id.clone()])
        .expose_headers(vec![request_id])
        .max_age(3600)
}
