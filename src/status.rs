//! HTTP status codes the service answers with.
//!
//! ```rust
//! use album_service::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .json(br#"{"status":201}"#.to_vec());
//! ```

use http::StatusCode;

/// The subset of status codes produced by the album routes, the probes and
/// the dispatcher.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    NoContent,            // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Conflict,             // 409
    UnsupportedMediaType, // 415
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    ServiceUnavailable,   // 503
}

impl Status {
    /// Numeric code, as written into the response envelope.
    pub fn code(self) -> u16 {
        StatusCode::from(self).as_u16()
    }
}

impl From<Status> for StatusCode {
    fn from(s: Status) -> StatusCode {
        match s {
            Status::Ok                   => StatusCode::OK,
            Status::Created              => StatusCode::CREATED,
            Status::NoContent            => StatusCode::NO_CONTENT,
            Status::BadRequest           => StatusCode::BAD_REQUEST,
            Status::NotFound             => StatusCode::NOT_FOUND,
            Status::MethodNotAllowed     => StatusCode::METHOD_NOT_ALLOWED,
            Status::Conflict             => StatusCode::CONFLICT,
            Status::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Status::UnprocessableContent => StatusCode::UNPROCESSABLE_ENTITY,
            Status::InternalServerError  => StatusCode::INTERNAL_SERVER_ERROR,
            Status::ServiceUnavailable   => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}
