//! Unified infrastructure error type.

use thiserror::Error;

/// The error type returned by the service's fallible startup and serving
/// operations.
///
/// Request-level failures (404, 409, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding to a port or reading the bound address.
/// Store connection failures surface as [`StoreError`](crate::store::StoreError).
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
