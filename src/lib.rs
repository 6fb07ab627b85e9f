//! # album-service
//!
//! A small JSON service over one MongoDB collection of albums.
//!
//! | Method | Path | Does |
//! |---|---|---|
//! | GET | `/api/albums` | list every album |
//! | GET | `/api/albums/{title}` | albums with exactly this title |
//! | POST | `/api/albums` | create from `{title, artist, year}` |
//! | PUT | `/api/albums/{id}` | merge the given fields into one album |
//! | DELETE | `/api/albums/{id}` | delete one album |
//!
//! Bodies may be JSON or form-encoded. Every `/api` response is an
//! [`Envelope`]: `{"status": 201, "message": "Album received", "data": {..}}`.
//!
//! The HTTP layer is thin: a `matchit` radix tree per method,
//! hyper for the wire, graceful shutdown on SIGTERM / Ctrl-C. TLS, rate
//! limiting and body-size limits are left to the reverse proxy in front.
//!
//! ## Running against any store
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use album_service::api::{self, AppState};
//! use album_service::store::MemoryStore;
//! use album_service::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(Arc::new(MemoryStore::new()));
//!     Server::bind(([127, 0, 0, 1], 3000))
//!         .serve(api::router(state))
//!         .await
//!         .unwrap();
//! }
//! ```

mod error;
mod handler;
mod method;
mod middleware;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod album;
pub mod api;
pub mod config;
pub mod health;
pub mod store;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::{BodyError, Request};
pub use response::{ContentType, Envelope, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;
