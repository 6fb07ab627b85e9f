//! The album routes.
//!
//! Every `/api` response, success or failure, is an [`Envelope`]. Store
//! failures are logged here and reach the client only as a generic
//! `500 Server error`.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::album::{Album, AlbumInput, AlbumPatch, ValidationError};
use crate::health;
use crate::request::BodyError;
use crate::store::{AlbumStore, StoreError};
use crate::{ContentType, Envelope, IntoResponse, Request, Response, Router, Status};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// State shared by every handler: the one store client of the process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AlbumStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn AlbumStore>) -> Self {
        Self { store }
    }
}

/// The full routing table of the service.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new(state)
        .get("/", index)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .get("/api/albums", list_albums)
        .get("/api/albums/{title}", find_albums)
        .post("/api/albums", create_album)
        .put("/api/albums/{id}", update_album)
        .delete("/api/albums/{id}", delete_album)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Album not found")]
    AlbumNotFound,

    /// Covers both unknown and malformed ids.
    #[error("ID not found")]
    IdNotFound,

    #[error("Album already exists in the database")]
    Conflict,

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Body(#[from] BodyError),

    #[error("Server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::AlbumNotFound | Self::IdNotFound => Status::NotFound,
            Self::Conflict => Status::Conflict,
            Self::Invalid(_) => Status::UnprocessableContent,
            Self::Body(BodyError::UnsupportedMediaType(_)) => Status::UnsupportedMediaType,
            Self::Body(BodyError::Malformed(_)) => Status::BadRequest,
            Self::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => Self::Conflict,
            StoreError::InvalidId(_) => Self::IdNotFound,
            other => Self::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("store failure: {e}");
        }
        Envelope::new(self.status(), self.to_string()).into_response()
    }
}

// GET /
async fn index(_req: Request, _state: AppState) -> Response {
    Response::builder().bytes(ContentType::Html, INDEX_HTML.as_bytes().to_vec())
}

// GET /api/albums
async fn list_albums(_req: Request, state: AppState) -> Result<Envelope<Vec<Album>>, ApiError> {
    let albums = state.store.list().await?;
    Ok(Envelope::new(Status::Ok, found(albums.len())).with_data(albums))
}

// GET /api/albums/{title}
async fn find_albums(req: Request, state: AppState) -> Result<Envelope<Vec<Album>>, ApiError> {
    let title = req.param_decoded("title").unwrap_or_default();
    let albums = state.store.find_by_title(&title).await?;

    if albums.is_empty() {
        return Err(ApiError::AlbumNotFound);
    }
    Ok(Envelope::new(Status::Ok, found(albums.len())).with_data(albums))
}

// POST /api/albums
async fn create_album(req: Request, state: AppState) -> Result<Envelope<Album>, ApiError> {
    let album = req.payload::<AlbumInput>()?.validate()?;
    info!(title = %album.title, artist = %album.artist, year = album.year, "creating album");

    let album = state.store.insert(album).await?;
    info!(id = %album.id, "album created");
    Ok(Envelope::new(Status::Created, "Album received").with_data(album))
}

// PUT /api/albums/{id}
async fn update_album(req: Request, state: AppState) -> Result<Envelope, ApiError> {
    let id = req.param("id").unwrap_or_default();
    let patch = AlbumPatch::from_fields(req.payload::<Map<String, Value>>()?)?;

    let outcome = state.store.update(id, &patch).await?;
    if outcome.matched == 0 {
        return Err(ApiError::IdNotFound);
    }
    Ok(Envelope::new(Status::Ok, format!("{} record(s) updated.", outcome.modified)))
}

// DELETE /api/albums/{id}
async fn delete_album(req: Request, state: AppState) -> Result<Envelope, ApiError> {
    let id = req.param("id").unwrap_or_default();

    let deleted = state.store.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::IdNotFound);
    }
    info!(id, "album deleted");
    Ok(Envelope::new(Status::Ok, format!("{deleted} record(s) deleted.")))
}

fn found(n: usize) -> String {
    format!("{n} album(s) found.")
}
