//! Album persistence.
//!
//! [`AlbumStore`] is the only seam between the HTTP handlers and the
//! database. [`MongoStore`] is the production implementation; [`MemoryStore`]
//! backs the tests. Both enforce the (`title`, `artist`) uniqueness rule
//! atomically with the write that could break it.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::album::{Album, AlbumPatch, NewAlbum};

/// Result of a partial update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Records whose id matched (0 or 1).
    pub matched: u64,
    /// Records whose fields actually changed (0 or 1).
    pub modified: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would give two albums the same title and artist.
    #[error("an album with this title and artist already exists")]
    Duplicate,

    /// The id is not in the store's id format.
    #[error("`{0}` is not a valid album id")]
    InvalidId(String),

    /// A stored document does not have the shape of an album.
    #[error("malformed album document: {0}")]
    Malformed(String),

    /// The unique index cannot be built over records already in the
    /// collection.
    #[error(
        "cannot build unique index `{index}`: the collection already holds albums with the same \
         title and artist; remove the duplicate records and restart ({detail})"
    )]
    ExistingDuplicates { index: &'static str, detail: String },

    #[error(transparent)]
    Mongo(mongodb::error::Error),

    #[error("failed to encode update: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
}

#[async_trait]
pub trait AlbumStore: Send + Sync {
    /// Round-trips to the backing database.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Every album, in store order.
    async fn list(&self) -> Result<Vec<Album>, StoreError>;

    /// Albums whose title equals `title` exactly.
    async fn find_by_title(&self, title: &str) -> Result<Vec<Album>, StoreError>;

    /// Inserts `album` under a fresh id, or fails with
    /// [`StoreError::Duplicate`].
    async fn insert(&self, album: NewAlbum) -> Result<Album, StoreError>;

    async fn update(&self, id: &str, patch: &AlbumPatch) -> Result<UpdateOutcome, StoreError>;

    /// Returns the number of albums deleted (0 or 1).
    async fn delete(&self, id: &str) -> Result<u64, StoreError>;
}
