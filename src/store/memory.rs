use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AlbumStore, StoreError, UpdateOutcome};
use crate::album::{Album, AlbumPatch, NewAlbum};

/// An [`AlbumStore`] kept in process memory.
///
/// Ids use the same ObjectId format as [`MongoStore`](super::MongoStore), so
/// handlers behave identically against either store. The uniqueness check and
/// the write happen under one write lock.
#[derive(Default)]
pub struct MemoryStore {
    albums: RwLock<Vec<Album>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_id(id: &str) -> Result<String, StoreError> {
    ObjectId::parse_str(id)
        .map(|oid| oid.to_hex())
        .map_err(|_| StoreError::InvalidId(id.to_owned()))
}

fn collides(albums: &[Album], except: Option<&str>, title: &str, artist: &str) -> bool {
    albums.iter()
        .filter(|a| Some(a.id.as_str()) != except)
        .any(|a| a.title == title && a.artist == artist)
}

#[async_trait]
impl AlbumStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Album>, StoreError> {
        Ok(self.albums.read().await.clone())
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Album>, StoreError> {
        let albums = self.albums.read().await;
        Ok(albums.iter().filter(|a| a.title == title).cloned().collect())
    }

    async fn insert(&self, album: NewAlbum) -> Result<Album, StoreError> {
        let mut albums = self.albums.write().await;
        if collides(&albums, None, &album.title, &album.artist) {
            return Err(StoreError::Duplicate);
        }

        let album = Album::new(ObjectId::new().to_hex(), album);
        debug!(id = %album.id, "album inserted");
        albums.push(album.clone());
        Ok(album)
    }

    async fn update(&self, id: &str, patch: &AlbumPatch) -> Result<UpdateOutcome, StoreError> {
        let id = parse_id(id)?;
        let mut albums = self.albums.write().await;

        let Some(index) = albums.iter().position(|a| a.id == id) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = albums[index].clone();
        let modified = updated.apply(patch);
        if modified && collides(&albums, Some(id.as_str()), &updated.title, &updated.artist) {
            return Err(StoreError::Duplicate);
        }
        albums[index] = updated;

        Ok(UpdateOutcome { matched: 1, modified: u64::from(modified) })
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let id = parse_id(id)?;
        let mut albums = self.albums.write().await;

        let before = albums.len();
        albums.retain(|a| a.id != id);
        Ok((before - albums.len()) as u64)
    }
}
