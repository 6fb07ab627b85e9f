use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, IndexModel};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{AlbumStore, StoreError, UpdateOutcome};
use crate::album::{Album, AlbumPatch, NewAlbum};

const COLLECTION: &str = "albums";
const UNIQUE_INDEX: &str = "title_artist_unique";

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// An [`AlbumStore`] backed by a MongoDB collection.
///
/// Holds one [`Client`] for the life of the process. The driver pools
/// connections internally, so concurrent requests share it without ever
/// opening or closing connections themselves.
pub struct MongoStore {
    client: Client,
    albums: Collection<Document>,
}

impl MongoStore {
    /// Connects with the Stable API v1 (strict), verifies the deployment
    /// answers a ping, and makes sure the uniqueness index exists.
    pub async fn connect(url: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_owned());
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        let albums = client.database(database).collection(COLLECTION);
        let store = Self { client, albums };

        store.ping().await?;
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Creates the unique (`title`, `artist`) index. A no-op when it already
    /// exists with the same definition.
    ///
    /// The build fails when the collection already holds two albums with the
    /// same title and artist; startup stops until they are removed.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "title": 1, "artist": 1 })
            .options(IndexOptions::builder().unique(true).name(UNIQUE_INDEX.to_owned()).build())
            .build();

        self.albums.create_index(index).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::ExistingDuplicates { index: UNIQUE_INDEX, detail: e.to_string() }
            } else {
                StoreError::Mongo(e)
            }
        })?;
        info!(index = UNIQUE_INDEX, "album indexes ready");
        Ok(())
    }

    async fn find(&self, filter: Document) -> Result<Vec<Album>, StoreError> {
        let docs: Vec<Document> = self.albums.find(filter).await?.try_collect().await?;
        Ok(albums_from_documents(docs))
    }
}

#[async_trait]
impl AlbumStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Album>, StoreError> {
        self.find(doc! {}).await
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Album>, StoreError> {
        self.find(doc! { "title": title }).await
    }

    async fn insert(&self, album: NewAlbum) -> Result<Album, StoreError> {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "title": album.title.as_str(),
            "artist": album.artist.as_str(),
            "year": album.year,
        };

        self.albums.insert_one(document).await?;
        debug!(id = %id, "album inserted");
        Ok(Album::new(id.to_hex(), album))
    }

    async fn update(&self, id: &str, patch: &AlbumPatch) -> Result<UpdateOutcome, StoreError> {
        let id = parse_id(id)?;
        let set = set_document(patch)?;

        let result = self.albums.update_one(doc! { "_id": id }, doc! { "$set": set }).await?;
        Ok(UpdateOutcome { matched: result.matched_count, modified: result.modified_count })
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let id = parse_id(id)?;
        let result = self.albums.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        if is_duplicate_key(&e) {
            Self::Duplicate
        } else {
            Self::Mongo(e)
        }
    }
}

/// Write errors carry the code for inserts and updates; a failed index
/// build reports it as a command error.
fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(w)) => w.code == DUPLICATE_KEY,
        ErrorKind::Command(c) => c.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_owned()))
}

fn set_document(patch: &AlbumPatch) -> Result<Document, StoreError> {
    let mut set = Document::new();
    for (key, value) in &patch.extra {
        set.insert(key.clone(), mongodb::bson::to_bson(value)?);
    }
    if let Some(title) = &patch.title {
        set.insert("title", title.clone());
    }
    if let Some(artist) = &patch.artist {
        set.insert("artist", artist.clone());
    }
    if let Some(year) = patch.year {
        set.insert("year", year);
    }
    Ok(set)
}

/// Documents that are not albums at all (no ObjectId, no title or artist)
/// are left out of the result with a warning; one of them must not hide the
/// rest of the collection.
fn albums_from_documents(docs: Vec<Document>) -> Vec<Album> {
    docs.into_iter()
        .filter_map(|doc| match album_from_document(doc) {
            Ok(album) => Some(album),
            Err(e) => {
                warn!("skipping unreadable album record: {e}");
                None
            }
        })
        .collect()
}

fn album_from_document(mut doc: Document) -> Result<Album, StoreError> {
    let id = match doc.remove("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        other => return Err(StoreError::Malformed(format!("`_id` is {other:?}"))),
    };
    let title = take_string(&mut doc, "title")?;
    let artist = take_string(&mut doc, "artist")?;
    let year = take_year(&mut doc);

    let extra = match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(Album { id, title, artist, year, extra })
}

fn take_string(doc: &mut Document, field: &str) -> Result<String, StoreError> {
    match doc.remove(field) {
        Some(Bson::String(s)) => Ok(s),
        other => Err(StoreError::Malformed(format!("`{field}` is {other:?}"))),
    }
}

/// Whole numbers of any BSON width come back as JSON integers. Anything else
/// an older writer left behind is returned as its relaxed extended JSON, and a
/// missing year as `null`.
fn take_year(doc: &mut Document) -> Value {
    match doc.remove("year") {
        Some(Bson::Int32(n)) => n.into(),
        Some(Bson::Int64(n)) => n.into(),
        Some(Bson::Double(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).into(),
        Some(other) => other.into_relaxed_extjson(),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_become_albums() {
        let oid = ObjectId::new();
        let album = album_from_document(doc! {
            "_id": oid,
            "title": "Thriller",
            "artist": "Michael Jackson",
            "year": 1982_i64,
            "label": "Epic",
        })
        .unwrap();

        assert_eq!(album.id, oid.to_hex());
        assert_eq!(album.year, 1982);
        assert_eq!(album.extra.get("label"), Some(&json!("Epic")));
    }

    fn record(title: &str, year: Option<Bson>) -> Document {
        let mut doc = doc! { "_id": ObjectId::new(), "title": title, "artist": "Michael Jackson" };
        if let Some(year) = year {
            doc.insert("year", year);
        }
        doc
    }

    #[test]
    fn legacy_years_are_passed_through() {
        let whole = album_from_document(record("Bad", Some(Bson::Double(1987.0)))).unwrap();
        assert_eq!(whole.year, json!(1987));

        let text = album_from_document(record("Thriller", Some(Bson::String("1982".into())))).unwrap();
        assert_eq!(text.year, json!("1982"));

        let nan = album_from_document(record("Off the Wall", Some(Bson::Double(f64::NAN)))).unwrap();
        assert_eq!(nan.year, json!({ "$numberDouble": "NaN" }));

        let missing = album_from_document(record("Dangerous", None)).unwrap();
        assert_eq!(missing.year, Value::Null);
        assert!(!missing.extra.contains_key("year"));
    }

    #[test]
    fn listing_keeps_every_readable_record() {
        let docs = vec![
            record("Thriller", Some(Bson::Int32(1982))),
            record("Off the Wall", Some(Bson::Double(f64::NAN))),
            doc! { "_id": ObjectId::new(), "artist": "Michael Jackson", "year": 1991 },
            record("Bad", Some(Bson::String("1987".into()))),
            doc! { "_id": "not-an-object-id", "title": "Invincible", "artist": "Michael Jackson" },
            record("Dangerous", None),
        ];

        let titles: Vec<String> = albums_from_documents(docs).into_iter().map(|a| a.title).collect();
        assert_eq!(titles, ["Thriller", "Off the Wall", "Bad", "Dangerous"]);
    }

    #[test]
    fn existing_duplicates_name_the_index() {
        let e = StoreError::ExistingDuplicates { index: UNIQUE_INDEX, detail: "E11000 duplicate key".into() };
        let message = e.to_string();
        assert!(message.contains(UNIQUE_INDEX));
        assert!(message.contains("remove the duplicate"));
        assert!(message.contains("E11000"));
    }

    #[test]
    fn patches_become_set_documents() {
        let patch = AlbumPatch {
            year: Some(1999),
            extra: json!({ "label": "Epic" }).as_object().unwrap().clone(),
            ..Default::default()
        };
        let set = set_document(&patch).unwrap();

        assert_eq!(set.get_i32("year").unwrap(), 1999);
        assert_eq!(set.get_str("label").unwrap(), "Epic");
        assert!(!set.contains_key("title"));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(parse_id("not-an-id"), Err(StoreError::InvalidId(id)) if id == "not-an-id"));
        assert!(parse_id(&ObjectId::new().to_hex()).is_ok());
    }
}
