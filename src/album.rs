//! The album entity and the boundary validation for creating and patching it.
//!
//! Request bodies are decoded into loose shapes ([`AlbumInput`], a plain
//! field map for patches) and validated here before anything reaches the
//! store. JSON clients may send `year` as a number; form posts always send it
//! as a string, so both are accepted.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Years an album may carry.
pub const YEARS: RangeInclusive<i64> = 1000..=9999;

/// One album record as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Assigned by the store on creation; never changes.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// An integer for every album this service writes. Records left by older
    /// writers may hold any value here (a string, `NaN`, nothing at all), and
    /// it is passed through untouched.
    pub year: Value,
    /// Fields added through updates beyond the three known ones.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated album, ready to insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub year: i32,
}

/// The create body as the client sent it.
#[derive(Debug, Default, Deserialize)]
pub struct AlbumInput {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<Value>,
}

/// A validated partial update. Only `Some` fields and the entries of
/// `extra` are written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is required")]
    Missing(&'static str),

    #[error("`{0}` cannot be empty")]
    Blank(&'static str),

    #[error("`{0}` must be a string")]
    NotAString(&'static str),

    #[error("`year` must be an integer, got `{0}`")]
    YearNotAnInteger(String),

    #[error("`year` must be between 1000 and 9999, got {0}")]
    YearOutOfRange(i64),

    #[error("`{0}` cannot be changed")]
    Immutable(String),

    #[error("`{0}` is not a valid field name")]
    InvalidFieldName(String),

    #[error("update must contain at least one field")]
    EmptyPatch,
}

impl AlbumInput {
    pub fn validate(self) -> Result<NewAlbum, ValidationError> {
        let title = required_text("title", self.title)?;
        let artist = required_text("artist", self.artist)?;
        let year = parse_year(self.year.as_ref().ok_or(ValidationError::Missing("year"))?)?;
        Ok(NewAlbum { title, artist, year })
    }
}

impl AlbumPatch {
    /// Validates an arbitrary field map. Known fields are checked like on
    /// create; the id is read-only; anything else is kept verbatim.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ValidationError> {
        if fields.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }

        let mut patch = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "title" => patch.title = Some(patch_text("title", value)?),
                "artist" => patch.artist = Some(patch_text("artist", value)?),
                "year" => patch.year = Some(parse_year(&value)?),
                "id" | "_id" => return Err(ValidationError::Immutable(key)),
                _ if key.is_empty() || key.starts_with('$') || key.contains('.') => {
                    return Err(ValidationError::InvalidFieldName(key));
                }
                _ => {
                    patch.extra.insert(key, value);
                }
            }
        }
        Ok(patch)
    }
}

impl Album {
    pub fn new(id: String, album: NewAlbum) -> Self {
        Self { id, title: album.title, artist: album.artist, year: album.year.into(), extra: Map::new() }
    }

    /// Applies `patch` in place, returning whether anything changed.
    pub fn apply(&mut self, patch: &AlbumPatch) -> bool {
        let mut modified = false;

        if let Some(title) = &patch.title {
            modified |= replace(&mut self.title, title.clone());
        }
        if let Some(artist) = &patch.artist {
            modified |= replace(&mut self.artist, artist.clone());
        }
        if let Some(year) = patch.year {
            modified |= replace(&mut self.year, Value::from(year));
        }
        for (key, value) in &patch.extra {
            if self.extra.get(key) != Some(value) {
                self.extra.insert(key.clone(), value.clone());
                modified = true;
            }
        }
        modified
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(trimmed.to_owned())
}

fn patch_text(field: &'static str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => required_text(field, Some(s)),
        _ => Err(ValidationError::NotAString(field)),
    }
}

/// Accepts an integer JSON number, a float with no fractional part, or a
/// string holding an integer.
pub fn parse_year(value: &Value) -> Result<i32, ValidationError> {
    let year = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let year = year.ok_or_else(|| ValidationError::YearNotAnInteger(display(value)))?;

    if !YEARS.contains(&year) {
        return Err(ValidationError::YearOutOfRange(year));
    }
    // YEARS lies well inside i32.
    Ok(year as i32)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> AlbumInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn string_years_become_integers() {
        let album = input(json!({ "title": "Thriller", "artist": "Michael Jackson", "year": "1982" }))
            .validate()
            .unwrap();
        assert_eq!(album, NewAlbum { title: "Thriller".into(), artist: "Michael Jackson".into(), year: 1982 });
    }

    #[test]
    fn numeric_years_are_accepted() {
        assert_eq!(parse_year(&json!(1977)), Ok(1977));
        assert_eq!(parse_year(&json!(1977.0)), Ok(1977));
        assert_eq!(parse_year(&json!(" 1977 ")), Ok(1977));
    }

    #[test]
    fn bad_years_are_rejected() {
        assert_eq!(parse_year(&json!("nineteen")), Err(ValidationError::YearNotAnInteger("nineteen".into())));
        assert_eq!(parse_year(&json!(19.5)), Err(ValidationError::YearNotAnInteger("19.5".into())));
        assert_eq!(parse_year(&json!(null)), Err(ValidationError::YearNotAnInteger("null".into())));
        assert_eq!(parse_year(&json!(12)), Err(ValidationError::YearOutOfRange(12)));
        assert_eq!(parse_year(&json!("20000")), Err(ValidationError::YearOutOfRange(20000)));
    }

    #[test]
    fn create_requires_every_field() {
        assert_eq!(
            input(json!({ "artist": "Nico", "year": 1967 })).validate(),
            Err(ValidationError::Missing("title")),
        );
        assert_eq!(
            input(json!({ "title": "  ", "artist": "Nico", "year": 1967 })).validate(),
            Err(ValidationError::Blank("title")),
        );
        assert_eq!(
            input(json!({ "title": "Chelsea Girl", "artist": "Nico" })).validate(),
            Err(ValidationError::Missing("year")),
        );
    }

    #[test]
    fn patch_splits_known_and_extra_fields() {
        let patch = AlbumPatch::from_fields(
            json!({ "year": 1999, "label": "Virgin" }).as_object().unwrap().clone(),
        )
        .unwrap();

        assert_eq!(patch.year, Some(1999));
        assert_eq!(patch.title, None);
        assert_eq!(patch.extra.get("label"), Some(&json!("Virgin")));
    }

    #[test]
    fn patch_rejects_empty_maps_ids_and_bad_types() {
        assert_eq!(AlbumPatch::from_fields(Map::new()), Err(ValidationError::EmptyPatch));

        let id = json!({ "_id": "abc" }).as_object().unwrap().clone();
        assert_eq!(AlbumPatch::from_fields(id), Err(ValidationError::Immutable("_id".into())));

        let title = json!({ "title": 5 }).as_object().unwrap().clone();
        assert_eq!(AlbumPatch::from_fields(title), Err(ValidationError::NotAString("title")));

        let operator = json!({ "$inc": 1 }).as_object().unwrap().clone();
        assert_eq!(AlbumPatch::from_fields(operator), Err(ValidationError::InvalidFieldName("$inc".into())));
    }

    #[test]
    fn apply_reports_real_changes_only() {
        let mut album = Album::new(
            "1".into(),
            NewAlbum { title: "Low".into(), artist: "David Bowie".into(), year: 1977 },
        );

        let same = AlbumPatch { year: Some(1977), ..Default::default() };
        assert!(!album.apply(&same));

        let newer = AlbumPatch { year: Some(1999), ..Default::default() };
        assert!(album.apply(&newer));
        assert_eq!(album.year, 1999);
        assert_eq!(album.title, "Low");
    }

    #[test]
    fn patching_a_legacy_year_stores_an_integer() {
        let mut album = Album::new(
            "1".into(),
            NewAlbum { title: "Low".into(), artist: "David Bowie".into(), year: 1977 },
        );
        album.year = json!("1977");

        assert!(album.apply(&AlbumPatch { year: Some(1977), ..Default::default() }));
        assert_eq!(album.year, json!(1977));
    }

    #[test]
    fn extra_fields_serialize_inline() {
        let mut album = Album::new(
            "1".into(),
            NewAlbum { title: "Low".into(), artist: "David Bowie".into(), year: 1977 },
        );
        album.extra.insert("label".into(), json!("RCA"));

        let value = serde_json::to_value(&album).unwrap();
        assert_eq!(value, json!({ "id": "1", "title": "Low", "artist": "David Bowie", "year": 1977, "label": "RCA" }));
    }
}
