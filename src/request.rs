//! Incoming HTTP request type and body decoding.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
}

/// Why a request body could not be turned into a typed payload.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("unsupported content type `{0}`")]
    UnsupportedMediaType(String),

    #[error("malformed request body: {0}")]
    Malformed(String),
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self { method, path, headers, body, params }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter exactly as it appeared in the URI.
    ///
    /// For a route `/api/albums/{id}`, `req.param("id")` on `/api/albums/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a named path parameter with percent-escapes decoded, so
    /// `/api/albums/Abbey%20Road` yields `Abbey Road`. Sequences that do not
    /// decode to UTF-8 are returned as-is.
    pub fn param_decoded(&self, key: &str) -> Option<Cow<'_, str>> {
        let raw = self.param(key)?;
        Some(urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw)))
    }

    /// Decodes the body according to its `content-type`.
    ///
    /// JSON and `application/x-www-form-urlencoded` are understood. A request
    /// without a content type is read as JSON.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        match self.media_type().as_deref() {
            None | Some("application/json") => self.json(),
            Some(m) if m.ends_with("+json") => self.json(),
            Some("application/x-www-form-urlencoded") => self.form(),
            Some(other) => Err(BodyError::UnsupportedMediaType(other.to_owned())),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        serde_json::from_slice(&self.body).map_err(|e| BodyError::Malformed(e.to_string()))
    }

    pub fn form<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        serde_html_form::from_bytes(&self.body).map_err(|e| BodyError::Malformed(e.to_string()))
    }

    /// The media type of the body without parameters, lowercased.
    fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next()?.trim();
        (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    fn request(content_type: Option<&'static str>, body: &'static str) -> Request {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        Request::new(Method::Post, "/".into(), headers, Bytes::from_static(body.as_bytes()), HashMap::new())
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        title: String,
        year: String,
    }

    #[test]
    fn decodes_json_and_form_bodies() {
        let json = request(Some("application/json; charset=utf-8"), r#"{"title":"Low","year":"1977"}"#);
        let form = request(Some("application/x-www-form-urlencoded"), "title=Low&year=1977");
        let expected = Pair { title: "Low".into(), year: "1977".into() };

        assert_eq!(json.payload::<Pair>().unwrap(), expected);
        assert_eq!(form.payload::<Pair>().unwrap(), expected);
    }

    #[test]
    fn missing_content_type_is_read_as_json() {
        let req = request(None, r#"{"title":"Low","year":"1977"}"#);
        assert!(req.payload::<Pair>().is_ok());
    }

    #[test]
    fn rejects_unknown_media_types_and_garbage() {
        let xml = request(Some("application/xml"), "<album/>");
        assert!(matches!(xml.payload::<Pair>(), Err(BodyError::UnsupportedMediaType(m)) if m == "application/xml"));

        let broken = request(Some("application/json"), "{");
        assert!(matches!(broken.payload::<Pair>(), Err(BodyError::Malformed(_))));
    }

    #[test]
    fn decodes_percent_escaped_params() {
        let mut params = HashMap::new();
        params.insert("title".to_owned(), "Abbey%20Road".to_owned());
        let req = Request::new(Method::Get, "/".into(), HeaderMap::new(), Bytes::new(), params);

        assert_eq!(req.param("title"), Some("Abbey%20Road"));
        assert_eq!(req.param_decoded("title").as_deref(), Some("Abbey Road"));
        assert_eq!(req.param("missing"), None);
    }
}
