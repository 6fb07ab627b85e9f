//! Test server lifecycle and a thin HTTP client for the album routes.
//!
//! Each test gets its own server on a random port, backed by a fresh
//! in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use album_service::Server;
use album_service::api::{self, AppState};
use album_service::store::{AlbumStore, MemoryStore};
use reqwest::Response;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A running server. Dropping it stops accepting connections.
pub struct TestServer {
    pub base_url: String,
    /// Direct store access for assertions that bypass HTTP.
    pub store: Arc<dyn AlbumStore>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let store: Arc<dyn AlbumStore> = Arc::new(MemoryStore::new());
        let router = api::router(AppState::new(Arc::clone(&store)));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().expect("Failed to get local address").port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            Server::from_listener(listener)
                .serve_with_shutdown(router, async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            store,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub fn client(&self) -> TestClient {
        TestClient { base_url: self.base_url.clone(), http: reqwest::Client::new() }
    }
}

pub struct TestClient {
    base_url: String,
    http: reqwest::Client,
}

impl TestClient {
    pub async fn get(&self, path: &str) -> Response {
        self.http.get(self.url(path)).send().await.expect("GET failed")
    }

    pub async fn list_albums(&self) -> Response {
        self.get("/api/albums").await
    }

    pub async fn find_albums(&self, title: &str) -> Response {
        self.get(&format!("/api/albums/{}", urlencoding::encode(title))).await
    }

    pub async fn create_album(&self, body: Value) -> Response {
        self.http.post(self.url("/api/albums")).json(&body).send().await.expect("POST failed")
    }

    pub async fn create_album_form(&self, fields: &[(&str, &str)]) -> Response {
        self.http.post(self.url("/api/albums")).form(fields).send().await.expect("POST failed")
    }

    pub async fn update_album(&self, id: &str, body: Value) -> Response {
        self.http
            .put(self.url(&format!("/api/albums/{id}")))
            .json(&body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn update_album_form(&self, id: &str, fields: &[(&str, &str)]) -> Response {
        self.http
            .put(self.url(&format!("/api/albums/{id}")))
            .form(fields)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn head(&self, path: &str) -> Response {
        self.http.head(self.url(path)).send().await.expect("HEAD failed")
    }

    pub async fn delete_album(&self, id: &str) -> Response {
        self.http
            .delete(self.url(&format!("/api/albums/{id}")))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// Creates "Thriller" by Michael Jackson and returns its id.
    pub async fn create_thriller(&self) -> String {
        let response = self
            .create_album(json!({ "title": "Thriller", "artist": "Michael Jackson", "year": "1982" }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("invalid JSON");
        body["data"]["id"].as_str().expect("missing id").to_owned()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
