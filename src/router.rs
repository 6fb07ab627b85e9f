//! Radix-tree request router.
//!
//! One `matchit` tree per HTTP method, plus the shared state handed to every
//! handler. Build it once at startup and pass it to [`Server::serve`].
//!
//! [`Server::serve`]: crate::Server::serve

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// The application router.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
    state: S,
}

/// Outcome of matching a method + path against the routing table.
pub(crate) enum Route<S> {
    Found(BoxedHandler<S>, HashMap<String, String>),
    /// The path exists under other methods, listed for the `allow` header.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self { routes: HashMap::new(), state }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics on a malformed or conflicting route. Routes are fixed at
    /// startup, so this surfaces immediately.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::Delete, path, handler)
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// `method` is `None` for request methods outside [`Method`]; such
    /// requests can only ever be a 404 or a 405.
    ///
    /// `HEAD` without a route of its own runs the `GET` handler; hyper drops
    /// the body and keeps the headers.
    pub(crate) fn lookup(&self, method: Option<Method>, path: &str) -> Route<S> {
        let candidates = match method {
            Some(Method::Head) => vec![Method::Head, Method::Get],
            Some(m) => vec![m],
            None => Vec::new(),
        };

        for m in candidates {
            if let Some(matched) = self.routes.get(&m).and_then(|tree| tree.at(path).ok()) {
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Route::Found(Arc::clone(matched.value), params);
            }
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();
        if allowed.contains(&Method::Get) && !allowed.contains(&Method::Head) {
            allowed.push(Method::Head);
        }

        if allowed.is_empty() {
            return Route::NotFound;
        }
        allowed.sort_by_key(|m| m.as_str());
        Route::MethodNotAllowed(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn ok(_req: Request, _state: ()) -> Response {
        Response::text("ok")
    }

    fn router() -> Router<()> {
        Router::new(())
            .get("/api/albums", ok)
            .get("/api/albums/{title}", ok)
            .put("/api/albums/{id}", ok)
            .delete("/api/albums/{id}", ok)
    }

    #[test]
    fn finds_handler_and_params() {
        match router().lookup(Some(Method::Put), "/api/albums/abc123") {
            Route::Found(_, params) => assert_eq!(params.get("id").map(String::as_str), Some("abc123")),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn reports_allowed_methods_for_known_paths() {
        match router().lookup(Some(Method::Post), "/api/albums/abc123") {
            Route::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec![Method::Delete, Method::Get, Method::Head, Method::Put]);
            }
            _ => panic!("expected 405"),
        }

        assert!(matches!(router().lookup(None, "/api/albums"), Route::MethodNotAllowed(_)));
    }

    #[test]
    fn head_falls_back_to_get() {
        match router().lookup(Some(Method::Head), "/api/albums/Thriller") {
            Route::Found(_, params) => assert_eq!(params.get("title").map(String::as_str), Some("Thriller")),
            _ => panic!("expected HEAD to use the GET route"),
        }

        let delete_only = Router::new(()).delete("/api/albums/{id}", ok);
        match delete_only.lookup(Some(Method::Head), "/api/albums/1") {
            Route::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::Delete]),
            _ => panic!("expected 405"),
        }
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert!(matches!(router().lookup(Some(Method::Get), "/nope"), Route::NotFound));
        assert!(matches!(router().lookup(None, "/nope"), Route::NotFound));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new(())
            .get("/api/albums/{title}", ok)
            .get("/api/albums/{name}", ok);
    }
}
