//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or **SIGINT** the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` drop the store client
//!    and exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::method::Method;
use crate::middleware;
use crate::request::Request;
use crate::response::{Envelope, IntoResponse, Response};
use crate::router::{Route, Router};
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    listener: Listener,
}

enum Listener {
    Addr(SocketAddr),
    Bound(TcpListener),
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self { listener: Listener::Addr(addr.into()) }
    }

    /// Serves on an already bound listener, e.g. one bound to port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener: Listener::Bound(listener) }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve<S>(self, router: Router<S>) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for a process signal.
    pub async fn serve_with_shutdown<S, F>(self, router: Router<S>, signal: F) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
        F: Future<Output = ()> + Send,
    {
        let listener = match self.listener {
            Listener::Addr(addr) => TcpListener::bind(addr).await?,
            Listener::Bound(listener) => listener,
        };
        let router = Arc::new(router);

        info!(addr = %listener.local_addr()?, "album service listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting even
                // when more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("album service stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure becomes a
/// response, so hyper never sees an error.
async fn dispatch<S>(
    router: Arc<Router<S>>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    S: Clone + Send + Sync + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = middleware::trace(&method, &path, route(&router, req)).await;
    Ok(response.into_inner())
}

async fn route<S>(router: &Router<S>, req: hyper::Request<Incoming>) -> Response
where
    S: Clone + Send + Sync + 'static,
{
    let method = Method::try_from(req.method()).ok();

    let (handler, params) = match router.lookup(method, req.uri().path()) {
        Route::Found(handler, params) => (handler, params),
        Route::MethodNotAllowed(allowed) => return method_not_allowed(&allowed),
        Route::NotFound => return Envelope::new(Status::NotFound, "Not found").into_response(),
    };
    // A match implies a known method.
    let Some(method) = method else {
        return Envelope::new(Status::MethodNotAllowed, "Method not allowed").into_response();
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Envelope::new(Status::BadRequest, "Could not read request body").into_response();
        }
    };

    let req = Request::new(method, parts.uri.path().to_owned(), parts.headers, body, params);
    handler.call(req, router.state().clone()).await
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    let mut res = Envelope::new(Status::MethodNotAllowed, "Method not allowed").into_response();
    res.headers.push(("allow".to_owned(), allow));
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM
/// (container orchestrators) or SIGINT (Ctrl-C). Only Ctrl-C exists on
/// Windows.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
