use std::future::Future;
use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::response::Response;

/// Runs `next` inside a `request` span and logs how it went.
///
/// Server errors are logged at `warn`; everything else at `info`.
pub(crate) async fn trace<F>(method: &http::Method, path: &str, next: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = info_span!("request", method = %method, path = %path);

    async move {
        let started = Instant::now();
        let response = next.await;
        let status = response.status_code().code();
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if status >= 500 {
            warn!(status, latency_ms, "request failed");
        } else {
            info!(status, latency_ms, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}
