//! Liveness and readiness probes.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can the album store be reached? |

use tracing::warn;

use crate::api::AppState;
use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`; has no dependencies.
pub async fn liveness(_req: Request, _state: AppState) -> Response {
    Response::text("ok")
}

/// `200 OK` with `"ready"` while the store answers a ping, `503` otherwise.
pub async fn readiness(_req: Request, state: AppState) -> Response {
    match state.store.ping().await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!("readiness check failed: {e}");
            Response::builder().status(Status::ServiceUnavailable).text("unavailable")
        }
    }
}
