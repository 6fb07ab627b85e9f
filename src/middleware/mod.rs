//! Middleware layer.
//!
//! Cross-cutting concerns wrapped around every dispatched request. The only
//! layer so far is [`trace`]: a per-request span with method, path, status
//! and latency.

mod trace;

pub(crate) use trace::trace;
