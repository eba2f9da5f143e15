use std::fmt;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;
use tracing::Span;

pub const TRACEPARENT_HEADER: HeaderName = HeaderName::from_static("traceparent");

/// W3C-style trace identifier: `00-<16 hex>-<8 hex>-01`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceParent(String);

impl TraceParent {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(format!("00-{:016x}-{:08x}-01", rng.r#gen::<u64>(), rng.r#gen::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag the request with a fresh traceparent and echo it on the response.
pub async fn trace_parent(mut req: Request, next: Next) -> Response {
    let traceparent = TraceParent::generate();
    let header = HeaderValue::from_str(traceparent.as_str()).ok();

    if let Some(value) = &header {
        req.headers_mut().insert(TRACEPARENT_HEADER, value.clone());
    }
    req.extensions_mut().insert(traceparent);

    let mut res = next.run(req).await;
    if let Some(value) = header {
        res.headers_mut().insert(TRACEPARENT_HEADER, value);
    }
    res
}

/// Span for `TraceLayer`; carries the traceparent so every log line in the
/// request can be correlated.
pub fn make_request_span(req: &Request) -> Span {
    let traceparent = req
        .extensions()
        .get::<TraceParent>()
        .map(ToString::to_string)
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        traceparent = %traceparent,
    )
}
