use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::AppState;

/// Requests slower than this get a warning line alongside the wide event.
const SLOW_REQUEST: Duration = Duration::from_secs(2);

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Per-request span, counters and a single wide event on completion.
///
/// The span carries an empty `user_id` field; the session guard fills it
/// in once the caller is resolved, so every line logged inside a guarded
/// handler is attributable.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    // Route template, when the router matched one. Used for metric labels
    // so /api/messages/{id} does not fan out into one series per id.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string);

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
        route = route.as_deref(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let elapsed = start.elapsed();
        let status = response.status();

        let labels = [
            ("method", method.to_string()),
            ("path", route.unwrap_or(path)),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        if elapsed > SLOW_REQUEST {
            warn!(duration_ms = elapsed.as_millis() as u64, "Slow request");
        }

        info!(
            event = "http_request_finished",
            duration_ms = elapsed.as_millis() as u64,
            status_code = status.as_u16(),
            user_agent = user_agent.as_deref().unwrap_or("unknown"),
            outcome = if status.is_server_error() {
                "error"
            } else if status.is_client_error() {
                "client_error"
            } else {
                "success"
            },
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}
