use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use events::{EventEnvelope, Subscription};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::state::AppState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("Last-Event-ID" = Option<String>, Header, description = "Resume after this event id"),
    ),
    responses(
        (status = 200, description = "SSE stream of item and batch events"),
    ),
    tag = "events"
)]
pub async fn events_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let last_seen = last_event_id(&headers);
    let subscription = state.event_bus.subscribe_after(last_seen);

    tracing::debug!(
        resumed = last_seen.is_some(),
        missed = subscription.missed.len(),
        "SSE subscriber connected"
    );

    let stream = envelope_stream(subscription).map(|envelope| Ok(to_sse_event(&envelope)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

fn last_event_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

/// Replayed envelopes first, then live ones. Live envelopes lost to lag
/// are skipped.
fn envelope_stream(subscription: Subscription) -> impl Stream<Item = EventEnvelope> {
    let live = BroadcastStream::new(subscription.receiver).filter_map(|result| async move {
        match result {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(error = %e, "SSE subscriber lagged");
                None
            }
        }
    });

    stream::iter(subscription.missed).chain(live)
}

fn to_sse_event(envelope: &EventEnvelope) -> SseEvent {
    let data = serde_json::to_string(envelope).unwrap_or_else(|_| "{}".to_string());

    SseEvent::default()
        .id(envelope.id.to_string())
        .event(envelope.event.event_type())
        .data(data)
}
