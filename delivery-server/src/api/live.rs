//! Server-Sent Events bridge for live projection feeds
//!
//! Each [`FeedEvent`] becomes one SSE message whose `event:` field names
//! the variant (`snapshot`, `not_found`, `error`) and whose data is the
//! JSON body. The stream ends when the client disconnects, when the feed
//! emits a terminal error, or when the server shuts down.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use crate::core::ServerState;
use crate::orders::{FeedEvent, ProjectionStream};

/// SSE event name for a feed item
pub fn event_name(event: &FeedEvent) -> &'static str {
    match event {
        FeedEvent::Snapshot(_) => "snapshot",
        FeedEvent::NotFound { .. } => "not_found",
        FeedEvent::Error(_) => "error",
    }
}

fn to_sse(event: FeedEvent) -> Event {
    let name = event_name(&event);
    match Event::default().event(name).json_data(&event) {
        Ok(sse) => sse,
        Err(e) => {
            tracing::error!(error = %e, event = name, "Failed to encode feed event");
            Event::default().event("error").data("encode failed")
        }
    }
}

/// Wrap a projection feed as an SSE response
pub fn sse_response(
    state: &ServerState,
    feed: ProjectionStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + use<>> {
    let events = feed
        .map(|event| Ok::<_, Infallible>(to_sse(event)))
        .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.config.sse_keep_alive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::ProjectionError;

    #[test]
    fn test_event_names() {
        assert_eq!(
            event_name(&FeedEvent::NotFound {
                order_id: "o1".into()
            }),
            "not_found"
        );
        assert_eq!(
            event_name(&FeedEvent::Error(ProjectionError::FeedClosed)),
            "error"
        );
    }
}
