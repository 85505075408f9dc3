//! Event Stream Binding
//!
//! Turns one broadcaster subscription into one streaming HTTP response.

use std::convert::Infallible;

use axum::{
    body::Body,
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::debug;

use crate::events::frame::connected_frame;
use crate::events::{CancelToken, EventBroadcaster};

/// Opens a subscription and streams it as a `text/event-stream` body.
///
/// The body starts with a single `connected` frame, then forwards every frame
/// the subscription receives. It ends when the subscription's channel closes
/// or `shutdown` fires. Whenever the body ends, including when the client
/// disconnects and the body is dropped, the subscription's own token is
/// cancelled so the broadcaster releases the channel.
pub async fn event_stream_response(
    broadcaster: &EventBroadcaster,
    shutdown: &CancelToken,
    event_type: &str,
    entity_id: Option<u64>,
) -> Response {
    let token = CancelToken::new();
    let mut rx = broadcaster.subscribe(&token, event_type, entity_id).await;
    // Linked only once registered, so an abandoned subscribe leaves no task behind
    shutdown.propagate_to(&token);
    let guard = token.clone().drop_guard();
    let opening = connected_frame(entity_id);
    let event_type = event_type.to_string();

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<Bytes, Infallible>(opening);

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => None,
                frame = rx.recv() => frame,
            };
            match next {
                Some(frame) => yield Ok(frame),
                None => break,
            }
        }

        debug!(event_type = %event_type, "Event stream ended");
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
