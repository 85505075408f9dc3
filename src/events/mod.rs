//! Live Events Module
//!
//! Fan-out of published domain events to live subscribers, and the binding
//! that exposes one subscription as a streaming HTTP response.
//!
//! # Wire format
//! Every frame is `event: <type>\ndata: <json>\n\n`; each stream opens with a
//! single `connected` frame.

mod broadcaster;
mod cancel;
pub mod frame;
mod stream;

pub use broadcaster::{subscription_key, EventBroadcaster, DEFAULT_CHANNEL_CAPACITY};
pub use cancel::{CancelOnDrop, CancelToken};
pub use stream::event_stream_response;
