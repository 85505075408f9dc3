//! Telemetry Handlers
//!
//! Topic handlers for the device telemetry the relay ingests.

mod ranging;
mod station;

use std::sync::Arc;

pub use ranging::{Ranging, RangingCache, RangingSubscription, RANGING_EVENT_TYPE, RANGING_TOPIC};
pub use station::{StationSubscription, StationUpdate, STATION_EVENT_TYPE, STATION_TOPIC};

use crate::events::EventBroadcaster;
use crate::routing::TopicRouter;

/// Builds a router with every telemetry handler registered.
pub fn build_router(cache: &RangingCache, broadcaster: &EventBroadcaster) -> TopicRouter {
    let mut router = TopicRouter::new();
    router.register(Arc::new(RangingSubscription::new(
        cache.clone(),
        broadcaster.clone(),
    )));
    router.register(Arc::new(StationSubscription::new(broadcaster.clone())));
    router
}
