//! Inbound Topic Routing
//!
//! Matches inbound telemetry topics against registered wildcard patterns and
//! hands each message to the handlers that asked for it.

mod router;
pub mod topic;

pub use router::{DispatchReport, RawMessage, TopicHandler, TopicRouter};
pub use topic::topic_matches;
