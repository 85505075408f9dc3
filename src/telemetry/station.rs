//! Station telemetry: periodic device self-reports.

use anyhow::{ensure, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventBroadcaster;
use crate::routing::{RawMessage, TopicHandler};

/// Event type station updates are published under.
pub const STATION_EVENT_TYPE: &str = "station";

/// Topic devices publish their raw self-report on.
pub const STATION_TOPIC: &str = "gpsno/simulation/devices/+/device/raw";

#[derive(Debug, Deserialize)]
struct StationReport {
    device: DeviceReport,
}

#[derive(Debug, Deserialize)]
struct DeviceReport {
    mac_address: String,
    #[serde(default)]
    name: String,
}

/// Station state published to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationUpdate {
    /// Device id taken from the topic
    pub device_id: String,
    pub mac_address: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Publishes a station update for every device self-report.
pub struct StationSubscription {
    broadcaster: EventBroadcaster,
}

impl StationSubscription {
    pub fn new(broadcaster: EventBroadcaster) -> Self {
        Self { broadcaster }
    }
}

/// Device id is the level matched by the `+` in [`STATION_TOPIC`].
fn device_id(topic: &str) -> &str {
    topic.split('/').nth(3).unwrap_or_default()
}

#[async_trait]
impl TopicHandler for StationSubscription {
    fn topics(&self) -> Vec<String> {
        vec![STATION_TOPIC.to_string()]
    }

    async fn handle(&self, message: RawMessage) -> anyhow::Result<()> {
        let report: StationReport = serde_json::from_slice(&message.payload)
            .with_context(|| format!("invalid station payload on {}", message.topic))?;
        ensure!(
            !report.device.mac_address.is_empty(),
            "station report on {} has no mac address",
            message.topic
        );

        let update = StationUpdate {
            device_id: device_id(&message.topic).to_string(),
            mac_address: report.device.mac_address,
            name: report.device.name,
            updated_at: Utc::now(),
        };

        self.broadcaster.publish(STATION_EVENT_TYPE, &update, None).await?;
        Ok(())
    }
}
