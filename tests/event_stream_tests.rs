//! End-to-end event stream tests over a real TCP listener.

use std::time::Duration;

use serde_json::{json, Value};
use telemetry_relay::{api::create_router, AppState, CancelToken, Config, EventBroadcaster};

// == Helper Functions ==

/// Serves the relay on an ephemeral port and returns its base URL.
async fn spawn_server(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Splits a chunked event-stream body back into `\n\n`-terminated frames.
struct FrameReader {
    response: reqwest::Response,
    buffer: String,
}

impl FrameReader {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            buffer: String::new(),
        }
    }

    async fn next(&mut self) -> Option<String> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame = self.buffer[..end + 2].to_string();
                self.buffer.drain(..end + 2);
                return Some(frame);
            }

            let chunk = tokio::time::timeout(Duration::from_secs(2), self.response.chunk())
                .await
                .expect("stream read timed out")
                .ok()??;
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

fn data_json(frame: &str) -> Value {
    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    serde_json::from_str(data).unwrap()
}

// == Tests ==

#[tokio::test]
async fn test_scoped_stream_end_to_end() {
    let state = AppState::from_config(&Config::default());
    let broadcaster = state.broadcaster.clone();
    let shutdown = state.shutdown.clone();
    let base = spawn_server(state).await;

    let response = reqwest::get(format!("{base}/rangings/5/stream")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut frames = FrameReader::new(response);
    let connected = frames.next().await.unwrap();
    assert_eq!(
        connected,
        "event: connected\ndata: {\"status\":\"connected\", \"id\": 5}\n\n"
    );

    let delivered = broadcaster
        .publish("ranging", &json!({"id": 5, "raw_distance": 1.23}), Some(5))
        .await
        .unwrap();
    assert_eq!(delivered, 1);

    let frame = frames.next().await.unwrap();
    assert!(frame.starts_with("event: ranging\n"));
    assert_eq!(data_json(&frame), json!({"id": 5, "raw_distance": 1.23}));

    // Ending the stream releases the subscription
    shutdown.cancel();
    assert!(frames.next().await.is_none());

    for _ in 0..200 {
        if broadcaster.key_count().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let delivered = broadcaster
        .publish("ranging", &json!({"id": 5, "raw_distance": 2.0}), Some(5))
        .await
        .unwrap();
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_ingest_reaches_open_stream() {
    let state = AppState::from_config(&Config::default());
    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/rangings/stream"))
        .send()
        .await
        .unwrap();
    let mut frames = FrameReader::new(response);
    frames.next().await.unwrap();

    let report: Value = client
        .post(format!("{base}/telemetry/gpsno/simulation/devices/3/uwb/ranging"))
        .body(r#"[{"source_address":"s1","destination_address":"s2","distance":{"raw_distance":7.25}}]"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["matched"], 1);

    let frame = frames.next().await.unwrap();
    let json = data_json(&frame);
    assert_eq!(json["source_address"], "s1");
    assert_eq!(json["raw_distance"], 7.25);
}

#[tokio::test]
async fn test_library_level_subscribe_publish_cancel() {
    let broadcaster = EventBroadcaster::new();
    let token = CancelToken::new();

    let mut rx = broadcaster.subscribe(&token, "ranging", Some(5)).await;
    broadcaster
        .publish("ranging", &json!({"id": 5, "raw_distance": 1.23}), Some(5))
        .await
        .unwrap();

    let frame = rx.recv().await.unwrap();
    let text = std::str::from_utf8(&frame).unwrap();
    assert_eq!(data_json(text), json!({"id": 5, "raw_distance": 1.23}));

    token.cancel();
    assert!(rx.recv().await.is_none());

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        broadcaster.publish("ranging", &json!({"id": 5}), Some(5)),
    )
    .await
    .expect("publish after cancel must not hang");
    assert_eq!(result.unwrap(), 0);
}
