// Alarm delivery over a plain TCP socket, one JSON object per line. The
// detection loop must never wait on the network, so the sink side of this
// module is a channel send and a background task owns the socket.
//
// Key architectural principles:
// 1. **Fire-and-forget from the caller's side.** `send_fire_alert` and
//    `deactivate` enqueue a payload and return. Slow or dead receivers cost
//    the pipeline nothing.
// 2. **Connect on demand.** The socket is opened when the first payload
//    arrives and reopened after any failure. An actuator that reboots
//    mid-stream picks the alarm back up on the next event.
// 3. **Losing a payload beats blocking.** If the endpoint is unreachable the
//    event is logged and dropped. The event log and console still carry the
//    alert, and `OFF` is resent on every deactivation anyway.

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use ember_vision::error::{SinkError, SinkResult};
use ember_vision::NotificationSink;

/// Wire format for the alarm endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
enum AlarmPayload {
    #[serde(rename = "FIRE")]
    Fire { confidence: f64, timestamp: f64 },
    #[serde(rename = "OFF")]
    Off,
}

/// Pushes alarm events to a TCP endpoint as newline-delimited JSON.
pub struct TcpActuator {
    tx: mpsc::UnboundedSender<AlarmPayload>,
}

impl TcpActuator {
    pub fn new(address: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver(address, rx));
        Self { tx }
    }

    fn enqueue(&self, payload: AlarmPayload) -> SinkResult {
        self.tx
            .send(payload)
            .map_err(|_| SinkError::new("alarm delivery task stopped"))
    }
}

impl NotificationSink for TcpActuator {
    fn send_fire_alert(&self, confidence: f64, timestamp: f64) -> SinkResult {
        self.enqueue(AlarmPayload::Fire {
            confidence,
            timestamp,
        })
    }

    fn deactivate(&self) -> SinkResult {
        self.enqueue(AlarmPayload::Off)
    }
}

async fn deliver(address: String, mut rx: mpsc::UnboundedReceiver<AlarmPayload>) {
    let mut stream: Option<TcpStream> = None;

    while let Some(payload) = rx.recv().await {
        let mut line = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!(%error, "failed to encode alarm payload");
                continue;
            }
        };
        line.push('\n');

        if stream.is_none() {
            match TcpStream::connect(&address).await {
                Ok(connected) => stream = Some(connected),
                Err(error) => {
                    tracing::warn!(%error, %address, "alarm endpoint unreachable, dropping event");
                    continue;
                }
            }
        }

        if let Some(socket) = stream.as_mut() {
            if let Err(error) = socket.write_all(line.as_bytes()).await {
                tracing::warn!(%error, %address, "alarm write failed, resetting connection");
                stream = None;
            }
        }
    }
}

/// Stands in for the real actuator when no endpoint is configured. Events
/// still reach the console and the event log through the other sinks.
pub struct NullActuator;

impl NotificationSink for NullActuator {
    fn send_fire_alert(&self, confidence: f64, timestamp: f64) -> SinkResult {
        tracing::info!(confidence, timestamp, "fire alert (no actuator configured)");
        Ok(())
    }

    fn deactivate(&self) -> SinkResult {
        tracing::info!("alarm off (no actuator configured)");
        Ok(())
    }
}
