// Operator-facing output. Log lines and alert banners go to stdout, and
// every processed frame is annotated with its detection boxes and published
// on a broadcast bus so a viewer process can render a live feed without
// touching the detection loop.

use std::sync::Arc;

use tokio::sync::broadcast;

use ember_vision::error::SinkResult;
use ember_vision::{DetectionResult, DisplaySink, Frame, LogEntry};

const BOX_COLOR: [u8; 3] = [64, 255, 64];

/// One annotated RGB frame, cheap to clone across subscribers.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub fire_present: bool,
    pub data: Arc<[u8]>,
}

/// Fan-out channel for annotated frames. Subscribers that fall behind lose
/// old frames rather than slowing the sender down.
#[derive(Clone)]
pub struct FrameBus {
    frames_tx: broadcast::Sender<FramePacket>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = broadcast::channel(capacity.max(1));
        Self { frames_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FramePacket> {
        self.frames_tx.subscribe()
    }

    fn publish(&self, packet: FramePacket) {
        // A send error only means nobody is subscribed right now.
        let _ = self.frames_tx.send(packet);
    }
}

/// Prints events and alert banners, and feeds the frame bus.
pub struct ConsoleDisplay {
    bus: FrameBus,
}

impl ConsoleDisplay {
    pub fn new(bus: FrameBus) -> Self {
        Self { bus }
    }
}

impl DisplaySink for ConsoleDisplay {
    fn display_log(&self, entry: &LogEntry) -> SinkResult {
        println!("[{}] {}", entry.timestamp, entry.message);
        Ok(())
    }

    fn fire_detected(&self, confidence: f64) -> SinkResult {
        println!("Alert: FIRE DETECTED (confidence {confidence:.2})");
        Ok(())
    }

    fn clear_alert(&self) -> SinkResult {
        println!("Alert: INACTIVE");
        Ok(())
    }

    fn show_frame(&self, frame: &Frame, result: &DetectionResult) -> SinkResult {
        let mut annotated = frame.data.clone();
        for region in &result.regions {
            draw_box(
                &mut annotated,
                frame.width,
                (region.x, region.y, region.width, region.height),
            );
        }
        self.bus.publish(FramePacket {
            timestamp: frame.timestamp,
            width: frame.width,
            height: frame.height,
            fire_present: result.fire_present,
            data: annotated.into(),
        });
        Ok(())
    }
}

/// One-pixel rectangle outline in place.
fn draw_box(data: &mut [u8], stride: u32, (x, y, w, h): (u32, u32, u32, u32)) {
    let mut paint = |px: u32, py: u32| {
        let index = ((py * stride + px) * 3) as usize;
        if index + 2 < data.len() {
            data[index..index + 3].copy_from_slice(&BOX_COLOR);
        }
    };
    for dx in x..x + w {
        paint(dx, y);
        paint(dx, y + h - 1);
    }
    for dy in y..y + h {
        paint(x, dy);
        paint(x + w - 1, dy);
    }
}
