use crate::global_variables::FRAME_SIZE;
use crate::identification::color_matching::{Bgr, Frame};
use crate::intersection_model::geometry::Rect;
use crate::shared_data::{Detection, DetectionClass};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::BufRead;

const BACKGROUND: Bgr = Bgr([90, 90, 90]);

/// A detection as recorded in a replay file, with the dominant RGB color
/// observed under its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDetection {
    pub class: DetectionClass,
    pub bounds: Rect,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

impl ReplayDetection {
    pub fn to_detection(&self) -> Detection {
        Detection {
            class: self.class,
            bounds: self.bounds,
            confidence: self.confidence,
        }
    }
}

/// One line of a replay file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Milliseconds since the start of the recording.
    pub elapsed_ms: u64,
    #[serde(default)]
    pub detections: Vec<ReplayDetection>,
}

impl ReplayFrame {
    /// Paints each colored detection onto a blank camera frame.
    pub fn synthesize_frame(&self) -> Frame {
        let mut frame = Frame::new(FRAME_SIZE.0, FRAME_SIZE.1, BACKGROUND);
        for detection in &self.detections {
            if let Some(rgb) = detection.color {
                frame.paint(&detection.bounds, Bgr::from_rgb(rgb));
            }
        }
        frame
    }

    pub fn detections(&self) -> Vec<Detection> {
        self.detections.iter().map(ReplayDetection::to_detection).collect()
    }
}

/// Reads a JSON-lines replay; blank lines and `#` comments are skipped.
pub fn read_replay<R: BufRead>(reader: R) -> Result<Vec<ReplayFrame>, Box<dyn Error>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: ReplayFrame = serde_json::from_str(trimmed)
            .map_err(|e| format!("replay line {}: {}", index + 1, e))?;
        frames.push(frame);
    }
    Ok(frames)
}
