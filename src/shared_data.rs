// src/shared_data.rs

use crate::entities::Telemetry;
use crate::intersection_model::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Object classes produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionClass {
    Vehicle,
    Pedestrian,
}

/// One detector output for a frame. Thresholding already happened upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: DetectionClass,
    pub bounds: Rect,
    #[serde(default)]
    pub confidence: f32,
}

impl Detection {
    /// Builds a detection from the detector's `x1, y1, x2, y2` corner form.
    pub fn from_corners(class: DetectionClass, top_left: Point, bottom_right: Point, confidence: f32) -> Self {
        Self {
            class,
            bounds: Rect::from_corners(top_left, bottom_right),
            confidence,
        }
    }
}

/// Power command delivered to one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub vehicle_id: String,
    pub motors: [f64; 4],
}

/// Sensor report sent by a vehicle, in the firmware's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReport {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "A", default)]
    pub grayscale: Vec<u32>,
    /// cm/s
    #[serde(rename = "B", default)]
    pub speed: f64,
    /// meters
    #[serde(rename = "C", default)]
    pub mileage: f64,
    /// `[sonar angle, sonar distance]`
    #[serde(rename = "D", default)]
    pub sonar: (f64, f64),
}

impl From<TelemetryReport> for Telemetry {
    fn from(report: TelemetryReport) -> Self {
        Telemetry {
            grayscale: report.grayscale,
            speed: report.speed,
            mileage: report.mileage,
            sonar_angle: report.sonar.0,
            sonar_distance: report.sonar.1,
        }
    }
}

/// One arbitration decision as written to the decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: u64,
    pub tick: u64,
    pub vehicle_id: String,
    pub lane: String,
    pub stop_lane: String,
    pub maneuver: String,
    pub speed: f64,
    pub p0: f64,
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
}

/// A side closing or reopening, as written to the lane event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneEventRecord {
    pub timestamp: u64,
    pub tick: u64,
    pub side: String,
    pub event: String,
    pub pedestrian_id: String,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_report_reads_the_firmware_payload() {
        let payload = r#"{"Name": "green-car", "A": [812, 790, 805], "B": 14.25, "C": 3.1, "D": [30, 42.5], "E": 42.5}"#;
        let report: TelemetryReport = serde_json::from_str(payload).unwrap();
        assert_eq!(report.name, "green-car");
        let telemetry = Telemetry::from(report);
        assert_eq!(telemetry.grayscale, vec![812, 790, 805]);
        assert_eq!(telemetry.speed, 14.25);
        assert_eq!(telemetry.sonar_angle, 30.0);
        assert_eq!(telemetry.sonar_distance, 42.5);
    }

    #[test]
    fn detection_from_corners_uses_width_and_height() {
        let detection = Detection::from_corners(DetectionClass::Vehicle, Point(10, 20), Point(40, 70), 0.8);
        assert_eq!(detection.bounds, Rect::new(10, 20, 30, 50));
    }

    #[test]
    fn actuation_command_wire_format() {
        let command = ActuationCommand {
            vehicle_id: "orange-car".to_string(),
            motors: [55.0, 55.0, 55.0, 55.0],
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["vehicle_id"], "orange-car");
        assert_eq!(json["motors"][3], 55.0);
    }
}
