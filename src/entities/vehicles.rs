use crate::config::FleetVehicle;
use crate::control_system::actuation::PowerVector;
use crate::global_variables::VISIBILITY_TIMEOUT_TICKS;
use crate::intersection_model::geometry::Rect;
use crate::intersection_model::lanes::{LaneId, Maneuver};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Latest readings reported by a vehicle's on-board sensors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub grayscale: Vec<u32>,
    /// cm/s
    pub speed: f64,
    /// meters
    pub mileage: f64,
    pub sonar_angle: f64,
    pub sonar_distance: f64,
}

/// Shared slot for a vehicle's telemetry.
///
/// The transport listener is the only writer; the arbiter only takes snapshots.
/// Each write replaces the whole reading, so the last write wins.
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle(Arc<Mutex<Telemetry>>);

impl TelemetryHandle {
    pub fn update(&self, telemetry: Telemetry) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = telemetry;
    }

    pub fn snapshot(&self) -> Telemetry {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// A tracked vehicle of the fleet.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: String,
    /// Reference color as `[r, g, b]`.
    pub color_signature: [u8; 3],
    pub bounds: Rect,
    pub lane: Option<LaneId>,
    pub previous_lane: Option<LaneId>,
    /// Intended maneuver through the intersection.
    pub direction: Maneuver,
    /// Destination corridor; fixed once computed for the current queue membership.
    pub stop_lane: Option<LaneId>,
    pub turning: bool,
    pub completed_turn: bool,
    pub is_visible: bool,
    pub frames_since_visible: u32,
    pub motor_command: PowerVector,
    pub telemetry: TelemetryHandle,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, color_signature: [u8; 3]) -> Self {
        Self {
            id: id.into(),
            color_signature,
            bounds: Rect::default(),
            lane: None,
            previous_lane: None,
            direction: Maneuver::Right,
            stop_lane: None,
            turning: false,
            completed_turn: false,
            is_visible: false,
            frames_since_visible: 0,
            motor_command: [0.0; 4],
            telemetry: TelemetryHandle::default(),
        }
    }

    /// A fleet vehicle, heading for its configured maneuver.
    pub fn from_fleet(entry: &FleetVehicle) -> Self {
        Self {
            direction: entry.direction,
            ..Self::new(entry.id.clone(), entry.color)
        }
    }

    /// Called once per frame before detections are applied.
    pub fn age_visibility(&mut self) {
        self.frames_since_visible = self.frames_since_visible.saturating_add(1);
        if self.frames_since_visible >= VISIBILITY_TIMEOUT_TICKS {
            self.is_visible = false;
        }
    }

    /// Records a fresh detection of this vehicle.
    pub fn observe(&mut self, bounds: Rect, lane: Option<LaneId>) {
        self.bounds = bounds;
        self.previous_lane = self.lane;
        self.lane = lane;
        self.frames_since_visible = 0;
        self.is_visible = true;
    }

    /// Starts a new queue membership with the given intended maneuver.
    pub fn begin_route(&mut self, direction: Maneuver) {
        self.direction = direction;
        self.stop_lane = None;
        self.turning = false;
        self.completed_turn = false;
    }
}
