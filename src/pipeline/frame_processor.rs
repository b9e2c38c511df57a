use crate::config::ArbiterConfig;
use crate::control_system::control_queue::{ArbitrationEngine, TickOutcome};
use crate::entities::TelemetryHandle;
use crate::identification::color_matching::{identify_vehicle, Frame};
use crate::identification::pedestrian_tracker::PedestrianMatch;
use crate::intersection_model::geometry::Rect;
use crate::intersection_model::lanes::{lane_label, Side};
use crate::shared_data::{ActuationCommand, Detection, DetectionClass};
use std::collections::HashMap;
use std::time::Instant;

/// Label drawn next to a detection on the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub class: DetectionClass,
    pub bounds: Rect,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct FrameReport {
    pub tick: u64,
    pub outcome: TickOutcome,
    pub annotations: Vec<Annotation>,
    /// Current power vector of every fleet vehicle.
    pub commands: Vec<ActuationCommand>,
}

/// Drives the arbiter one camera frame at a time.
pub struct FrameProcessor {
    engine: ArbitrationEngine,
    pedestrian_side: Side,
}

impl FrameProcessor {
    pub fn new(config: &ArbiterConfig) -> Self {
        Self {
            engine: ArbitrationEngine::from_config(config),
            pedestrian_side: config.pedestrian_side,
        }
    }

    pub fn engine(&self) -> &ArbitrationEngine {
        &self.engine
    }

    /// Telemetry slots keyed by vehicle id, for the transport listener.
    pub fn telemetry_board(&self) -> HashMap<String, TelemetryHandle> {
        self.engine
            .vehicles()
            .iter()
            .map(|vehicle| (vehicle.id.clone(), vehicle.telemetry.clone()))
            .collect()
    }

    /// Processes one frame: visibility aging, the arbitration tick, then this
    /// frame's detections. The tick sees the state left by the previous frame.
    pub fn process(&mut self, frame: &Frame, detections: &[Detection], now: Instant) -> FrameReport {
        for vehicle in self.engine.vehicles_mut() {
            vehicle.age_visibility();
        }

        let outcome = self.engine.tick(now);

        let annotations = detections
            .iter()
            .map(|detection| match detection.class {
                DetectionClass::Vehicle => self.observe_vehicle(frame, detection),
                DetectionClass::Pedestrian => self.observe_pedestrian(detection),
            })
            .collect();

        FrameReport {
            tick: self.engine.ticks(),
            outcome,
            annotations,
            commands: self.engine.actuation_commands(),
        }
    }

    fn observe_vehicle(&mut self, frame: &Frame, detection: &Detection) -> Annotation {
        let lane = self.engine.layout().assign_lane(&detection.bounds);
        let identified = identify_vehicle(frame, &detection.bounds, self.engine.vehicles())
            .map(|vehicle| (vehicle.id.clone(), vehicle.direction));

        match identified {
            Some((id, direction)) => {
                if !self.engine.is_vehicle_queued(&id) {
                    self.engine.admit_vehicle(&id, direction);
                }
                if let Some(vehicle) = self.engine.vehicle_mut(&id) {
                    vehicle.observe(detection.bounds, lane);
                }
            }
            None => log::debug!("Unidentified vehicle at {:?}", detection.bounds),
        }

        Annotation {
            class: DetectionClass::Vehicle,
            bounds: detection.bounds,
            label: lane_label(lane),
        }
    }

    fn observe_pedestrian(&mut self, detection: &Detection) -> Annotation {
        let id = match self.engine.observe_pedestrian(detection.bounds, self.pedestrian_side) {
            PedestrianMatch::Known(id) | PedestrianMatch::New(id) => id,
        };

        Annotation {
            class: DetectionClass::Pedestrian,
            bounds: detection.bounds,
            label: id,
        }
    }
}
