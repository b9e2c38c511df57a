use crate::config::ArbiterConfig;
use crate::control_system::actuation::{power_vector, PowerVector};
use crate::entities::{Pedestrian, Vehicle};
use crate::global_variables::{CROSSING_DURATION, CRUISE_SPEED, HOLD_SPEED, TURN_SPEED};
use crate::identification::pedestrian_tracker::{PedestrianMatch, PedestrianTracker};
use crate::intersection_model::geometry::Rect;
use crate::intersection_model::lanes::{LaneId, Maneuver, Side};
use crate::intersection_model::layout::IntersectionLayout;
use crate::shared_data::ActuationCommand;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

/// When a side closed by several overlapping crossings opens again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReopenPolicy {
    /// Every expiring crossing reopens its side, even if a later crossing
    /// on the same side is still running.
    #[default]
    PerCrossing,
    /// A side reopens only once no crossing on it is still running.
    LastCrossing,
}

/// An entity waiting in the control queue, by id. The engine owns the records.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEntry {
    Vehicle(String),
    Pedestrian(String),
}

/// A running crossing. The only place a crossing's start time is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCrossing {
    pub pedestrian_id: String,
    /// Side closed by this crossing.
    pub side: Side,
    pub start_time: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneEventKind {
    Closed,
    Reopened,
}

/// A side closing or reopening for a pedestrian crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneEvent {
    pub side: Side,
    pub kind: LaneEventKind,
    pub pedestrian_id: String,
}

/// The command chosen for one vehicle during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub vehicle_id: String,
    pub lane: LaneId,
    pub stop_lane: LaneId,
    pub maneuver: Maneuver,
    pub speed: f64,
    pub power: PowerVector,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// One entry per vehicle evaluated, in queue order.
    pub decisions: Vec<Decision>,
    pub lane_events: Vec<LaneEvent>,
    /// Vehicles removed from the queue at the end of this tick.
    pub evicted: Vec<String>,
}

/// The intersection's right-of-way state machine.
///
/// Owns the static layout, the fleet records and all mutable arbitration
/// state. Only `tick` and the admission methods change the queue or the lane
/// closures, so the exclusive borrow is the only synchronization needed.
pub struct ArbitrationEngine {
    layout: IntersectionLayout,
    vehicles: Vec<Vehicle>,
    pedestrians: PedestrianTracker,
    queue: VecDeque<QueueEntry>,
    crossing_lanes: BTreeMap<Side, bool>,
    active_crossings: Vec<ActiveCrossing>,
    reopen_policy: ReopenPolicy,
    ticks: u64,
}

impl ArbitrationEngine {
    pub fn new(layout: IntersectionLayout, vehicles: Vec<Vehicle>, reopen_policy: ReopenPolicy) -> Self {
        Self {
            layout,
            vehicles,
            pedestrians: PedestrianTracker::new(),
            queue: VecDeque::new(),
            crossing_lanes: Side::ALL.iter().map(|side| (*side, false)).collect(),
            active_crossings: Vec::new(),
            reopen_policy,
            ticks: 0,
        }
    }

    pub fn from_config(config: &ArbiterConfig) -> Self {
        let vehicles = config.fleet.iter().map(Vehicle::from_fleet).collect();
        Self::new(config.layout.clone(), vehicles, config.reopen_policy)
    }

    pub fn layout(&self) -> &IntersectionLayout {
        &self.layout
    }

    /// Fleet records in configuration order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.vehicles.iter_mut()
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| vehicle.id == id)
    }

    /// Every pedestrian seen so far, including those who already crossed.
    pub fn pedestrians(&self) -> &[Pedestrian] {
        self.pedestrians.pedestrians()
    }

    pub fn pedestrian(&self, id: &str) -> Option<&Pedestrian> {
        self.pedestrians.pedestrian(id)
    }

    pub fn queue(&self) -> &VecDeque<QueueEntry> {
        &self.queue
    }

    pub fn is_vehicle_queued(&self, id: &str) -> bool {
        self.queue
            .iter()
            .any(|entry| matches!(entry, QueueEntry::Vehicle(queued) if queued == id))
    }

    pub fn is_side_closed(&self, side: Side) -> bool {
        self.crossing_lanes.get(&side).copied().unwrap_or(false)
    }

    pub fn crossing_lanes(&self) -> &BTreeMap<Side, bool> {
        &self.crossing_lanes
    }

    pub fn active_crossings(&self) -> &[ActiveCrossing] {
        &self.active_crossings
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Adds a fleet vehicle to the back of the queue, starting a new route with
    /// `direction`. Returns false if the vehicle is unknown or already queued.
    pub fn admit_vehicle(&mut self, id: &str, direction: Maneuver) -> bool {
        if self.is_vehicle_queued(id) {
            return false;
        }
        let Some(vehicle) = self.vehicle_mut(id) else {
            log::warn!("Cannot queue unknown vehicle \"{}\"", id);
            return false;
        };
        vehicle.begin_route(direction);
        self.queue.push_back(QueueEntry::Vehicle(id.to_string()));
        log::info!("Added vehicle \"{}\" to the queue, moving: \"{}\"", id, direction);
        true
    }

    /// Adds a pedestrian who will close `side` once it reaches the head of the queue.
    pub fn admit_pedestrian(&mut self, mut pedestrian: Pedestrian, side: Side) {
        pedestrian.direction = side;
        let id = pedestrian.id.clone();
        self.pedestrians.register(pedestrian);
        self.enqueue_pedestrian(id, side);
    }

    /// Applies one pedestrian detection. A detection overlapping a known
    /// pedestrian moves that pedestrian; anything else is a new pedestrian
    /// queued to close `side`.
    pub fn observe_pedestrian(&mut self, bounds: Rect, side: Side) -> PedestrianMatch {
        let matched = self.pedestrians.observe(bounds, side);
        if let PedestrianMatch::New(id) = &matched {
            self.enqueue_pedestrian(id.clone(), side);
        }
        matched
    }

    fn enqueue_pedestrian(&mut self, id: String, side: Side) {
        log::info!("Added pedestrian \"{}\" to the queue, moving: \"{}\"", id, side);
        self.queue.push_back(QueueEntry::Pedestrian(id));
    }

    /// Runs one arbitration tick: pedestrian admission and lane reopening,
    /// then one decision per queued vehicle with a lane fix.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.ticks += 1;
        let mut outcome = TickOutcome::default();
        self.control_pedestrians(now, &mut outcome);
        self.control_vehicles(&mut outcome);
        outcome
    }

    fn control_pedestrians(&mut self, now: Instant, outcome: &mut TickOutcome) {
        while matches!(self.queue.front(), Some(QueueEntry::Pedestrian(_))) {
            let Some(QueueEntry::Pedestrian(id)) = self.queue.pop_front() else {
                break;
            };
            self.start_crossing(id, now, outcome);
        }

        let (expired, running): (Vec<_>, Vec<_>) = self
            .active_crossings
            .drain(..)
            .partition(|crossing| now.saturating_duration_since(crossing.start_time) >= CROSSING_DURATION);
        self.active_crossings = running;

        for crossing in expired {
            let side = crossing.side;
            let still_crossing = self.active_crossings.iter().any(|other| other.side == side);
            if self.reopen_policy == ReopenPolicy::LastCrossing && still_crossing {
                continue;
            }
            if self.is_side_closed(side) {
                self.crossing_lanes.insert(side, false);
                log::info!("lane {} open", side);
                outcome.lane_events.push(LaneEvent {
                    side,
                    kind: LaneEventKind::Reopened,
                    pedestrian_id: crossing.pedestrian_id,
                });
            }
        }
    }

    fn start_crossing(&mut self, id: String, now: Instant, outcome: &mut TickOutcome) {
        let Some(side) = self.pedestrians.pedestrian(&id).map(|pedestrian| pedestrian.direction) else {
            log::warn!("Queued pedestrian \"{}\" has no record, dropping it", id);
            return;
        };
        self.crossing_lanes.insert(side, true);
        log::info!("lane {} closed", side);
        log::info!("Removing Pedestrian {}", id);
        outcome.lane_events.push(LaneEvent {
            side,
            kind: LaneEventKind::Closed,
            pedestrian_id: id.clone(),
        });
        self.active_crossings.push(ActiveCrossing {
            pedestrian_id: id,
            side,
            start_time: now,
        });
    }

    fn control_vehicles(&mut self, outcome: &mut TickOutcome) {
        let queued: Vec<String> = self
            .queue
            .iter()
            .filter_map(|entry| match entry {
                QueueEntry::Vehicle(id) => Some(id.clone()),
                QueueEntry::Pedestrian(_) => None,
            })
            .collect();

        for id in queued {
            let Some(vehicle) = self.vehicles.iter_mut().find(|vehicle| vehicle.id == id) else {
                continue;
            };
            let Some((decision, evict)) = evaluate_vehicle(&self.layout, &self.crossing_lanes, vehicle)
            else {
                continue;
            };
            if evict {
                log::info!("vehicle {} is not visible, removing it from the queue", id);
                outcome.evicted.push(id);
            }
            outcome.decisions.push(decision);
        }

        if !outcome.evicted.is_empty() {
            let evicted = &outcome.evicted;
            self.queue.retain(|entry| match entry {
                QueueEntry::Vehicle(id) => !evicted.contains(id),
                QueueEntry::Pedestrian(_) => true,
            });
        }
    }

    /// The last power vector computed for every fleet vehicle.
    pub fn actuation_commands(&self) -> Vec<ActuationCommand> {
        self.vehicles
            .iter()
            .map(|vehicle| ActuationCommand {
                vehicle_id: vehicle.id.clone(),
                motors: vehicle.motor_command,
            })
            .collect()
    }
}

/// Decides one vehicle's maneuver. Returns `None` when no decision can be made
/// this tick; the flag is true when the vehicle has to leave the queue.
fn evaluate_vehicle(
    layout: &IntersectionLayout,
    crossing_lanes: &BTreeMap<Side, bool>,
    vehicle: &mut Vehicle,
) -> Option<(Decision, bool)> {
    let lane = vehicle.lane?;

    let stop_lane = match vehicle.stop_lane {
        Some(stop_lane) => stop_lane,
        None => {
            let Some(destination) = layout.destination(lane.side, vehicle.direction) else {
                log::warn!(
                    "No destination for vehicle {} turning {} from {}",
                    vehicle.id,
                    vehicle.direction,
                    lane.side
                );
                return None;
            };
            vehicle.stop_lane = Some(destination);
            destination
        }
    };

    let closed = |side: Side| crossing_lanes.get(&side).copied().unwrap_or(false);
    let mut evict = false;

    let (maneuver, speed) = if closed(lane.side) || closed(stop_lane.side) {
        vehicle.turning = false;
        (Maneuver::Forward, HOLD_SPEED)
    } else if lane != stop_lane && layout.intersects_stop_line(&vehicle.bounds) {
        vehicle.turning = true;
        (vehicle.direction, TURN_SPEED)
    } else if lane == stop_lane {
        vehicle.completed_turn = true;
        vehicle.turning = false;
        if vehicle.is_visible {
            (Maneuver::Forward, CRUISE_SPEED)
        } else {
            evict = true;
            (Maneuver::Forward, HOLD_SPEED)
        }
    } else {
        (Maneuver::Forward, CRUISE_SPEED)
    };

    vehicle.motor_command = power_vector(maneuver, speed);
    Some((
        Decision {
            vehicle_id: vehicle.id.clone(),
            lane,
            stop_lane,
            maneuver,
            speed,
            power: vehicle.motor_command,
        },
        evict,
    ))
}
