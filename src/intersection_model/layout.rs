use crate::config::ConfigError;
use crate::intersection_model::geometry::{overlap_area, segment_intersects_rect, Point, Rect, Segment};
use crate::intersection_model::lanes::{LaneCorridor, LaneId, Maneuver, Orientation, Side};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Maps an entry side and an intended maneuver to the destination corridor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnMapping(pub BTreeMap<Side, BTreeMap<Maneuver, LaneId>>);

impl TurnMapping {
    pub fn destination(&self, entry: Side, maneuver: Maneuver) -> Option<LaneId> {
        self.0.get(&entry)?.get(&maneuver).copied()
    }

    pub fn insert(&mut self, entry: Side, maneuver: Maneuver, destination: LaneId) {
        self.0.entry(entry).or_default().insert(maneuver, destination);
    }
}

/// Static geometry of the intersection as seen by the ceiling camera.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionLayout {
    /// Road edges and lane separators, used only for rendering.
    pub boundary_lines: Vec<Segment>,
    pub stop_lines: BTreeMap<Side, Segment>,
    /// Lane corridors in evaluation order.
    pub corridors: Vec<LaneCorridor>,
    pub turn_mapping: TurnMapping,
    /// Midpoint of each corridor's stop line, used only for rendering.
    #[serde(default)]
    pub lane_midpoints: BTreeMap<LaneId, Point>,
}

impl IntersectionLayout {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout: IntersectionLayout = serde_json::from_str(&raw)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Checks the tables are complete and self-consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corridors.is_empty() {
            return Err(ConfigError::NoCorridors);
        }

        let mut known = HashSet::new();
        for corridor in &self.corridors {
            if !known.insert(corridor.id) {
                return Err(ConfigError::DuplicateCorridor(corridor.id));
            }
            if corridor.bounds().is_degenerate() {
                return Err(ConfigError::DegenerateCorridor(corridor.id));
            }
        }

        for side in Side::ALL {
            if !self.stop_lines.contains_key(&side) {
                return Err(ConfigError::MissingStopLine(side));
            }
        }

        for side in Side::ALL {
            for maneuver in Maneuver::ALL {
                let destination = self
                    .turn_mapping
                    .destination(side, maneuver)
                    .ok_or(ConfigError::MissingTurn { side, maneuver })?;
                if !known.contains(&destination) {
                    return Err(ConfigError::UnknownLane {
                        lane: destination,
                        context: "turn mapping",
                    });
                }
            }
        }

        for lane in self.lane_midpoints.keys() {
            if !known.contains(lane) {
                return Err(ConfigError::UnknownLane {
                    lane: *lane,
                    context: "lane midpoint table",
                });
            }
        }
        Ok(())
    }

    /// Picks the corridor sharing the largest area with `bounds`.
    /// Ties keep the corridor listed first; no overlap at all gives `None`.
    pub fn assign_lane(&self, bounds: &Rect) -> Option<LaneId> {
        let mut best_area = 0;
        let mut best = None;
        for corridor in &self.corridors {
            let area = overlap_area(bounds, &corridor.bounds());
            if area > best_area {
                best_area = area;
                best = Some(corridor.id);
            }
        }
        best
    }

    pub fn destination(&self, entry: Side, maneuver: Maneuver) -> Option<LaneId> {
        self.turn_mapping.destination(entry, maneuver)
    }

    /// Whether `bounds` straddles any of the stop lines, i.e. sits in the intersection footprint.
    pub fn intersects_stop_line(&self, bounds: &Rect) -> bool {
        self.stop_lines
            .values()
            .any(|line| segment_intersects_rect(line, bounds))
    }
}

fn line(x1: i32, y1: i32, x2: i32, y2: i32) -> Segment {
    Segment(Point(x1, y1), Point(x2, y2))
}

/// The 640x640 ceiling-camera layout of the model intersection.
pub fn create_default_layout() -> IntersectionLayout {
    use Orientation::{Backward, Forward};

    let boundary_lines = vec![
        // octagon
        line(322, 97, 379, 191),
        line(375, 384, 325, 470),
        line(168, 378, 217, 470),
        line(219, 97, 170, 187),
        // top lane
        line(221, 0, 220, 97),
        line(274, 0, 273, 94),
        line(327, 0, 323, 93),
        // bottom lane
        line(217, 474, 215, 613),
        line(271, 476, 268, 613),
        line(324, 476, 322, 613),
        // right lane
        line(380, 192, 589, 194),
        line(379, 289, 591, 291),
        line(377, 383, 589, 392),
        // left lane
        line(27, 184, 168, 185),
        line(23, 279, 167, 284),
        line(23, 370, 167, 379),
        // outer frame
        line(30, 13, 221, 8),
        line(325, 8, 589, 8),
        line(30, 13, 16, 615),
        line(589, 8, 588, 613),
        line(16, 615, 588, 613),
    ];

    let stop_lines = BTreeMap::from([
        (Side::Top, line(218, 95, 324, 95)),
        (Side::Bottom, line(216, 474, 325, 475)),
        (Side::Right, line(380, 192, 376, 384)),
        (Side::Left, line(168, 185, 168, 378)),
    ]);

    // Each corridor spans from the start of one separator to the end of the next.
    let corridor = |side, orientation, from: usize, to: usize| {
        LaneCorridor::new(
            LaneId::new(side, orientation),
            boundary_lines[from].0,
            boundary_lines[to].1,
        )
    };
    let corridors = vec![
        corridor(Side::Top, Backward, 5, 6),
        corridor(Side::Top, Forward, 4, 5),
        corridor(Side::Bottom, Backward, 7, 8),
        corridor(Side::Bottom, Forward, 8, 9),
        corridor(Side::Right, Backward, 11, 12),
        corridor(Side::Right, Forward, 10, 11),
        corridor(Side::Left, Backward, 13, 14),
        corridor(Side::Left, Forward, 14, 15),
    ];

    let exit = |side| LaneId::new(side, Backward);
    let mut turn_mapping = TurnMapping::default();
    for (entry, forward, right, left) in [
        (Side::Top, Side::Bottom, Side::Left, Side::Right),
        (Side::Bottom, Side::Top, Side::Right, Side::Left),
        (Side::Right, Side::Left, Side::Top, Side::Bottom),
        (Side::Left, Side::Right, Side::Bottom, Side::Top),
    ] {
        turn_mapping.insert(entry, Maneuver::Forward, exit(forward));
        turn_mapping.insert(entry, Maneuver::Right, exit(right));
        turn_mapping.insert(entry, Maneuver::Left, exit(left));
    }

    let lane_midpoints = BTreeMap::from([
        (LaneId::new(Side::Bottom, Forward), Point(298, 475)),
        (LaneId::new(Side::Bottom, Backward), Point(243, 474)),
        (LaneId::new(Side::Top, Forward), Point(244, 95)),
        (LaneId::new(Side::Top, Backward), Point(297, 95)),
        (LaneId::new(Side::Left, Forward), Point(168, 329)),
        (LaneId::new(Side::Left, Backward), Point(168, 233)),
        (LaneId::new(Side::Right, Forward), Point(379, 240)),
        (LaneId::new(Side::Right, Backward), Point(377, 336)),
    ]);

    IntersectionLayout {
        boundary_lines,
        stop_lines,
        corridors,
        turn_mapping,
        lane_midpoints,
    }
}
