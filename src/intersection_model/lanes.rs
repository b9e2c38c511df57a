use crate::intersection_model::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four approaches of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Side::Top),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// Whether a corridor carries traffic towards the intersection (`Forward`)
/// or away from it (`Backward`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Forward,
    Backward,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Forward => "forward",
            Orientation::Backward => "backward",
        }
    }
}

/// A lane-level maneuver a vehicle can be commanded to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Maneuver {
    Forward,
    Left,
    Right,
}

impl Maneuver {
    pub const ALL: [Maneuver; 3] = [Maneuver::Forward, Maneuver::Left, Maneuver::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Maneuver::Forward => "forward",
            Maneuver::Left => "left",
            Maneuver::Right => "right",
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a lane corridor, written `<side>-<orientation>` (e.g. `top-backward`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LaneId {
    pub side: Side,
    pub orientation: Orientation,
}

impl LaneId {
    pub const fn new(side: Side, orientation: Orientation) -> Self {
        Self { side, orientation }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.side.as_str(), self.orientation.as_str())
    }
}

impl FromStr for LaneId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, orientation) = s
            .split_once('-')
            .ok_or_else(|| format!("lane id '{}' is not of the form <side>-<orientation>", s))?;
        let orientation = match orientation {
            "forward" => Orientation::Forward,
            "backward" => Orientation::Backward,
            other => return Err(format!("unknown orientation '{}'", other)),
        };
        Ok(Self {
            side: side.parse()?,
            orientation,
        })
    }
}

impl From<LaneId> for String {
    fn from(id: LaneId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for LaneId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Label used for entities without a lane fix.
pub const UNDEFINED_LANE: &str = "Undefined";

pub fn lane_label(lane: Option<LaneId>) -> String {
    match lane {
        Some(id) => id.to_string(),
        None => UNDEFINED_LANE.to_string(),
    }
}

/// A rectangular lane corridor spanned by two boundary points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneCorridor {
    pub id: LaneId,
    /// Top-left and bottom-right boundary points.
    pub corners: (Point, Point),
}

impl LaneCorridor {
    pub fn new(id: LaneId, top_left: Point, bottom_right: Point) -> Self {
        Self {
            id,
            corners: (top_left, bottom_right),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.corners.0, self.corners.1)
    }
}
