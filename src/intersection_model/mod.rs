pub mod geometry;
pub mod lanes;
pub mod layout;

pub use geometry::{overlap_area, segment_intersects_rect, segments_intersect, Point, Rect, Segment};
pub use lanes::{lane_label, LaneCorridor, LaneId, Maneuver, Orientation, Side};
pub use layout::{create_default_layout, IntersectionLayout, TurnMapping};
