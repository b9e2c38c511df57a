use crate::intersection_model::geometry::Rect;
use crate::intersection_model::lanes::Side;

/// A pedestrian waiting to cross, or crossing, one side of the intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct Pedestrian {
    pub id: String,
    pub bounds: Rect,
    /// Side whose crosswalk this pedestrian closes.
    pub direction: Side,
}

impl Pedestrian {
    pub fn new(id: impl Into<String>, bounds: Rect, direction: Side) -> Self {
        Self {
            id: id.into(),
            bounds,
            direction,
        }
    }
}
