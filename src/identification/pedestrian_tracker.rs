use crate::entities::Pedestrian;
use crate::intersection_model::geometry::{overlap_area, Rect};
use crate::intersection_model::lanes::Side;

/// Result of matching one pedestrian detection against the tracked set.
#[derive(Debug, Clone, PartialEq)]
pub enum PedestrianMatch {
    /// Overlapped a known pedestrian, whose bounds were updated.
    Known(String),
    /// Nothing overlapped; a new pedestrian was registered.
    New(String),
}

/// Every pedestrian seen so far, with frame-to-frame identities by
/// bounding-box overlap. Records are never pruned.
#[derive(Debug, Default)]
pub struct PedestrianTracker {
    pedestrians: Vec<Pedestrian>,
    next_id: u64,
}

impl PedestrianTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pedestrians(&self) -> &[Pedestrian] {
        &self.pedestrians
    }

    pub fn pedestrian(&self, id: &str) -> Option<&Pedestrian> {
        self.pedestrians.iter().find(|pedestrian| pedestrian.id == id)
    }

    /// Adds a pedestrian created elsewhere, replacing any record with the same id.
    pub fn register(&mut self, pedestrian: Pedestrian) {
        match self.pedestrians.iter_mut().find(|known| known.id == pedestrian.id) {
            Some(known) => *known = pedestrian,
            None => self.pedestrians.push(pedestrian),
        }
    }

    /// Matches `bounds` against the tracked pedestrians. The first one with a
    /// non-zero overlap takes the new bounds and keeps its identity; otherwise
    /// a new pedestrian heading for `side` is registered.
    pub fn observe(&mut self, bounds: Rect, side: Side) -> PedestrianMatch {
        if let Some(known) = self
            .pedestrians
            .iter_mut()
            .find(|known| overlap_area(&known.bounds, &bounds) > 0)
        {
            known.bounds = bounds;
            return PedestrianMatch::Known(known.id.clone());
        }

        let id = format!("pedestrian_{}", self.next_id);
        self.next_id += 1;
        self.pedestrians.push(Pedestrian::new(id.clone(), bounds, side));
        PedestrianMatch::New(id)
    }
}
