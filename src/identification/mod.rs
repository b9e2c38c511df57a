pub mod color_matching;
pub mod pedestrian_tracker;

pub use color_matching::{identify_vehicle, matches_signature, Bgr, Frame};
pub use pedestrian_tracker::{PedestrianMatch, PedestrianTracker};
