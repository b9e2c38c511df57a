pub mod pedestrians;
pub mod vehicles;

pub use pedestrians::Pedestrian;
pub use vehicles::{Telemetry, TelemetryHandle, Vehicle};
