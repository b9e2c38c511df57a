pub mod actuation;
pub mod control_queue;

pub use actuation::{power_vector, PowerVector};
pub use control_queue::{
    ArbitrationEngine, ActiveCrossing, Decision, LaneEvent, LaneEventKind, QueueEntry, ReopenPolicy,
    TickOutcome,
};
