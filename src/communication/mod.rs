pub mod transport;

pub use transport::{
    apply_telemetry, decode_telemetry, listen_vehicle_telemetry, ActuationOutput, ActuationSink,
    AmqpActuationSink, RecordingSink, TransportError,
};
