use crate::entities::TelemetryHandle;
use crate::global_variables::{QUEUE_ACTUATION_COMMANDS, QUEUE_VEHICLE_TELEMETRY};
use crate::shared_data::{ActuationCommand, TelemetryReport};
use amiquip::{
    Channel, Connection, ConsumerMessage, ConsumerOptions, Exchange, Publish, QueueDeclareOptions,
    Result as AmiquipResult,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] amiquip::Error),
    #[error("failed to encode actuation command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("telemetry listener task failed: {0}")]
    Listener(#[from] tokio::task::JoinError),
}

/// Where actuation commands go once the arbiter has decided them.
pub trait ActuationSink {
    fn send(&mut self, command: &ActuationCommand) -> Result<(), TransportError>;

    fn send_all(&mut self, commands: &[ActuationCommand]) -> Result<(), TransportError> {
        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }
}

/// Publishes commands as JSON on the `actuation_commands` queue.
pub struct AmqpActuationSink {
    connection: Connection,
    channel: Channel,
}

impl AmqpActuationSink {
    pub fn connect(url: &str) -> AmiquipResult<Self> {
        let mut connection = Connection::insecure_open(url)?;
        let channel = connection.open_channel(None)?;
        channel.queue_declare(QUEUE_ACTUATION_COMMANDS, QueueDeclareOptions::default())?;
        Ok(Self {
            connection,
            channel,
        })
    }

    pub fn close(self) -> AmiquipResult<()> {
        self.channel.close()?;
        self.connection.close()
    }
}

impl ActuationSink for AmqpActuationSink {
    fn send(&mut self, command: &ActuationCommand) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(command)?;
        Exchange::direct(&self.channel).publish(Publish::new(&payload, QUEUE_ACTUATION_COMMANDS))?;
        Ok(())
    }
}

/// Keeps every command in memory. Used when no broker is reachable, and in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<ActuationCommand>,
}

impl ActuationSink for RecordingSink {
    fn send(&mut self, command: &ActuationCommand) -> Result<(), TransportError> {
        self.sent.push(command.clone());
        Ok(())
    }
}

/// The broker when one is reachable, memory otherwise.
pub enum ActuationOutput {
    Broker(AmqpActuationSink),
    Memory(RecordingSink),
}

impl ActuationOutput {
    pub fn connect_or_record(url: &str) -> Self {
        match AmqpActuationSink::connect(url) {
            Ok(sink) => ActuationOutput::Broker(sink),
            Err(e) => {
                log::warn!("Broker unavailable ({}); actuation commands are kept in memory", e);
                ActuationOutput::Memory(RecordingSink::default())
            }
        }
    }

    /// Closes the broker connection. Returns the commands kept in memory, if any.
    pub fn finish(self) -> Result<Vec<ActuationCommand>, TransportError> {
        match self {
            ActuationOutput::Broker(sink) => {
                sink.close()?;
                Ok(Vec::new())
            }
            ActuationOutput::Memory(sink) => Ok(sink.sent),
        }
    }
}

impl ActuationSink for ActuationOutput {
    fn send(&mut self, command: &ActuationCommand) -> Result<(), TransportError> {
        match self {
            ActuationOutput::Broker(sink) => sink.send(command),
            ActuationOutput::Memory(sink) => sink.send(command),
        }
    }
}

/// Writes a telemetry report into its vehicle's slot. Returns false for
/// vehicles outside the fleet.
pub fn apply_telemetry(board: &HashMap<String, TelemetryHandle>, report: TelemetryReport) -> bool {
    match board.get(&report.name) {
        Some(handle) => {
            handle.update(report.into());
            true
        }
        None => {
            log::warn!("Telemetry from unknown vehicle \"{}\" dropped", report.name);
            false
        }
    }
}

/// Decodes one telemetry delivery. Keep-alive frames (`pong`, `A`) yield `None`.
pub fn decode_telemetry(body: &[u8]) -> Option<TelemetryReport> {
    let text = std::str::from_utf8(body).ok()?;
    if text.contains("pong") || text == "A" {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(report) => Some(report),
        Err(e) => {
            log::debug!("Ignoring malformed telemetry {:?}: {}", text, e);
            None
        }
    }
}

// Blocking consumer loop on the "vehicle_telemetry" queue.
fn consume_vehicle_telemetry(url: &str, board: HashMap<String, TelemetryHandle>) -> AmiquipResult<()> {
    let mut connection = Connection::insecure_open(url)?;
    let channel = connection.open_channel(None)?;
    let queue = channel.queue_declare(QUEUE_VEHICLE_TELEMETRY, QueueDeclareOptions::default())?;
    let consumer = queue.consume(ConsumerOptions::default())?;
    log::info!("Waiting for vehicle telemetry on '{}'...", QUEUE_VEHICLE_TELEMETRY);

    for message in consumer.receiver() {
        match message {
            ConsumerMessage::Delivery(delivery) => {
                if let Some(report) = decode_telemetry(&delivery.body) {
                    apply_telemetry(&board, report);
                }
                consumer.ack(delivery)?;
            }
            other => {
                log::warn!("Telemetry consumer ended: {:?}", other);
                break;
            }
        }
    }
    connection.close()
}

/// Runs the telemetry consumer on a blocking task until the broker closes it.
pub async fn listen_vehicle_telemetry(
    url: String,
    board: HashMap<String, TelemetryHandle>,
) -> Result<(), TransportError> {
    tokio::task::spawn_blocking(move || consume_vehicle_telemetry(&url, board)).await??;
    Ok(())
}
