// replay_main.rs
use crossing_arbiter::communication::transport::{listen_vehicle_telemetry, ActuationOutput, ActuationSink};
use crossing_arbiter::config::ArbiterConfig;
use crossing_arbiter::global_variables::{DECISIONS_CSV, LANE_EVENTS_CSV, OVERLAY_PNG};
use crossing_arbiter::monitoring::decision_log::log_frame_report;
use crossing_arbiter::monitoring::overlay::render_overlay;
use crossing_arbiter::pipeline::frame_processor::FrameProcessor;
use crossing_arbiter::pipeline::replay::read_replay;
use crossing_arbiter::shared_data::current_timestamp;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let replay_path = args
        .next()
        .ok_or("usage: replay_main <replay.jsonl> [config.json]")?;
    let config = ArbiterConfig::load_or_default(args.next().as_deref())?;
    let frames = read_replay(BufReader::new(File::open(&replay_path)?))?;
    log::info!("Loaded {} frames from {}", frames.len(), replay_path);

    let mut processor = FrameProcessor::new(&config);

    let mut sink = ActuationOutput::connect_or_record(&config.amqp_url);

    // Telemetry is informational; the replay keeps going if the listener stops.
    let board = processor.telemetry_board();
    let amqp_url = config.amqp_url.clone();
    tokio::spawn(async move {
        if let Err(e) = listen_vehicle_telemetry(amqp_url, board).await {
            log::warn!("Telemetry listener stopped: {}", e);
        }
    });

    let start = Instant::now();
    let mut last_report = None;
    for frame in &frames {
        let at = start + Duration::from_millis(frame.elapsed_ms);
        tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await;

        let report = processor.process(&frame.synthesize_frame(), &frame.detections(), at);
        log_frame_report(
            &report,
            current_timestamp(),
            Path::new(DECISIONS_CSV),
            Path::new(LANE_EVENTS_CSV),
        );
        if let Err(e) = sink.send_all(&report.commands) {
            log::error!("Failed to send actuation commands: {}", e);
        }
        last_report = Some(report);
    }

    match sink.finish() {
        Ok(kept) if !kept.is_empty() => log::info!("{} actuation commands were kept in memory", kept.len()),
        Ok(_) => {}
        Err(e) => log::warn!("Failed to close the actuation connection: {}", e),
    }

    if let Some(report) = last_report {
        render_overlay(
            Path::new(OVERLAY_PNG),
            processor.engine().layout(),
            processor.engine().crossing_lanes(),
            &report.annotations,
        )?;
    }
    log::info!("Replay finished after {} ticks", processor.engine().ticks());
    Ok(())
}
