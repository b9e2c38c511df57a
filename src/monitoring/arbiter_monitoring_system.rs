use crate::communication::transport::{ActuationSink, AmqpActuationSink, TransportError};
use crate::config::ArbiterConfig;
use crate::global_variables::{DECISIONS_CSV, LANE_EVENTS_CSV, OVERLAY_PNG};
use crate::monitoring::decision_log::{read_csv, summarize, ReportSummary};
use crate::monitoring::overlay::render_overlay;
use crate::shared_data::{ActuationCommand, DecisionRecord, LaneEventRecord};
use std::collections::BTreeMap;
use std::error::Error;
use std::io::{stdin, stdout, Write};
use std::path::Path;

/// Reads and displays records from the decision log.
pub fn show_decisions() -> Result<(), Box<dyn Error>> {
    let records: Vec<DecisionRecord> = read_csv(Path::new(DECISIONS_CSV))?;
    println!("Arbitration Decisions:");
    for record in records {
        println!(
            "[tick {}] {} in {} -> {} ({}) speed {} motors [{}, {}, {}, {}]",
            record.tick,
            record.vehicle_id,
            record.lane,
            record.stop_lane,
            record.maneuver,
            record.speed,
            record.p0,
            record.p1,
            record.p2,
            record.p3
        );
    }
    Ok(())
}

/// Reads and displays records from the lane event log.
pub fn show_lane_events() -> Result<(), Box<dyn Error>> {
    let records: Vec<LaneEventRecord> = read_csv(Path::new(LANE_EVENTS_CSV))?;
    println!("Lane Events:");
    for record in records {
        println!(
            "[tick {}] {} side {} ({})",
            record.tick, record.side, record.event, record.pedestrian_id
        );
    }
    Ok(())
}

fn read_or_empty<T: serde::de::DeserializeOwned>(filename: &str) -> Result<Vec<T>, Box<dyn Error>> {
    if Path::new(filename).exists() {
        read_csv(Path::new(filename))
    } else {
        Ok(Vec::new())
    }
}

pub fn generate_report_summary() -> Result<ReportSummary, Box<dyn Error>> {
    let decisions: Vec<DecisionRecord> = read_or_empty(DECISIONS_CSV)?;
    let events: Vec<LaneEventRecord> = read_or_empty(LANE_EVENTS_CSV)?;
    let summary = summarize(&decisions, &events);

    println!("Report Summary:");
    println!("Decisions: {} records for {} vehicles", summary.decisions, summary.vehicles);
    for (maneuver, count) in &summary.by_maneuver {
        println!("  {}: {}", maneuver, count);
    }
    println!("Holds at zero speed: {}", summary.holds);
    println!("Lane closures: {}", summary.closures);
    println!("Lane reopenings: {}", summary.reopenings);
    Ok(summary)
}

/// Renders the configured layout with no detections.
pub fn render_layout(config: &ArbiterConfig) -> Result<(), Box<dyn Error>> {
    render_overlay(Path::new(OVERLAY_PNG), &config.layout, &BTreeMap::new(), &[])?;
    println!("Layout overlay saved to {}", OVERLAY_PNG);
    Ok(())
}

/// Publishes a zero power vector for one vehicle.
pub fn send_manual_stop(url: &str, vehicle_id: String) -> Result<(), TransportError> {
    let mut sink = AmqpActuationSink::connect(url)?;
    sink.send(&ActuationCommand {
        vehicle_id,
        motors: [0.0; 4],
    })?;
    sink.close()?;
    Ok(())
}

fn prompt(message: &str) -> Option<String> {
    print!("{}", message);
    stdout().flush().ok()?;
    let mut input = String::new();
    match stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

/// Provides a simple CLI for operator tasks.
pub fn run_cli(config: &ArbiterConfig) {
    loop {
        println!("\nCrossing Arbiter Monitoring CLI");
        println!("1. Display Arbitration Decisions");
        println!("2. Display Lane Events");
        println!("3. Generate Report Summary");
        println!("4. Render Layout Overlay");
        println!("5. Manually Stop a Vehicle");
        println!("6. Exit");
        let Some(input) = prompt("Enter your choice: ") else {
            println!("Exiting CLI.");
            break;
        };
        match input.parse::<u32>().unwrap_or(0) {
            1 => {
                if let Err(e) = show_decisions() {
                    eprintln!("Error displaying decisions: {}", e);
                }
            }
            2 => {
                if let Err(e) = show_lane_events() {
                    eprintln!("Error displaying lane events: {}", e);
                }
            }
            3 => {
                if let Err(e) = generate_report_summary() {
                    eprintln!("Error generating report: {}", e);
                }
            }
            4 => {
                if let Err(e) = render_layout(config) {
                    eprintln!("Error rendering overlay: {}", e);
                }
            }
            5 => {
                let Some(vehicle_id) = prompt("Enter vehicle id to stop: ") else {
                    continue;
                };
                if !config.fleet.iter().any(|vehicle| vehicle.id == vehicle_id) {
                    println!("Unknown vehicle {}", vehicle_id);
                    continue;
                }
                match send_manual_stop(&config.amqp_url, vehicle_id.clone()) {
                    Ok(()) => println!("Stop command sent to {}", vehicle_id),
                    Err(e) => eprintln!("Error sending stop command: {}", e),
                }
            }
            6 => {
                println!("Exiting CLI.");
                break;
            }
            _ => println!("Invalid choice. Try again."),
        }
    }
}
