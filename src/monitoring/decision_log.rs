use crate::control_system::control_queue::LaneEventKind;
use crate::pipeline::frame_processor::FrameReport;
use crate::shared_data::{DecisionRecord, LaneEventRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;

// Appends records to a CSV file, writing the header only when the file is new.
pub fn log_to_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Box<dyn Error>> {
    if records.is_empty() {
        return Ok(());
    }
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

pub fn decision_records(report: &FrameReport, timestamp: u64) -> Vec<DecisionRecord> {
    report
        .outcome
        .decisions
        .iter()
        .map(|decision| DecisionRecord {
            timestamp,
            tick: report.tick,
            vehicle_id: decision.vehicle_id.clone(),
            lane: decision.lane.to_string(),
            stop_lane: decision.stop_lane.to_string(),
            maneuver: decision.maneuver.to_string(),
            speed: decision.speed,
            p0: decision.power[0],
            p1: decision.power[1],
            p2: decision.power[2],
            p3: decision.power[3],
        })
        .collect()
}

pub fn lane_event_records(report: &FrameReport, timestamp: u64) -> Vec<LaneEventRecord> {
    report
        .outcome
        .lane_events
        .iter()
        .map(|event| LaneEventRecord {
            timestamp,
            tick: report.tick,
            side: event.side.to_string(),
            event: match event.kind {
                LaneEventKind::Closed => "closed".to_string(),
                LaneEventKind::Reopened => "reopened".to_string(),
            },
            pedestrian_id: event.pedestrian_id.clone(),
        })
        .collect()
}

/// Appends a frame's decisions and lane events to their logs. Failures are
/// reported but never interrupt the control loop.
pub fn log_frame_report(report: &FrameReport, timestamp: u64, decisions_path: &Path, events_path: &Path) {
    if let Err(e) = log_to_csv(decisions_path, &decision_records(report, timestamp)) {
        log::warn!("Error logging decisions: {}", e);
    }
    if let Err(e) = log_to_csv(events_path, &lane_event_records(report, timestamp)) {
        log::warn!("Error logging lane events: {}", e);
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ReportSummary {
    pub decisions: usize,
    pub by_maneuver: BTreeMap<String, usize>,
    pub holds: usize,
    pub vehicles: usize,
    pub closures: usize,
    pub reopenings: usize,
}

pub fn summarize(decisions: &[DecisionRecord], events: &[LaneEventRecord]) -> ReportSummary {
    let mut summary = ReportSummary {
        decisions: decisions.len(),
        ..ReportSummary::default()
    };
    let mut vehicles = std::collections::BTreeSet::new();
    for decision in decisions {
        *summary.by_maneuver.entry(decision.maneuver.clone()).or_default() += 1;
        if decision.speed == 0.0 {
            summary.holds += 1;
        }
        vehicles.insert(decision.vehicle_id.as_str());
    }
    summary.vehicles = vehicles.len();
    for event in events {
        match event.event.as_str() {
            "closed" => summary.closures += 1,
            "reopened" => summary.reopenings += 1,
            _ => {}
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_system::control_queue::{Decision, LaneEvent, TickOutcome};
    use crate::intersection_model::lanes::{Maneuver, Side};
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}.csv", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn report() -> FrameReport {
        FrameReport {
            tick: 4,
            outcome: TickOutcome {
                decisions: vec![
                    Decision {
                        vehicle_id: "green-car".to_string(),
                        lane: "top-forward".parse().unwrap(),
                        stop_lane: "left-backward".parse().unwrap(),
                        maneuver: Maneuver::Right,
                        speed: 100.0,
                        power: [100.0, 13.0, 100.0, 13.0],
                    },
                    Decision {
                        vehicle_id: "orange-car".to_string(),
                        lane: "bottom-forward".parse().unwrap(),
                        stop_lane: "left-backward".parse().unwrap(),
                        maneuver: Maneuver::Forward,
                        speed: 0.0,
                        power: [0.0; 4],
                    },
                ],
                lane_events: vec![LaneEvent {
                    side: Side::Bottom,
                    kind: LaneEventKind::Closed,
                    pedestrian_id: "pedestrian_0".to_string(),
                }],
                evicted: vec![],
            },
            annotations: vec![],
            commands: vec![],
        }
    }

    #[test]
    fn decisions_are_flattened_for_the_log() {
        let records = decision_records(&report(), 1_700_000_000);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].lane, "top-forward");
        assert_eq!(records[0].maneuver, "right");
        assert_eq!(records[0].p1, 13.0);
        assert_eq!(records[1].tick, 4);
    }

    #[test]
    fn logs_append_and_read_back() {
        let decisions = scratch_file("crossing_arbiter_decisions");
        let events = scratch_file("crossing_arbiter_events");
        log_frame_report(&report(), 10, &decisions, &events);
        log_frame_report(&report(), 11, &decisions, &events);

        let decision_rows: Vec<DecisionRecord> = read_csv(&decisions).unwrap();
        let event_rows: Vec<LaneEventRecord> = read_csv(&events).unwrap();
        assert_eq!(decision_rows.len(), 4);
        assert_eq!(decision_rows[2].timestamp, 11);
        assert_eq!(event_rows.len(), 2);
        assert_eq!(event_rows[0].event, "closed");

        let summary = summarize(&decision_rows, &event_rows);
        assert_eq!(summary.decisions, 4);
        assert_eq!(summary.holds, 2);
        assert_eq!(summary.vehicles, 2);
        assert_eq!(summary.by_maneuver["right"], 2);
        assert_eq!(summary.closures, 2);
        assert_eq!(summary.reopenings, 0);

        let _ = std::fs::remove_file(&decisions);
        let _ = std::fs::remove_file(&events);
    }

    #[test]
    fn empty_batches_do_not_create_files() {
        let path = scratch_file("crossing_arbiter_empty");
        log_to_csv::<DecisionRecord>(&path, &[]).unwrap();
        assert!(!path.exists());
    }
}
