use crate::global_variables::AMQP_URL;
use crate::intersection_model::lanes::{LaneId, Maneuver, Side};
use crate::intersection_model::layout::{create_default_layout, IntersectionLayout};
use crate::control_system::control_queue::ReopenPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can be wrong with the static configuration. These are
/// raised at startup only; the per-frame loop never produces them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("the layout does not define any lane corridors")]
    NoCorridors,
    #[error("lane corridor {0} is defined more than once")]
    DuplicateCorridor(LaneId),
    #[error("lane corridor {0} has an empty or inverted rectangle")]
    DegenerateCorridor(LaneId),
    #[error("no stop line defined for side {0}")]
    MissingStopLine(Side),
    #[error("turn mapping has no destination for a {maneuver} maneuver from {side}")]
    MissingTurn { side: Side, maneuver: Maneuver },
    #[error("{context} refers to lane corridor {lane} which is not defined")]
    UnknownLane { lane: LaneId, context: &'static str },
    #[error("the fleet is empty")]
    EmptyFleet,
    #[error("vehicle id '{0}' is used more than once in the fleet")]
    DuplicateVehicle(String),
}

/// A vehicle the arbiter knows how to recognise and command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetVehicle {
    pub id: String,
    /// Reference color as `[r, g, b]`.
    pub color: [u8; 3],
    /// Maneuver the vehicle is given when it joins the queue.
    pub direction: Maneuver,
}

fn default_pedestrian_side() -> Side {
    Side::Bottom
}

fn default_amqp_url() -> String {
    AMQP_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterConfig {
    #[serde(default = "create_default_layout")]
    pub layout: IntersectionLayout,
    /// Layout kept in its own JSON file. Replaces `layout` when set; relative
    /// paths are resolved against the configuration file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_file: Option<PathBuf>,
    pub fleet: Vec<FleetVehicle>,
    /// Side a newly detected pedestrian is assigned to close.
    #[serde(default = "default_pedestrian_side")]
    pub pedestrian_side: Side,
    #[serde(default)]
    pub reopen_policy: ReopenPolicy,
    #[serde(default = "default_amqp_url")]
    pub amqp_url: String,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            layout: create_default_layout(),
            layout_file: None,
            fleet: vec![
                FleetVehicle {
                    id: "green-car".to_string(),
                    color: [201, 197, 134],
                    direction: Maneuver::Right,
                },
                FleetVehicle {
                    id: "orange-car".to_string(),
                    color: [208, 162, 64],
                    direction: Maneuver::Left,
                },
            ],
            pedestrian_side: default_pedestrian_side(),
            reopen_policy: ReopenPolicy::default(),
            amqp_url: default_amqp_url(),
        }
    }
}

impl ArbiterConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path.parent())
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, None)
    }

    fn parse(raw: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: ArbiterConfig = serde_json::from_str(raw)?;
        if let Some(file) = &config.layout_file {
            let resolved = match base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            config.layout = IntersectionLayout::load(&resolved)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise the built-in deployment.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        if self.fleet.is_empty() {
            return Err(ConfigError::EmptyFleet);
        }
        let mut seen = HashSet::new();
        for vehicle in &self.fleet {
            if !seen.insert(vehicle.id.as_str()) {
                return Err(ConfigError::DuplicateVehicle(vehicle.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ArbiterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pedestrian_side, Side::Bottom);
        assert_eq!(config.reopen_policy, ReopenPolicy::PerCrossing);
    }

    #[test]
    fn config_survives_json_round_trip() {
        let json = serde_json::to_string_pretty(&ArbiterConfig::default()).unwrap();
        let parsed = ArbiterConfig::from_json(&json).unwrap();
        assert_eq!(parsed.fleet, ArbiterConfig::default().fleet);
        assert_eq!(parsed.layout, create_default_layout());
    }

    #[test]
    fn duplicate_fleet_ids_fail_startup() {
        let mut config = ArbiterConfig::default();
        let twin = config.fleet[0].clone();
        config.fleet.push(twin);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateVehicle(id)) if id == "green-car"
        ));
    }

    #[test]
    fn empty_fleet_fails_startup() {
        let mut config = ArbiterConfig::default();
        config.fleet.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyFleet)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ArbiterConfig::from_json("{ \"layout\": 3 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config_with_layout_file(dir: &Path, layout_json: Option<&str>) -> PathBuf {
        if let Some(layout_json) = layout_json {
            fs::write(dir.join("layout.json"), layout_json).unwrap();
        }
        let config_path = dir.join("arbiter.json");
        let config = serde_json::json!({
            "layout_file": "layout.json",
            "fleet": [{"id": "green-car", "color": [201, 197, 134], "direction": "right"}]
        });
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn layout_file_is_resolved_next_to_the_config() {
        let dir = scratch_dir("crossing_arbiter_layout_ok");
        let mut layout = create_default_layout();
        layout.lane_midpoints.clear();
        let config_path = write_config_with_layout_file(&dir, Some(&serde_json::to_string(&layout).unwrap()));

        let config = ArbiterConfig::load(&config_path).unwrap();
        assert_eq!(config.layout, layout);
        assert_eq!(config.fleet.len(), 1);
        assert_eq!(config.pedestrian_side, Side::Bottom);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_layout_file_is_an_io_error() {
        let dir = scratch_dir("crossing_arbiter_layout_missing");
        let config_path = write_config_with_layout_file(&dir, None);
        match ArbiterConfig::load(&config_path) {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, dir.join("layout.json")),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_layout_file_is_a_parse_error() {
        let dir = scratch_dir("crossing_arbiter_layout_garbage");
        let config_path = write_config_with_layout_file(&dir, Some("{ \"corridors\": "));
        assert!(matches!(ArbiterConfig::load(&config_path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_layout_file_fails_validation() {
        let dir = scratch_dir("crossing_arbiter_layout_invalid");
        let mut layout = create_default_layout();
        layout.stop_lines.remove(&Side::Right);
        let config_path = write_config_with_layout_file(&dir, Some(&serde_json::to_string(&layout).unwrap()));
        assert!(matches!(
            ArbiterConfig::load(&config_path),
            Err(ConfigError::MissingStopLine(Side::Right))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = std::env::temp_dir().join("crossing_arbiter_missing_config.json");
        assert!(matches!(
            ArbiterConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
