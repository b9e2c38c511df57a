use crate::intersection_model::lanes::Maneuver;

/// Per-wheel power, in the motor driver's wheel order.
pub type PowerVector = [f64; 4];

const STRAIGHT_PATH: PowerVector = [1.0, 1.0, 1.0, 1.0];
const RIGHT_PATH: PowerVector = [1.0, 0.13, 1.0, 0.13];
const LEFT_PATH: PowerVector = [0.35, 1.0, 0.35, 1.0];

fn ratio_template(maneuver: Maneuver) -> PowerVector {
    match maneuver {
        Maneuver::Forward => STRAIGHT_PATH,
        Maneuver::Right => RIGHT_PATH,
        Maneuver::Left => LEFT_PATH,
    }
}

/// Scales the maneuver's ratio template by `speed`.
pub fn power_vector(maneuver: Maneuver, speed: f64) -> PowerVector {
    ratio_template(maneuver).map(|ratio| ratio * speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_drives_all_wheels_equally() {
        assert_eq!(power_vector(Maneuver::Forward, 55.0), [55.0; 4]);
    }

    #[test]
    fn right_turn_slows_the_right_wheels() {
        let power = power_vector(Maneuver::Right, 100.0);
        assert_eq!(power[0], 100.0);
        assert_eq!(power[2], 100.0);
        assert!((power[1] - 13.0).abs() < 1e-9);
        assert!((power[3] - 13.0).abs() < 1e-9);
    }

    #[test]
    fn left_turn_slows_the_left_wheels() {
        let power = power_vector(Maneuver::Left, 100.0);
        assert!((power[0] - 35.0).abs() < 1e-9);
        assert_eq!(power[1], 100.0);
        assert!((power[2] - 35.0).abs() < 1e-9);
        assert_eq!(power[3], 100.0);
    }

    #[test]
    fn zero_speed_is_a_full_stop_for_every_maneuver() {
        for maneuver in Maneuver::ALL {
            assert_eq!(power_vector(maneuver, 0.0), [0.0; 4]);
        }
    }
}
