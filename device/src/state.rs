use std::fmt;

use crate::sensor::Sensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkstationState {
    /// Nobody at the workstation.
    Empty,
    /// Staffed, but no sensor reports activity.
    Idle,
    Active,
}

impl WorkstationState {
    pub fn derive(num_workers: u8, sensors: &[Sensor]) -> Self {
        if num_workers == 0 {
            WorkstationState::Empty
        } else if sensors.iter().any(|s| s.active) {
            WorkstationState::Active
        } else {
            WorkstationState::Idle
        }
    }
}

impl fmt::Display for WorkstationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkstationState::Empty => "EMPTY",
            WorkstationState::Idle => "IDLE",
            WorkstationState::Active => "ACTIVE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_from_workers_and_sensors() {
        let sensor_sets = [
            vec![],
            vec![Sensor::new(1, "a", false)],
            vec![Sensor::new(1, "a", true)],
            vec![Sensor::new(1, "a", false), Sensor::new(2, "b", true)],
            vec![Sensor::new(1, "a", false), Sensor::new(2, "b", false)],
        ];

        for num_workers in 0..=4 {
            for sensors in &sensor_sets {
                let any_active = sensors.iter().any(|s| s.active);
                let expected = match (num_workers, any_active) {
                    (0, _) => WorkstationState::Empty,
                    (_, false) => WorkstationState::Idle,
                    (_, true) => WorkstationState::Active,
                };
                assert_eq!(
                    WorkstationState::derive(num_workers, sensors),
                    expected,
                    "num_workers={num_workers} sensors={sensors:?}"
                );
            }
        }
    }
}
