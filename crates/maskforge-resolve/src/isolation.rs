use serde::{Deserialize, Serialize};

use maskforge_core::{Priority, Side, PRIORITY_COUNT};

use crate::error::{ResolveError, ResolveResult};

/// Minimum clearance kept around each priority tier's shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsolationTable {
    distances: [f64; PRIORITY_COUNT],
}

impl IsolationTable {
    pub fn new(distances: [f64; PRIORITY_COUNT]) -> Self {
        Self { distances }
    }

    /// Same clearance for every tier.
    pub fn uniform(distance: f64) -> Self {
        Self::new([distance; PRIORITY_COUNT])
    }

    pub fn with(mut self, priority: Priority, distance: f64) -> Self {
        self.distances[priority.index()] = distance;
        self
    }

    pub fn get(&self, priority: Priority) -> f64 {
        self.distances[priority.index()]
    }

    /// Reject negative or non-finite distances. Checked before any fold runs.
    pub fn validate(&self, side: Side) -> ResolveResult<()> {
        for priority in Priority::all() {
            let distance = self.get(priority);
            if !distance.is_finite() || distance < 0.0 {
                return Err(ResolveError::InvalidIsolation {
                    side,
                    priority,
                    distance,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: u8) -> Priority {
        Priority::new(v).unwrap()
    }

    #[test]
    fn test_uniform_table() {
        let table = IsolationTable::uniform(5.0);
        assert!(Priority::all().all(|p| table.get(p) == 5.0));
        assert!(table.validate(Side::Device).is_ok());
    }

    #[test]
    fn test_per_priority_override() {
        let table = IsolationTable::uniform(5.0).with(p(0), 2.0);
        assert_eq!(table.get(p(0)), 2.0);
        assert_eq!(table.get(p(1)), 5.0);
    }

    #[test]
    fn test_zero_is_valid() {
        assert!(IsolationTable::uniform(0.0).validate(Side::Handle).is_ok());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let err = IsolationTable::uniform(5.0)
            .with(p(3), -1.0)
            .validate(Side::Device)
            .unwrap_err();
        match err {
            ResolveError::InvalidIsolation {
                side,
                priority,
                distance,
            } => {
                assert_eq!(side, Side::Device);
                assert_eq!(priority, p(3));
                assert_eq!(distance, -1.0);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_non_finite_distance_rejected() {
        let table = IsolationTable::uniform(f64::INFINITY);
        assert!(table.validate(Side::Handle).is_err());
        let table = IsolationTable::uniform(1.0).with(p(7), f64::NAN);
        assert!(table.validate(Side::Handle).is_err());
    }
}
