use thiserror::Error;

use crate::simulation::VehicleId;

/// A command or parameter change the core refused to apply.
///
/// Every rejection leaves the simulation exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("vehicle count must be greater than zero")]
    InvalidVehicleCount,

    #[error("cannot make {requested} vehicles autonomous, only {available} on the ring")]
    TooManyAutonomous { requested: usize, available: usize },

    #[error("the ring has no vehicles")]
    EmptyRing,

    #[error("no leader has been slowed down")]
    NoLeaderRecorded,

    #[error("vehicle {id} would have degenerate dynamics (max accel {max_accel}, max decel {max_decel})")]
    DegenerateDynamics {
        id: VehicleId,
        max_accel: f64,
        max_decel: f64,
    },
}

pub type SimResult<T> = Result<T, SimError>;
