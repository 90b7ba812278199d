/// Control input pushed into the scheduler by the UI or configuration layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetVehicleCount(usize),
    SetDesiredSpeed(f64),
    SetTimeHeadway(f64),
    SetMaxAccel(f64),
    SetStepMultiplier(u32),
    SetAutonomousCount(usize),
    SetNoiseEnabled(bool),
    ToggleObstacle,
    SlowDownLeader,
    RestoreLeader,
    ResetSimulation,
    Stop,
}
