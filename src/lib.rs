pub mod config;
pub mod error;
pub mod simulation;
pub mod compute;
pub mod recorder;
pub mod scheduler;

pub use simulation::*;
pub use config::*;
pub use error::{SimError, SimResult};
pub use scheduler::{Command, FrameReport, Scheduler, SimulationView};
