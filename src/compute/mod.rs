use crate::simulation::SimulationState;

pub mod cpu;

pub use cpu::*;

/// Executes one fixed simulation step: ordering, integration, clock advance.
pub trait SimulationBackend {
    fn update(&mut self, state: &mut SimulationState);
    fn get_name(&self) -> &'static str;
}
