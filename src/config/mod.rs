use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod road;
pub mod vehicles;

pub use road::*;
pub use vehicles::*;

/// Immutable default configuration handed to the scheduler at construction.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ring: RingGeometry,
    pub solver: SolverParams,
    pub vehicles: VehiclesConfig,
    pub noise: NoiseConfig,
    pub flow: FlowParams,
    pub export: ExportParams,
    pub random: RandomConfig,
}

impl SimulationConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<()> {
        self.ring.validate()?;
        self.solver.validate()?;
        self.vehicles.validate()?;
        self.flow.validate()?;
        self.export.validate()?;

        // The braking floor sits below the comfort bound, never above it.
        if self.solver.emergency_decel <= self.vehicles.human.max_decel {
            return Err(anyhow!(
                "Emergency deceleration {} must exceed the comfortable deceleration {}",
                self.solver.emergency_decel, self.vehicles.human.max_decel
            ));
        }

        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
