use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;

/// Geometry of the single-lane ring, in screen pixel units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RingGeometry {
    pub radius: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub vehicle_footprint: f64,
    pub obstacle_footprint: f64,
    /// Distance ahead of the ring leader at which an obstacle is dropped.
    pub obstacle_offset: f64,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self {
            radius: 300.0,
            center_x: 880.0,
            center_y: 360.0,
            vehicle_footprint: 30.0,
            obstacle_footprint: 20.0,
            obstacle_offset: 60.0,
        }
    }
}

impl RingGeometry {
    pub fn circumference(&self) -> f64 {
        std::f64::consts::TAU * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationScheme {
    #[default]
    Euler,
    Rk4,
}

/// How leader state is read while a step is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Vehicles are advanced in place in ascending-angle order; a leader that
    /// was already advanced this step is seen at its new state.
    #[default]
    Sequential,
    /// Every vehicle reads the pre-step snapshot and all updates are committed together.
    Synchronous,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverParams {
    pub steps_per_second: u32,
    /// Sub-steps executed per rendered frame.
    pub step_multiplier: u32,
    pub scheme: IntegrationScheme,
    pub update_policy: UpdatePolicy,
    pub gap_epsilon: f64,
    /// Hard braking floor applied once the comfort deceleration is exceeded.
    pub emergency_decel: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            steps_per_second: 60,
            step_multiplier: 10,
            scheme: IntegrationScheme::Euler,
            update_policy: UpdatePolicy::Sequential,
            gap_epsilon: 0.01,
            emergency_decel: 28.2,
        }
    }
}

impl SolverParams {
    pub fn dt(&self) -> f64 {
        1.0 / self.steps_per_second as f64
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowParams {
    /// Trailing window of simulated seconds over which laps are summed.
    pub window: f64,
    pub wrap_threshold: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window: 60.0,
            wrap_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportParams {
    pub pixels_per_meter: f64,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self { pixels_per_meter: 6.0 }
    }
}

impl Validate for RingGeometry {
    fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0) {
            return Err(anyhow!("Ring radius must be positive"));
        }

        if self.vehicle_footprint <= 0.0 || self.obstacle_footprint <= 0.0 {
            return Err(anyhow!("Entity footprints must be positive"));
        }

        if self.vehicle_footprint >= self.circumference() {
            return Err(anyhow!(
                "Vehicle footprint {} does not fit on a ring of circumference {:.1}",
                self.vehicle_footprint, self.circumference()
            ));
        }

        if self.obstacle_offset < 0.0 {
            return Err(anyhow!("Obstacle offset must be non-negative"));
        }

        Ok(())
    }
}

impl Validate for SolverParams {
    fn validate(&self) -> Result<()> {
        if self.steps_per_second == 0 {
            return Err(anyhow!("Steps per second must be greater than zero"));
        }

        if self.step_multiplier == 0 {
            return Err(anyhow!("Step multiplier must be at least 1"));
        }

        if !(self.gap_epsilon > 0.0) {
            return Err(anyhow!("Gap epsilon must be positive"));
        }

        if !(self.emergency_decel > 0.0) {
            return Err(anyhow!("Emergency deceleration must be positive"));
        }

        Ok(())
    }
}

impl Validate for FlowParams {
    fn validate(&self) -> Result<()> {
        if !(self.window > 0.0) {
            return Err(anyhow!("Flow window must be positive"));
        }

        if self.wrap_threshold < 0.0 || self.wrap_threshold >= std::f64::consts::TAU {
            return Err(anyhow!("Wrap threshold {} must be in range [0, 2π)", self.wrap_threshold));
        }

        Ok(())
    }
}

impl Validate for ExportParams {
    fn validate(&self) -> Result<()> {
        if !(self.pixels_per_meter > 0.0) {
            return Err(anyhow!("Pixels per meter must be positive"));
        }
        Ok(())
    }
}
