use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;

/// Car-following parameters of the Intelligent Driver Model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdmParams {
    pub desired_speed: f64,
    pub time_headway: f64,
    pub max_accel: f64,
    /// Comfortable deceleration used in the dynamic gap term.
    pub max_decel: f64,
    pub min_gap: f64,
}

impl Default for IdmParams {
    fn default() -> Self {
        Self {
            desired_speed: 180.0, // 30 m/s
            time_headway: 1.5,
            max_accel: 4.38,      // 0.73 m/s^2
            max_decel: 10.02,     // 1.67 m/s^2
            min_gap: 15.0,
        }
    }
}

/// Fields overridden on top of the human baseline for autonomous vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AutonomousProfile {
    pub desired_speed: f64,
    pub time_headway: f64,
    pub max_accel: f64,
}

impl Default for AutonomousProfile {
    fn default() -> Self {
        Self {
            desired_speed: 12.0,
            time_headway: 0.6,
            max_accel: 22.8,
        }
    }
}

impl AutonomousProfile {
    pub fn apply(&self, base: IdmParams) -> IdmParams {
        IdmParams {
            desired_speed: self.desired_speed,
            time_headway: self.time_headway,
            max_accel: self.max_accel,
            ..base
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VehiclesConfig {
    pub count: usize,
    pub autonomous_count: usize,
    /// The manually slowed leader drives at `desired_speed / slow_down_divisor`.
    pub slow_down_divisor: f64,
    pub human: IdmParams,
    pub autonomous: AutonomousProfile,
}

impl Default for VehiclesConfig {
    fn default() -> Self {
        Self {
            count: 30,
            autonomous_count: 0,
            slow_down_divisor: 20.0,
            human: IdmParams::default(),
            autonomous: AutonomousProfile::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub enabled: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

fn validate_params(label: &str, params: &IdmParams) -> Result<()> {
    if !(params.desired_speed > 0.0) {
        return Err(anyhow!("Desired speed for '{}' must be positive", label));
    }

    if !(params.time_headway >= 0.0) {
        return Err(anyhow!("Time headway for '{}' must be non-negative", label));
    }

    if !(params.max_accel > 0.0) || !(params.max_decel > 0.0) {
        return Err(anyhow!("Acceleration values for '{}' must be positive", label));
    }

    if !(params.min_gap >= 0.0) {
        return Err(anyhow!("Minimum gap for '{}' must be non-negative", label));
    }

    Ok(())
}

impl Validate for VehiclesConfig {
    fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(anyhow!("Vehicle count must be greater than zero"));
        }

        if self.autonomous_count > self.count {
            return Err(anyhow!(
                "Autonomous count {} exceeds vehicle count {}",
                self.autonomous_count, self.count
            ));
        }

        if !(self.slow_down_divisor >= 1.0) {
            return Err(anyhow!("Slow-down divisor must be at least 1"));
        }

        validate_params("human", &self.human)?;
        validate_params("autonomous", &self.autonomous.apply(self.human))?;

        Ok(())
    }
}
