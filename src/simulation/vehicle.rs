use super::physics::KinematicState;
use super::ring::normalize_angle;
use super::{RoadEntity, VehicleId};
use crate::config::{AutonomousProfile, IdmParams, RingGeometry};
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Human,
    Autonomous,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Unrolled distance travelled along the ring.
    arc_position: f64,
    angle: f64,
    previous_angle: f64,
    speed: f64,
    acceleration: f64,
    footprint: f64,
    radius: f64,
    params: IdmParams,
    /// Noise-free baseline the live parameters are restored from.
    core: IdmParams,
    /// `2·sqrt(max_accel·max_decel)`, kept in step with the live parameters.
    sqrt_accel_decel: f64,
    noise: f64,
    profile: Profile,
    pub visible: bool,
}

fn sqrt_accel_decel(id: VehicleId, params: &IdmParams) -> SimResult<f64> {
    let product = params.max_accel * params.max_decel;
    if !(params.max_accel > 0.0) || !(params.max_decel > 0.0) || !product.is_finite() {
        return Err(SimError::DegenerateDynamics {
            id,
            max_accel: params.max_accel,
            max_decel: params.max_decel,
        });
    }
    Ok(2.0 * product.sqrt())
}

impl Vehicle {
    /// Places a stationary vehicle at `angle` radians around the ring.
    pub fn new(id: VehicleId, angle: f64, geometry: &RingGeometry, params: IdmParams) -> SimResult<Self> {
        let sqrt_accel_decel = sqrt_accel_decel(id, &params)?;
        let angle = normalize_angle(angle);

        Ok(Self {
            id,
            arc_position: angle * geometry.radius,
            angle,
            previous_angle: angle,
            speed: 0.0,
            acceleration: 0.0,
            footprint: geometry.vehicle_footprint,
            radius: geometry.radius,
            params,
            core: params,
            sqrt_accel_decel,
            noise: 0.0,
            profile: Profile::Human,
            visible: true,
        })
    }

    pub fn params(&self) -> &IdmParams {
        &self.params
    }

    pub fn core_params(&self) -> &IdmParams {
        &self.core
    }

    pub fn sqrt_accel_decel(&self) -> f64 {
        self.sqrt_accel_decel
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn is_autonomous(&self) -> bool {
        self.profile == Profile::Autonomous
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn kinematics(&self) -> KinematicState {
        KinematicState {
            arc_position: self.arc_position,
            speed: self.speed,
            acceleration: self.acceleration,
        }
    }

    pub fn commit(&mut self, state: KinematicState) {
        self.arc_position = state.arc_position;
        self.speed = state.speed.max(0.0);
        self.acceleration = state.acceleration;
        self.angle = normalize_angle(self.arc_position / self.radius);
    }

    /// Moves the vehicle to an arbitrary unrolled position. Lap history is
    /// reset so the jump itself is not counted as a lap.
    pub fn place(&mut self, arc_position: f64, speed: f64) {
        self.commit(KinematicState {
            arc_position,
            speed,
            acceleration: 0.0,
        });
        self.previous_angle = self.angle;
    }

    /// Reports whether the angle wrapped past zero since the previous check.
    pub fn lap_check(&mut self, wrap_threshold: f64) -> bool {
        let new_lap = self.angle + wrap_threshold < self.previous_angle;
        self.previous_angle = self.angle;
        new_lap
    }

    fn refresh(&mut self, params: IdmParams) -> SimResult<()> {
        self.sqrt_accel_decel = sqrt_accel_decel(self.id, &params)?;
        self.params = params;
        Ok(())
    }

    pub fn set_desired_speed(&mut self, value: f64) {
        self.params.desired_speed = value;
        self.core.desired_speed = value;
    }

    pub fn set_time_headway(&mut self, value: f64) {
        self.params.time_headway = value;
        self.core.time_headway = value;
    }

    /// The live value keeps any active noise subtracted.
    pub fn set_max_accel(&mut self, value: f64) -> SimResult<()> {
        let live = IdmParams {
            max_accel: value - self.noise,
            ..self.params
        };
        self.refresh(live)?;
        self.core.max_accel = value;
        Ok(())
    }

    /// Checks that `noise` can be taken off the maximum acceleration.
    pub fn check_noise(&self, noise: f64) -> SimResult<()> {
        let noisy = IdmParams {
            max_accel: self.params.max_accel - noise,
            ..self.params
        };
        sqrt_accel_decel(self.id, &noisy).map(|_| ())
    }

    pub fn apply_noise(&mut self, noise: f64) -> SimResult<()> {
        let noisy = IdmParams {
            max_accel: self.params.max_accel - noise,
            ..self.params
        };
        self.refresh(noisy)?;
        self.noise = noise;
        Ok(())
    }

    pub fn remove_noise(&mut self) {
        self.noise = 0.0;
        self.params = self.core;
        // `core` only ever holds values that already passed `refresh`.
        self.sqrt_accel_decel = 2.0 * (self.core.max_accel * self.core.max_decel).sqrt();
    }

    /// Back to the human profile with `baseline` parameters and no noise.
    pub fn set_default(&mut self, baseline: IdmParams) -> SimResult<()> {
        self.refresh(baseline)?;
        self.core = baseline;
        self.noise = 0.0;
        self.profile = Profile::Human;
        Ok(())
    }

    pub fn set_autonomous(&mut self, profile: &AutonomousProfile) -> SimResult<()> {
        let params = profile.apply(self.core);
        self.refresh(params)?;
        self.core = params;
        self.profile = Profile::Autonomous;
        Ok(())
    }

    /// Caps the live desired speed at a fraction of the baseline.
    pub fn slow_down(&mut self, divisor: f64) {
        self.params.desired_speed = self.core.desired_speed / divisor;
    }

    pub fn restore_desired_speed(&mut self) {
        self.params.desired_speed = self.core.desired_speed;
    }
}

impl RoadEntity for Vehicle {
    fn angle(&self) -> f64 {
        self.angle
    }

    fn arc_position(&self) -> f64 {
        self.arc_position
    }

    fn footprint(&self) -> f64 {
        self.footprint
    }

    fn speed(&self) -> f64 {
        self.speed
    }
}
