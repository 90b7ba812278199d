use crate::config::{IdmParams, IntegrationScheme, SolverParams};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub arc_position: f64,
    pub speed: f64,
    pub acceleration: f64,
}

/// The Intelligent Driver Model acceleration law with its braking policy.
#[derive(Debug, Clone, Copy)]
pub struct IdmLaw {
    emergency_decel: f64,
    gap_epsilon: f64,
}

impl IdmLaw {
    pub fn new(solver: &SolverParams) -> Self {
        Self {
            emergency_decel: solver.emergency_decel,
            gap_epsilon: solver.gap_epsilon,
        }
    }

    /// Acceleration for own speed `v`, approach rate `delta_v` and net `gap`.
    ///
    /// Anything harder than the comfortable deceleration snaps to the
    /// emergency floor rather than to `-max_decel`.
    pub fn acceleration(&self, params: &IdmParams, sqrt_accel_decel: f64, v: f64, delta_v: f64, gap: f64) -> f64 {
        let gap = if gap > 0.0 { gap } else { self.gap_epsilon };

        let desired_gap = params.min_gap
            + f64::max(0.0, params.time_headway * v + v * delta_v / sqrt_accel_decel);
        let alpha = desired_gap / gap;

        let acc = params.max_accel * (1.0 - (v / params.desired_speed).powi(4) - alpha * alpha);

        if acc < -params.max_decel {
            -self.emergency_decel
        } else {
            acc
        }
    }
}

/// One vehicle's car-following model, bound to its live parameters.
#[derive(Debug, Clone, Copy)]
pub struct Driver<'a> {
    pub law: &'a IdmLaw,
    pub params: &'a IdmParams,
    pub sqrt_accel_decel: f64,
}

impl Driver<'_> {
    pub fn acceleration(&self, v: f64, delta_v: f64, gap: f64) -> f64 {
        self.law.acceleration(self.params, self.sqrt_accel_decel, v, delta_v, gap)
    }
}

/// A fixed-timestep stepping strategy for the car-following ODE.
///
/// `gap` and `delta_v` are held constant across the step. A free-flowing
/// vehicle is passed `f64::INFINITY` as its gap.
pub trait Integrator {
    fn name(&self) -> &'static str;

    fn advance(&self, driver: &Driver<'_>, state: KinematicState, gap: f64, delta_v: f64, dt: f64) -> KinematicState;
}

/// Stops the vehicle where its speed would cross zero instead of letting it
/// roll backwards.
fn stop_short(state: KinematicState, acceleration: f64, dt: f64) -> Option<KinematicState> {
    let v = state.speed;
    if v + acceleration * dt < 0.0 {
        Some(KinematicState {
            arc_position: state.arc_position - 0.5 * v * v / acceleration,
            speed: 0.0,
            acceleration,
        })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl Integrator for Euler {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn advance(&self, driver: &Driver<'_>, state: KinematicState, gap: f64, delta_v: f64, dt: f64) -> KinematicState {
        let acceleration = driver.acceleration(state.speed, delta_v, gap);
        if let Some(stopped) = stop_short(state, acceleration, dt) {
            return stopped;
        }

        let speed = state.speed + acceleration * dt;
        KinematicState {
            arc_position: state.arc_position + speed * dt,
            speed,
            acceleration,
        }
    }
}

/// Classical fourth-order Runge-Kutta on `x' = v, v' = a(v)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn advance(&self, driver: &Driver<'_>, state: KinematicState, gap: f64, delta_v: f64, dt: f64) -> KinematicState {
        let v = state.speed;

        let k1v = driver.acceleration(v, delta_v, gap);
        if let Some(stopped) = stop_short(state, k1v, dt) {
            return stopped;
        }
        let k1x = v;

        let k2v = driver.acceleration(v + 0.5 * k1v * dt, delta_v, gap);
        let k2x = v + 0.5 * k1v * dt;

        let k3v = driver.acceleration(v + 0.5 * k2v * dt, delta_v, gap);
        let k3x = v + 0.5 * k2v * dt;

        let k4v = driver.acceleration(v + k3v * dt, delta_v, gap);
        let k4x = v + k3v * dt;

        KinematicState {
            arc_position: state.arc_position + dt / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x),
            speed: (v + dt / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v)).max(0.0),
            acceleration: k1v,
        }
    }
}

impl IntegrationScheme {
    pub fn integrator(self) -> Box<dyn Integrator> {
        match self {
            IntegrationScheme::Euler => Box::new(Euler),
            IntegrationScheme::Rk4 => Box::new(Rk4),
        }
    }
}
