use std::collections::VecDeque;

use log::{debug, info, warn};

pub mod command;
pub mod view;

pub use command::*;
pub use view::*;

use crate::compute::{CpuBackend, SimulationBackend};
use crate::config::{IdmParams, SimulationConfig};
use crate::error::{SimError, SimResult};
use crate::recorder::Recorder;
use crate::simulation::{BehaviorEngine, LapCounter, SimulationState, TrafficFlow, VehicleId};

/// Outcome of one rendered frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub steps: u32,
    pub flow: TrafficFlow,
    /// Queued commands that were refused, in the order they were pushed.
    pub rejected: Vec<(Command, SimError)>,
}

/// Owns the ring for the lifetime of the run and drives it frame by frame.
///
/// Commands are queued with [`Scheduler::push`] and applied at the start of
/// the next [`Scheduler::frame`], so state only ever changes between steps.
pub struct Scheduler {
    config: SimulationConfig,
    state: SimulationState,
    backend: Box<dyn SimulationBackend>,
    behavior: BehaviorEngine,
    laps: LapCounter,
    recorder: Recorder,
    commands: VecDeque<Command>,
    /// Human parameters as adjusted by the setters.
    baseline: IdmParams,
    step_multiplier: u32,
    autonomous_count: usize,
    noise_enabled: bool,
    slowed_leader: Option<VehicleId>,
    flow: TrafficFlow,
    running: bool,
}

fn check_parameter(name: &'static str, value: f64, valid: bool, reason: &'static str) -> SimResult<()> {
    if value.is_finite() && valid {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value, reason })
    }
}

impl Scheduler {
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        let backend = Box::new(CpuBackend::new(&config.solver));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: SimulationConfig, backend: Box<dyn SimulationBackend>) -> SimResult<Self> {
        let mut state = SimulationState::new(config.ring.clone(), config.solver.dt());
        state.rebuild(config.vehicles.count, config.vehicles.human)?;

        let behavior = BehaviorEngine::new(config.vehicles.autonomous, config.random.seed);
        let laps = LapCounter::new(&config.flow);
        let recorder = Recorder::new(&config.export, false);

        let mut scheduler = Self {
            baseline: config.vehicles.human,
            step_multiplier: config.solver.step_multiplier,
            autonomous_count: 0,
            noise_enabled: false,
            slowed_leader: None,
            flow: TrafficFlow::WarmingUp { remaining: config.flow.window },
            running: true,
            commands: VecDeque::new(),
            state,
            backend,
            behavior,
            laps,
            recorder,
            config,
        };

        if scheduler.config.vehicles.autonomous_count > 0 {
            scheduler.set_autonomous_count(scheduler.config.vehicles.autonomous_count)?;
        }
        if scheduler.config.noise.enabled {
            scheduler.set_noise_enabled(true)?;
        }

        info!(
            "Ring ready: {} vehicles on radius {:.0}, dt {:.4}s, {} backend, {:?} updates",
            scheduler.state.vehicles.len(),
            scheduler.config.ring.radius,
            scheduler.state.dt,
            scheduler.backend.get_name(),
            scheduler.config.solver.update_policy,
        );

        Ok(scheduler)
    }

    /// Queues a command for the start of the next frame.
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Applies a command immediately.
    pub fn apply(&mut self, command: Command) -> SimResult<()> {
        match command {
            Command::SetVehicleCount(count) => self.set_vehicle_count(count),
            Command::SetDesiredSpeed(value) => self.set_desired_speed(value),
            Command::SetTimeHeadway(value) => self.set_time_headway(value),
            Command::SetMaxAccel(value) => self.set_max_accel(value),
            Command::SetStepMultiplier(value) => self.set_step_multiplier(value),
            Command::SetAutonomousCount(count) => self.set_autonomous_count(count),
            Command::SetNoiseEnabled(enabled) => self.set_noise_enabled(enabled),
            Command::ToggleObstacle => self.toggle_obstacle().map(|_| ()),
            Command::SlowDownLeader => self.slow_down_leader().map(|_| ()),
            Command::RestoreLeader => self.restore_leader().map(|_| ()),
            Command::ResetSimulation => {
                self.reset_simulation();
                Ok(())
            }
            Command::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Drains the command queue, then runs `step_multiplier` sub-steps.
    pub fn frame(&mut self) -> FrameReport {
        let mut rejected = Vec::new();
        let pending: Vec<Command> = self.commands.drain(..).collect();
        for command in pending {
            if let Err(err) = self.apply(command) {
                warn!("Rejected {:?}: {}", command, err);
                rejected.push((command, err));
            }
        }

        if !self.running {
            return FrameReport { steps: 0, flow: self.flow, rejected };
        }

        for _ in 0..self.step_multiplier {
            self.step();
        }

        self.recorder.capture(&self.state);

        debug!(
            "t={:.2}s flow={} mean speed {:.2}",
            self.state.time, self.flow, self.state.mean_speed()
        );

        FrameReport { steps: self.step_multiplier, flow: self.flow, rejected }
    }

    /// One fixed-timestep update followed by lap detection and the flow estimate.
    pub fn step(&mut self) {
        self.backend.update(&mut self.state);
        self.flow = self.laps.calc_traffic_flow(&mut self.state.vehicles, self.state.time);
    }

    /// Rebuilds the ring with `count` fresh vehicles and default parameters.
    ///
    /// All existing vehicle state is discarded and the simulation restarts
    /// from time zero.
    pub fn set_vehicle_count(&mut self, count: usize) -> SimResult<()> {
        let defaults = self.config.vehicles.human;
        self.state.rebuild(count, defaults)?;

        self.baseline = defaults;
        self.step_multiplier = self.config.solver.step_multiplier;
        self.autonomous_count = 0;
        self.reset_simulation();

        info!("Ring rebuilt with {} vehicles", count);
        Ok(())
    }

    pub fn set_desired_speed(&mut self, value: f64) -> SimResult<()> {
        check_parameter("desired speed", value, value > 0.0, "must be positive")?;
        for car in &mut self.state.vehicles {
            car.set_desired_speed(value);
        }
        self.baseline.desired_speed = value;
        Ok(())
    }

    pub fn set_time_headway(&mut self, value: f64) -> SimResult<()> {
        check_parameter("time headway", value, value >= 0.0, "must not be negative")?;
        for car in &mut self.state.vehicles {
            car.set_time_headway(value);
        }
        self.baseline.time_headway = value;
        Ok(())
    }

    pub fn set_max_accel(&mut self, value: f64) -> SimResult<()> {
        check_parameter("max acceleration", value, value > 0.0, "must be positive")?;

        // Active noise must still leave every vehicle some acceleration.
        if let Some(car) = self.state.vehicles.iter().find(|c| !(value - c.noise() > 0.0)) {
            return Err(SimError::DegenerateDynamics {
                id: car.id,
                max_accel: value - car.noise(),
                max_decel: car.params().max_decel,
            });
        }

        for car in &mut self.state.vehicles {
            car.set_max_accel(value)?;
        }
        self.baseline.max_accel = value;
        Ok(())
    }

    pub fn set_step_multiplier(&mut self, value: u32) -> SimResult<()> {
        if value == 0 {
            return Err(SimError::InvalidParameter {
                name: "step multiplier",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        self.step_multiplier = value;
        Ok(())
    }

    /// Re-profiles the ring so exactly `count` random vehicles are autonomous.
    ///
    /// Every vehicle comes out of this noise-free; noise has to be switched
    /// on again to draw new magnitudes.
    pub fn set_autonomous_count(&mut self, count: usize) -> SimResult<()> {
        self.behavior.assign_autonomous(&mut self.state.vehicles, count, self.baseline)?;
        self.autonomous_count = count;
        if self.noise_enabled {
            info!("Noise cleared by autonomous re-profiling");
            self.noise_enabled = false;
        }
        Ok(())
    }

    pub fn set_noise_enabled(&mut self, enabled: bool) -> SimResult<()> {
        if enabled == self.noise_enabled {
            return Ok(());
        }

        if enabled {
            self.behavior.enable_noise(&mut self.state.vehicles)?;
        } else {
            self.behavior.disable_noise(&mut self.state.vehicles);
        }
        self.noise_enabled = enabled;

        info!("Noise {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Drops an obstacle ahead of the ring leader, or removes every obstacle.
    /// Returns whether an obstacle is on the ring afterwards.
    pub fn toggle_obstacle(&mut self) -> SimResult<bool> {
        if !self.state.obstacles.is_empty() {
            self.state.clear_obstacles();
            info!("Obstacle removed at {:.2}s", self.state.time);
            return Ok(false);
        }

        let leader = self.state.ring_leader().ok_or(SimError::EmptyRing)?.id;
        self.state.place_obstacle(leader);
        info!("An obstacle introduced at {:.2}s ahead of vehicle {}", self.state.time, leader);
        Ok(true)
    }

    /// Cuts the ring leader's desired speed and remembers who it was.
    pub fn slow_down_leader(&mut self) -> SimResult<VehicleId> {
        let divisor = self.config.vehicles.slow_down_divisor;
        let leader = self.state.ring_leader().ok_or(SimError::EmptyRing)?.id;

        if let Some(car) = self.state.vehicle_mut(leader) {
            car.slow_down(divisor);
        }
        self.slowed_leader = Some(leader);

        info!("Vehicle {} slowed down at {:.2}s", leader, self.state.time);
        Ok(leader)
    }

    pub fn restore_leader(&mut self) -> SimResult<VehicleId> {
        let id = self.slowed_leader.ok_or(SimError::NoLeaderRecorded)?;
        let car = self.state.vehicle_mut(id).ok_or(SimError::NoLeaderRecorded)?;
        car.restore_desired_speed();

        info!("Vehicle {} back to its desired speed", id);
        Ok(id)
    }

    /// Restarts the clock and clears obstacles, noise and the lap history.
    ///
    /// Restoring core parameters also lifts any leader slow-down, so the
    /// remembered leader is forgotten.
    pub fn reset_simulation(&mut self) {
        self.state.reset_clock();
        self.state.clear_obstacles();
        self.behavior.disable_noise(&mut self.state.vehicles);
        self.slowed_leader = None;
        self.noise_enabled = false;
        self.laps.clear();
        self.recorder.clear();
        self.flow = TrafficFlow::WarmingUp { remaining: self.config.flow.window };
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn view(&self) -> SimulationView {
        SimulationView::capture(&self.state, self.flow, self.step_multiplier, self.noise_enabled)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn baseline(&self) -> &IdmParams {
        &self.baseline
    }

    pub fn traffic_flow(&self) -> TrafficFlow {
        self.flow
    }

    pub fn laps(&self) -> &LapCounter {
        &self.laps
    }

    pub fn time(&self) -> f64 {
        self.state.time
    }

    pub fn step_multiplier(&self) -> u32 {
        self.step_multiplier
    }

    pub fn autonomous_count(&self) -> usize {
        self.autonomous_count
    }

    pub fn noise_enabled(&self) -> bool {
        self.noise_enabled
    }

    pub fn slowed_leader(&self) -> Option<VehicleId> {
        self.slowed_leader
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.get_name()
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut Recorder {
        &mut self.recorder
    }
}
