use nalgebra::Point2;
use std::f64::consts::TAU;
use std::fmt;

pub mod behavior;
pub mod obstacle;
pub mod physics;
pub mod ring;
pub mod traffic;
pub mod vehicle;

pub use behavior::*;
pub use obstacle::*;
pub use physics::*;
pub use ring::*;
pub use traffic::*;
pub use vehicle::*;

use crate::config::{IdmParams, RingGeometry};
use crate::error::{SimError, SimResult};

pub type Point = Point2<f64>;

/// Stable vehicle identity; also the vehicle's index in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub usize);

/// Anything that occupies a stretch of the ring.
pub trait RoadEntity {
    /// Angular position in `[0, 2π)`.
    fn angle(&self) -> f64;

    /// Unrolled distance along the ring.
    fn arc_position(&self) -> f64;

    fn footprint(&self) -> f64;

    fn speed(&self) -> f64 {
        0.0
    }
}

/// The live vehicle and obstacle collections.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Arena indexed by `VehicleId`.
    pub vehicles: Vec<Vehicle>,
    pub obstacles: Vec<Obstacle>,
    pub time: f64,
    pub dt: f64,
    pub geometry: RingGeometry,
    /// Steps taken since the clock last restarted; `time` is derived from it.
    steps: u64,
    next_obstacle_id: usize,
}

impl SimulationState {
    pub fn new(geometry: RingGeometry, dt: f64) -> Self {
        Self {
            vehicles: Vec::new(),
            obstacles: Vec::new(),
            time: 0.0,
            dt,
            geometry,
            steps: 0,
            next_obstacle_id: 0,
        }
    }

    /// Discards every vehicle and lays out `count` fresh ones evenly around
    /// the ring at rest. Obstacles are cleared and the clock restarts at zero.
    pub fn rebuild(&mut self, count: usize, params: IdmParams) -> SimResult<()> {
        if count == 0 {
            return Err(SimError::InvalidVehicleCount);
        }

        let spacing = TAU / count as f64;
        let vehicles = (0..count)
            .map(|i| Vehicle::new(VehicleId(i), i as f64 * spacing, &self.geometry, params))
            .collect::<SimResult<Vec<_>>>()?;

        self.vehicles = vehicles;
        self.obstacles.clear();
        self.reset_clock();
        Ok(())
    }

    /// Moves the clock one step on. Time is `steps · dt` rather than a running
    /// sum, so whole seconds land exactly.
    pub fn advance_clock(&mut self) {
        self.steps += 1;
        self.time = self.steps as f64 * self.dt;
    }

    pub fn reset_clock(&mut self) {
        self.steps = 0;
        self.time = 0.0;
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0)
    }

    pub fn entity(&self, entity: EntityRef) -> Option<&dyn RoadEntity> {
        match entity {
            EntityRef::Vehicle(id) => self.vehicle(id).map(|v| v as &dyn RoadEntity),
            EntityRef::Obstacle(id) => self.obstacles.iter()
                .find(|o| o.id == id)
                .map(|o| o as &dyn RoadEntity),
        }
    }

    /// The vehicle furthest along the unrolled ring.
    pub fn ring_leader(&self) -> Option<&Vehicle> {
        self.vehicles.iter()
            .max_by(|a, b| a.arc_position().total_cmp(&b.arc_position()))
    }

    pub fn place_obstacle(&mut self, leader: VehicleId) -> Option<&Obstacle> {
        let leader = self.vehicle(leader)?;
        let obstacle = Obstacle::ahead_of(ObstacleId(self.next_obstacle_id), leader, &self.geometry);
        self.next_obstacle_id += 1;
        self.obstacles.push(obstacle);
        self.obstacles.last()
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    /// Screen position of an angle on the ring.
    pub fn cartesian(&self, angle: f64) -> Point {
        Point::new(
            self.geometry.center_x + angle.cos() * self.geometry.radius,
            self.geometry.center_y + angle.sin() * self.geometry.radius,
        )
    }

    pub fn autonomous_ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter()
            .filter(|v| v.is_autonomous())
            .map(|v| v.id)
            .collect()
    }

    pub fn mean_abs_acceleration(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(|v| v.acceleration().abs()).sum::<f64>() / self.vehicles.len() as f64
    }

    pub fn mean_speed(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(|v| v.speed()).sum::<f64>() / self.vehicles.len() as f64
    }
}
