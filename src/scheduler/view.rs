use std::f64::consts::FRAC_PI_2;

use crate::simulation::{normalize_angle, Point, RoadEntity, SimulationState, TrafficFlow, VehicleId};

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub id: VehicleId,
    pub position: Point,
    /// Direction of travel, tangent to the ring.
    pub heading: f64,
    /// Selects the brake-light livery.
    pub braking: bool,
    pub autonomous: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleView {
    pub position: Point,
}

/// Read-only snapshot handed to the rendering layer after each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationView {
    pub vehicles: Vec<VehicleView>,
    pub obstacles: Vec<ObstacleView>,
    pub flow: TrafficFlow,
    pub vehicle_count: usize,
    pub autonomous_count: usize,
    pub time: f64,
    pub step_multiplier: u32,
    pub noise_enabled: bool,
}

impl SimulationView {
    pub(crate) fn capture(
        state: &SimulationState,
        flow: TrafficFlow,
        step_multiplier: u32,
        noise_enabled: bool,
    ) -> Self {
        let vehicles = state.vehicles.iter()
            .map(|car| VehicleView {
                id: car.id,
                position: state.cartesian(car.angle()),
                heading: normalize_angle(car.angle() + FRAC_PI_2),
                braking: car.acceleration() < 0.0,
                autonomous: car.is_autonomous(),
                visible: car.visible,
            })
            .collect();

        let obstacles = state.obstacles.iter()
            .map(|o| ObstacleView { position: state.cartesian(o.angle()) })
            .collect();

        Self {
            vehicles,
            obstacles,
            flow,
            vehicle_count: state.vehicles.len(),
            autonomous_count: state.vehicles.iter().filter(|v| v.is_autonomous()).count(),
            time: state.time,
            step_multiplier,
            noise_enabled,
        }
    }
}
