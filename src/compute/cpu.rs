use crate::config::{IntegrationScheme, SolverParams, UpdatePolicy};
use crate::simulation::{
    gap_between, Driver, EntityRef, IdmLaw, Integrator, KinematicState, RingOrder, RoadEntity,
    SimulationState,
};
use super::SimulationBackend;

pub struct CpuBackend {
    law: IdmLaw,
    integrator: Box<dyn Integrator>,
    policy: UpdatePolicy,
}

impl CpuBackend {
    pub fn new(solver: &SolverParams) -> Self {
        Self::with_scheme(solver, solver.scheme, solver.update_policy)
    }

    pub fn with_scheme(solver: &SolverParams, scheme: IntegrationScheme, policy: UpdatePolicy) -> Self {
        Self {
            law: IdmLaw::new(solver),
            integrator: scheme.integrator(),
            policy,
        }
    }

    /// Next state of the vehicle at `index` in `order`, reading its leader
    /// from `state` as it currently stands.
    fn advance_slot(&self, state: &SimulationState, order: &RingOrder, index: usize) -> Option<(usize, KinematicState)> {
        let EntityRef::Vehicle(id) = order.get(index)? else {
            return None;
        };
        let car = state.vehicle(id)?;

        // Without a leader the vehicle runs on the free-road term alone.
        let (gap, delta_v) = match order.leader_at(index).and_then(|leader| state.entity(leader)) {
            Some(leader) => (
                gap_between(
                    car.arc_position(),
                    leader.arc_position(),
                    leader.footprint(),
                    state.geometry.circumference(),
                ),
                car.speed() - leader.speed(),
            ),
            None => (f64::INFINITY, 0.0),
        };

        let driver = Driver {
            law: &self.law,
            params: car.params(),
            sqrt_accel_decel: car.sqrt_accel_decel(),
        };
        let next = self.integrator.advance(&driver, car.kinematics(), gap, delta_v, state.dt);
        Some((id.0, next))
    }
}

impl SimulationBackend for CpuBackend {
    fn update(&mut self, state: &mut SimulationState) {
        let order = RingOrder::build(state);

        match self.policy {
            UpdatePolicy::Sequential => {
                for index in 0..order.len() {
                    if let Some((slot, next)) = self.advance_slot(state, &order, index) {
                        state.vehicles[slot].commit(next);
                    }
                }
            }
            UpdatePolicy::Synchronous => {
                let updates: Vec<(usize, KinematicState)> = (0..order.len())
                    .filter_map(|index| self.advance_slot(state, &order, index))
                    .collect();
                for (slot, next) in updates {
                    state.vehicles[slot].commit(next);
                }
            }
        }

        state.advance_clock();
    }

    fn get_name(&self) -> &'static str {
        self.integrator.name()
    }
}
