use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use super::{Vehicle, VehicleId};
use crate::config::{AutonomousProfile, IdmParams};
use crate::error::{SimError, SimResult};

/// Stochastic driver behaviour: acceleration noise and autonomous selection.
pub struct BehaviorEngine {
    autonomous: AutonomousProfile,
    rng: StdRng,
}

impl BehaviorEngine {
    pub fn new(autonomous: AutonomousProfile, seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        Self { autonomous, rng }
    }

    /// Draws a fresh noise magnitude in `[0, 1)` for every vehicle and takes
    /// it off its maximum acceleration. Nothing changes unless every vehicle
    /// can take its draw.
    pub fn enable_noise(&mut self, vehicles: &mut [Vehicle]) -> SimResult<()> {
        let draws: Vec<f64> = vehicles.iter().map(|_| self.rng.gen::<f64>()).collect();

        for (car, noise) in vehicles.iter().zip(&draws) {
            car.check_noise(*noise)?;
        }
        for (car, noise) in vehicles.iter_mut().zip(draws) {
            car.apply_noise(noise)?;
        }

        debug!("Noise applied to {} vehicles", vehicles.len());
        Ok(())
    }

    pub fn disable_noise(&mut self, vehicles: &mut [Vehicle]) {
        for car in vehicles.iter_mut() {
            car.remove_noise();
        }
    }

    /// Resets every vehicle to the human `baseline`, then gives exactly `count`
    /// randomly chosen vehicles the autonomous profile.
    pub fn assign_autonomous(
        &mut self,
        vehicles: &mut [Vehicle],
        count: usize,
        baseline: IdmParams,
    ) -> SimResult<Vec<VehicleId>> {
        if count > vehicles.len() {
            return Err(SimError::TooManyAutonomous {
                requested: count,
                available: vehicles.len(),
            });
        }

        for car in vehicles.iter_mut() {
            car.set_default(baseline)?;
        }

        let mut chosen: Vec<usize> = index::sample(&mut self.rng, vehicles.len(), count).into_vec();
        chosen.sort_unstable();

        let mut ids = Vec::with_capacity(count);
        for i in chosen {
            vehicles[i].set_autonomous(&self.autonomous)?;
            ids.push(vehicles[i].id);
        }

        info!("{} of {} vehicles are now autonomous", ids.len(), vehicles.len());
        Ok(ids)
    }
}
