use std::cmp::Ordering;
use std::f64::consts::TAU;

use super::{ObstacleId, RoadEntity, SimulationState, VehicleId};

/// Reduces an angle in radians into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(TAU);
    if reduced >= TAU { 0.0 } else { reduced }
}

/// Net distance from the follower's front to the leader's rear.
///
/// The raw arc difference is taken modulo the circumference, so a leader that
/// sits numerically behind the follower (it already wrapped, or it has done
/// fewer laps) is still measured forward around the ring.
pub fn gap_between(follower_arc: f64, leader_arc: f64, leader_footprint: f64, circumference: f64) -> f64 {
    (leader_arc - follower_arc).rem_euclid(circumference) - leader_footprint
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Vehicle(VehicleId),
    Obstacle(ObstacleId),
}

impl EntityRef {
    fn rank(&self) -> (u8, usize) {
        match self {
            EntityRef::Vehicle(id) => (0, id.0),
            EntityRef::Obstacle(id) => (1, id.0),
        }
    }
}

/// Road entities sorted ascending by angle.
#[derive(Debug, Clone, Default)]
pub struct RingOrder {
    entries: Vec<(f64, EntityRef)>,
}

impl RingOrder {
    pub fn build(state: &SimulationState) -> Self {
        let mut entries: Vec<(f64, EntityRef)> = state.vehicles.iter()
            .map(|v| (v.angle(), EntityRef::Vehicle(v.id)))
            .chain(state.obstacles.iter().map(|o| (o.angle(), EntityRef::Obstacle(o.id))))
            .collect();

        // Ties: vehicles before obstacles, then by id.
        entries.sort_by(|a, b| match a.0.total_cmp(&b.0) {
            Ordering::Equal => a.1.rank().cmp(&b.1.rank()),
            other => other,
        });

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.entries.iter().map(|(_, entity)| *entity)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.iter().filter_map(|entity| match entity {
            EntityRef::Vehicle(id) => Some(id),
            EntityRef::Obstacle(_) => None,
        })
    }

    pub fn get(&self, index: usize) -> Option<EntityRef> {
        self.entries.get(index).map(|(_, entity)| *entity)
    }

    pub fn position_of(&self, entity: EntityRef) -> Option<usize> {
        self.entries.iter().position(|(_, e)| *e == entity)
    }

    /// The entity immediately ahead of slot `index`. A lone entity has none.
    pub fn leader_at(&self, index: usize) -> Option<EntityRef> {
        if self.entries.len() < 2 || index >= self.entries.len() {
            return None;
        }
        Some(self.entries[(index + 1) % self.entries.len()].1)
    }

    pub fn leader_of(&self, entity: EntityRef) -> Option<EntityRef> {
        self.position_of(entity).and_then(|index| self.leader_at(index))
    }
}
