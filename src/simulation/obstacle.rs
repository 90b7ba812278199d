use super::ring::normalize_angle;
use super::{ObstacleId, RoadEntity, Vehicle};
use crate::config::RingGeometry;

/// A static object (a traffic cone) blocking the lane.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: ObstacleId,
    arc_position: f64,
    angle: f64,
    footprint: f64,
}

impl Obstacle {
    /// Drops an obstacle `geometry.obstacle_offset` ahead of `leader`.
    pub fn ahead_of(id: ObstacleId, leader: &Vehicle, geometry: &RingGeometry) -> Self {
        let offset = geometry.obstacle_offset;
        Self {
            id,
            arc_position: leader.arc_position() + offset,
            angle: normalize_angle(leader.angle() + offset / geometry.radius),
            footprint: geometry.obstacle_footprint,
        }
    }
}

impl RoadEntity for Obstacle {
    fn angle(&self) -> f64 {
        self.angle
    }

    fn arc_position(&self) -> f64 {
        self.arc_position
    }

    fn footprint(&self) -> f64 {
        self.footprint
    }
}
