use std::collections::VecDeque;
use std::fmt;

use super::Vehicle;
use crate::config::FlowParams;

/// Traffic flow as reported to the display layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrafficFlow {
    /// Less than one full window of simulated time has elapsed.
    WarmingUp { remaining: f64 },
    /// Laps completed across all vehicles inside the trailing window.
    LapsPerMinute(u32),
}

impl TrafficFlow {
    pub fn value(&self) -> Option<u32> {
        match self {
            TrafficFlow::LapsPerMinute(laps) => Some(*laps),
            TrafficFlow::WarmingUp { .. } => None,
        }
    }
}

impl fmt::Display for TrafficFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficFlow::WarmingUp { remaining } => write!(f, "Calculating... [wait {:.1}s]", remaining),
            TrafficFlow::LapsPerMinute(laps) => write!(f, "{}", laps),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapRecord {
    pub lap: bool,
    pub time: f64,
}

/// Counts lap completions over a sliding window of simulated time.
#[derive(Debug, Clone)]
pub struct LapCounter {
    records: VecDeque<LapRecord>,
    total_laps: u32,
    window: f64,
    wrap_threshold: f64,
}

impl LapCounter {
    pub fn new(params: &FlowParams) -> Self {
        Self {
            records: VecDeque::new(),
            total_laps: 0,
            window: params.window,
            wrap_threshold: params.wrap_threshold,
        }
    }

    /// Appends one record for this step: a lap if any vehicle wrapped.
    ///
    /// Every vehicle is checked so each one's previous angle stays current.
    pub fn add_laps(&mut self, vehicles: &mut [Vehicle], time: f64) -> bool {
        let threshold = self.wrap_threshold;
        let lap = vehicles.iter_mut().fold(false, |any, car| car.lap_check(threshold) || any);
        self.push(LapRecord { lap, time });
        lap
    }

    pub fn push(&mut self, record: LapRecord) {
        if record.lap {
            self.total_laps += 1;
        }
        self.records.push_back(record);
    }

    /// Evicts records older than the window and returns the laps left in it.
    pub fn count_total_laps(&mut self, now: f64) -> u32 {
        while let Some(front) = self.records.front() {
            if now - front.time <= self.window {
                break;
            }
            if front.lap {
                self.total_laps -= 1;
            }
            self.records.pop_front();
        }
        self.total_laps
    }

    pub fn traffic_flow(&mut self, now: f64) -> TrafficFlow {
        let total = self.count_total_laps(now);
        if now >= self.window {
            TrafficFlow::LapsPerMinute(total)
        } else {
            let remaining = ((self.window - now) * 10.0).round() / 10.0;
            TrafficFlow::WarmingUp { remaining }
        }
    }

    /// Records the current step and reports the resulting flow.
    pub fn calc_traffic_flow(&mut self, vehicles: &mut [Vehicle], now: f64) -> TrafficFlow {
        self.add_laps(vehicles, now);
        self.traffic_flow(now)
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    pub fn records(&self) -> impl Iterator<Item = &LapRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.total_laps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IdmParams, RingGeometry};
    use crate::simulation::VehicleId;

    fn counter() -> LapCounter {
        LapCounter::new(&FlowParams::default())
    }

    #[test]
    fn wrap_registers_one_lap() {
        let geometry = RingGeometry::default();
        let mut cars = vec![
            Vehicle::new(VehicleId(0), 6.2, &geometry, IdmParams::default()).unwrap(),
            Vehicle::new(VehicleId(1), 3.0, &geometry, IdmParams::default()).unwrap(),
        ];
        let mut laps = counter();

        assert!(!laps.add_laps(&mut cars, 1.0));

        cars[0].commit(crate::simulation::KinematicState {
            arc_position: geometry.circumference() + 0.05 * geometry.radius,
            speed: 10.0,
            acceleration: 0.0,
        });
        assert!(laps.add_laps(&mut cars, 2.0));

        let records: Vec<_> = laps.records().copied().collect();
        assert_eq!(records, vec![
            LapRecord { lap: false, time: 1.0 },
            LapRecord { lap: true, time: 2.0 },
        ]);
        assert_eq!(laps.count_total_laps(2.0), 1);
    }

    #[test]
    fn only_laps_inside_window_count() {
        let mut laps = counter();
        for t in 1..=65 {
            laps.push(LapRecord { lap: t == 3 || t == 30, time: t as f64 });
        }
        // The wrap at t = 3 is 62 s old and falls out.
        assert_eq!(laps.count_total_laps(65.0), 1);
        assert_eq!(laps.records().count(), 61);
    }

    #[test]
    fn warming_up_reports_remaining_time() {
        let mut laps = counter();
        let flow = laps.traffic_flow(30.0);
        assert_eq!(flow, TrafficFlow::WarmingUp { remaining: 30.0 });
        assert_eq!(flow.to_string(), "Calculating... [wait 30.0s]");
        assert_eq!(laps.traffic_flow(12.34).to_string(), "Calculating... [wait 47.7s]");
    }

    #[test]
    fn reports_count_after_a_minute() {
        let mut laps = counter();
        laps.push(LapRecord { lap: true, time: 10.0 });
        laps.push(LapRecord { lap: true, time: 45.0 });
        laps.push(LapRecord { lap: false, time: 60.0 });

        let flow = laps.traffic_flow(60.0);
        assert_eq!(flow, TrafficFlow::LapsPerMinute(2));
        assert_eq!(flow.to_string(), "2");
        assert_eq!(flow.value(), Some(2));
    }

    #[test]
    fn calc_traffic_flow_tracks_wraps_across_the_window() {
        let geometry = RingGeometry::default();
        let mut cars = vec![Vehicle::new(VehicleId(0), 6.2, &geometry, IdmParams::default()).unwrap()];
        let mut laps = counter();

        assert_eq!(laps.calc_traffic_flow(&mut cars, 10.0).to_string(), "Calculating... [wait 50.0s]");

        cars[0].commit(crate::simulation::KinematicState {
            arc_position: geometry.circumference() + 0.05 * geometry.radius,
            speed: 10.0,
            acceleration: 0.0,
        });
        let flow = laps.calc_traffic_flow(&mut cars, 20.0);
        assert_eq!(flow, TrafficFlow::WarmingUp { remaining: 40.0 });
        assert_eq!(laps.total_laps(), 1);

        // No further wraps: the count holds at the window boundary, then expires.
        assert_eq!(laps.calc_traffic_flow(&mut cars, 60.0), TrafficFlow::LapsPerMinute(1));
        assert_eq!(laps.calc_traffic_flow(&mut cars, 80.0), TrafficFlow::LapsPerMinute(1));
        assert_eq!(laps.calc_traffic_flow(&mut cars, 80.5), TrafficFlow::LapsPerMinute(0));
        assert_eq!(laps.calc_traffic_flow(&mut cars, 80.5).to_string(), "0");
    }
}
