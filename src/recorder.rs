use std::path::Path;

use anyhow::Result;
use log::info;

use crate::config::ExportParams;
use crate::simulation::{RoadEntity, SimulationState, VehicleId};

/// Time-series rows for the export collaborator.
///
/// Each row is `[time, value for vehicle 0, value for vehicle 1, ...]` with
/// values converted from pixels to metres.
#[derive(Debug, Clone)]
pub struct Recorder {
    pixels_per_meter: f64,
    enabled: bool,
    speed: Vec<Vec<f64>>,
    acceleration: Vec<Vec<f64>>,
    position: Vec<Vec<f64>>,
}

fn write_rows<T: ToString>(path: &Path, rows: &[Vec<T>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn row(time: f64, values: impl Iterator<Item = f64>, scale: f64) -> Vec<f64> {
    std::iter::once(time).chain(values.map(|v| v / scale)).collect()
}

impl Recorder {
    pub fn new(params: &ExportParams, enabled: bool) -> Self {
        Self {
            pixels_per_meter: params.pixels_per_meter,
            enabled,
            speed: Vec::new(),
            acceleration: Vec::new(),
            position: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn capture(&mut self, state: &SimulationState) {
        if !self.enabled {
            return;
        }

        let scale = self.pixels_per_meter;
        let cars = &state.vehicles;

        // The arena is already in id order.
        self.speed.push(row(state.time, cars.iter().map(|c| c.speed()), scale));
        self.acceleration.push(row(state.time, cars.iter().map(|c| c.acceleration()), scale));
        self.position.push(row(state.time, cars.iter().map(|c| c.arc_position()), scale));
    }

    pub fn speed_rows(&self) -> &[Vec<f64>] {
        &self.speed
    }

    pub fn acceleration_rows(&self) -> &[Vec<f64>] {
        &self.acceleration
    }

    pub fn position_rows(&self) -> &[Vec<f64>] {
        &self.position
    }

    /// One single-column row per autonomous vehicle.
    pub fn autonomous_rows(state: &SimulationState) -> Vec<Vec<VehicleId>> {
        state.autonomous_ids().into_iter().map(|id| vec![id]).collect()
    }

    /// Writes `speed.csv`, `acc.csv`, `pos.csv` and `avs.csv` into `dir`.
    pub fn write_csv(&self, dir: &Path, state: &SimulationState) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_rows(&dir.join("speed.csv"), &self.speed)?;
        write_rows(&dir.join("acc.csv"), &self.acceleration)?;
        write_rows(&dir.join("pos.csv"), &self.position)?;
        write_rows(&dir.join("avs.csv"), &Self::autonomous_rows(state))?;
        info!("Exported {} rows to {}", self.speed.len(), dir.display());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.speed.clear();
        self.acceleration.clear();
        self.position.clear();
    }
}
