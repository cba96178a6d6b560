//! File-backed hydrodynamic history (dynamic medium).
//!
//! A 2+1D boost-invariant history: transverse grids of temperature and
//! flow sampled on a uniform proper-time grid. Longitudinal flow follows
//! Bjorken scaling, `vz = z / t`.

use crate::error::MediumError;
use crate::medium::{MediumProvider, MediumState};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Relative tolerance when comparing grid times.
const TIME_EPS: f64 = 1e-9;

/// Pseudo-critical temperature (GeV) below which the fluid has hadronized.
pub const DEFAULT_TC: f64 = 0.154;

fn default_tc() -> f64 {
    DEFAULT_TC
}

/// One time sample of the transverse plane.
///
/// Grids are row-major `nx * ny`, index `ix * ny + iy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydroFrame {
    /// Temperature (GeV)
    pub temperature: Vec<f64>,

    /// Transverse flow along x at midrapidity
    pub vx: Vec<f64>,

    /// Transverse flow along y at midrapidity
    pub vy: Vec<f64>,
}

impl HydroFrame {
    /// A frame with constant temperature and no flow.
    pub fn uniform(nx: usize, ny: usize, temperature: f64) -> Self {
        Self {
            temperature: vec![temperature; nx * ny],
            vx: vec![0.0; nx * ny],
            vy: vec![0.0; nx * ny],
        }
    }
}

/// Hydro history backing a dynamic medium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydroHistory {
    /// Proper time of the first frame (fm/c)
    pub tau0: f64,

    /// Spacing between frames (fm/c)
    pub dtau: f64,

    /// Transverse grid spacing (fm)
    pub dxy: f64,

    /// Grid points along x (grid centred on the origin)
    pub nx: usize,

    /// Grid points along y
    pub ny: usize,

    /// Frames in time order
    pub frames: Vec<HydroFrame>,

    /// Critical temperature (GeV)
    #[serde(default = "default_tc")]
    pub tc: f64,
}

impl HydroHistory {
    /// Builds a history from frames and validates it.
    pub fn new(
        tau0: f64,
        dtau: f64,
        dxy: f64,
        nx: usize,
        ny: usize,
        frames: Vec<HydroFrame>,
    ) -> Result<Self, MediumError> {
        let history = Self {
            tau0,
            dtau,
            dxy,
            nx,
            ny,
            frames,
            tc: DEFAULT_TC,
        };
        history.validate()?;
        Ok(history)
    }

    /// Opens and validates a JSON hydro history file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MediumError> {
        let file = File::open(path.as_ref())?;
        let history: HydroHistory = serde_json::from_reader(BufReader::new(file))?;
        history.validate()?;
        info!(
            "Loaded hydro history {}: {} frames, {}x{} grid, tau0={} dtau={}",
            path.as_ref().display(),
            history.frames.len(),
            history.nx,
            history.ny,
            history.tau0,
            history.dtau
        );
        Ok(history)
    }

    /// Parses and validates a JSON hydro history.
    pub fn from_json_str(json: &str) -> Result<Self, MediumError> {
        let history: HydroHistory = serde_json::from_str(json)?;
        history.validate()?;
        Ok(history)
    }

    /// Overrides the critical temperature.
    pub fn with_critical_temperature(mut self, tc: f64) -> Self {
        self.tc = tc;
        self
    }

    /// Checks grid and frame consistency.
    pub fn validate(&self) -> Result<(), MediumError> {
        if !self.tau0.is_finite() || self.tau0 < 0.0 {
            return Err(MediumError::InvalidHistory(format!(
                "tau0 must be finite and >= 0, got {}",
                self.tau0
            )));
        }
        if !self.dtau.is_finite() || self.dtau <= 0.0 {
            return Err(MediumError::InvalidHistory(format!(
                "dtau must be finite and > 0, got {}",
                self.dtau
            )));
        }
        if !self.dxy.is_finite() || self.dxy <= 0.0 {
            return Err(MediumError::InvalidHistory(format!(
                "dxy must be finite and > 0, got {}",
                self.dxy
            )));
        }
        if self.nx < 2 || self.ny < 2 {
            return Err(MediumError::InvalidHistory(format!(
                "grid must be at least 2x2, got {}x{}",
                self.nx, self.ny
            )));
        }
        if !self.tc.is_finite() || self.tc < 0.0 {
            return Err(MediumError::InvalidHistory(format!(
                "critical temperature must be finite and >= 0, got {}",
                self.tc
            )));
        }
        if self.frames.is_empty() {
            return Err(MediumError::InvalidHistory("no frames".into()));
        }
        let cells = self.nx * self.ny;
        for (k, frame) in self.frames.iter().enumerate() {
            if frame.temperature.len() != cells || frame.vx.len() != cells || frame.vy.len() != cells
            {
                return Err(MediumError::InvalidHistory(format!(
                    "frame {} does not match the {}x{} grid",
                    k, self.nx, self.ny
                )));
            }
            if let Some(i) = frame
                .temperature
                .iter()
                .position(|t| !t.is_finite() || *t < 0.0)
            {
                return Err(MediumError::InvalidHistory(format!(
                    "frame {} cell {}: temperature must be finite and >= 0, got {}",
                    k, i, frame.temperature[i]
                )));
            }
            if let Some(i) = frame
                .vx
                .iter()
                .zip(&frame.vy)
                .position(|(vx, vy)| {
                    let v2 = vx * vx + vy * vy;
                    !v2.is_finite() || v2 >= 1.0
                })
            {
                return Err(MediumError::InvalidHistory(format!(
                    "frame {} cell {}: transverse flow ({}, {}) must be below c",
                    k, i, frame.vx[i], frame.vy[i]
                )));
            }
        }
        Ok(())
    }

    /// Number of time samples.
    pub fn sample_count(&self) -> usize {
        self.frames.len()
    }

    /// Time of the `i`-th sample.
    pub fn sample_time(&self, i: usize) -> f64 {
        self.tau0 + i as f64 * self.dtau
    }

    /// Time of the last sample.
    pub fn last_time(&self) -> f64 {
        self.sample_time(self.frames.len().saturating_sub(1))
    }

    /// Maps a coordinate to (lower cell index, fraction) along one axis.
    fn cell(&self, coord: f64, n: usize, axis: char) -> Result<(usize, f64), MediumError> {
        let f = coord / self.dxy + 0.5 * (n - 1) as f64;
        if !f.is_finite() || f < 0.0 || f > (n - 1) as f64 {
            return Err(MediumError::outside(format!(
                "{} = {:.3} fm beyond the hydro grid",
                axis, coord
            )));
        }
        let i = (f.floor() as usize).min(n - 2);
        Ok((i, f - i as f64))
    }

    fn bilinear(&self, grid: &[f64], ix: usize, rx: f64, iy: usize, ry: f64) -> f64 {
        let at = |i: usize, j: usize| grid[i * self.ny + j];
        (1.0 - rx) * (1.0 - ry) * at(ix, iy)
            + rx * (1.0 - ry) * at(ix + 1, iy)
            + (1.0 - rx) * ry * at(ix, iy + 1)
            + rx * ry * at(ix + 1, iy + 1)
    }
}

impl MediumProvider for HydroHistory {
    fn name(&self) -> &'static str {
        "hydro"
    }

    fn start_time(&self) -> f64 {
        self.tau0
    }

    fn time_step(&self) -> f64 {
        self.dtau
    }

    fn covers(&self, time: f64) -> bool {
        time + self.dtau <= self.last_time() + TIME_EPS * self.dtau
    }

    fn lookup(&self, time: f64, position: &Vector3<f64>) -> Result<MediumState, MediumError> {
        let last = self.last_time();
        if time > last + TIME_EPS * self.dtau {
            return Err(MediumError::Exhausted { time, last });
        }
        if time <= position.z.abs() {
            return Err(MediumError::outside(format!(
                "z = {:.3} fm outside the forward light cone at t = {:.3}",
                position.z, time
            )));
        }

        let (ix, rx) = self.cell(position.x, self.nx, 'x')?;
        let (iy, ry) = self.cell(position.y, self.ny, 'y')?;

        let n_frames = self.frames.len();
        let ft = ((time - self.tau0) / self.dtau).max(0.0);
        let k = (ft.floor() as usize).min(n_frames.saturating_sub(2));
        let rt = if n_frames == 1 {
            0.0
        } else {
            (ft - k as f64).clamp(0.0, 1.0)
        };

        let (f0, f1) = (&self.frames[k], &self.frames[(k + 1).min(n_frames - 1)]);
        let value = |a: &[f64], b: &[f64]| {
            (1.0 - rt) * self.bilinear(a, ix, rx, iy, ry) + rt * self.bilinear(b, ix, rx, iy, ry)
        };
        let temperature = value(&f0.temperature, &f1.temperature);
        let vx = value(&f0.vx, &f1.vx);
        let vy = value(&f0.vy, &f1.vy);

        // Boost-invariant flow: u = gamma_T (cosh eta, v_T, sinh eta)
        let vz = position.z / time;
        let inv_cosh_eta = (1.0 - vz * vz).sqrt();

        Ok(MediumState::new(
            temperature,
            Vector3::new(vx * inv_cosh_eta, vy * inv_cosh_eta, vz),
        ))
    }

    fn critical_temperature(&self) -> f64 {
        self.tc
    }
}
