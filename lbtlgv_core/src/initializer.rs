//! Initial-state sampling for heavy quarks.

use crate::config::{BoxInit, GeometricInit, InitConfig, OverlapTable};
use crate::ensemble::ParticleSeed;
use crate::error::EventError;
use crate::kinematics::{self, from_pt_phi_y, on_shell};
use nalgebra::Vector3;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::f64::consts::PI;

/// Output of the initializer: seeds plus their verbatim initial pT.
#[derive(Debug, Clone)]
pub struct InitialState {
    pub seeds: Vec<ParticleSeed>,
    pub initial_pt: Vec<f64>,
}

/// Samples `count` heavy quarks of the given mass.
pub fn sample<R: Rng + ?Sized>(
    config: &InitConfig,
    count: usize,
    mass: f64,
    rng: &mut R,
) -> Result<InitialState, EventError> {
    if count == 0 {
        return Err(EventError::config("particle count must be > 0"));
    }
    let seeds = match config {
        InitConfig::Box(cfg) => sample_box(cfg, count, mass, rng)?,
        InitConfig::Geometric(cfg) => sample_geometric(cfg, count, mass, rng)?,
    };
    let initial_pt = seeds
        .iter()
        .map(|s| kinematics::transverse_momentum(&s.momentum))
        .collect();
    Ok(InitialState { seeds, initial_pt })
}

fn sample_box<R: Rng + ?Sized>(
    cfg: &BoxInit,
    count: usize,
    mass: f64,
    rng: &mut R,
) -> Result<Vec<ParticleSeed>, EventError> {
    let half_width = cfg.half_width;
    if !half_width.is_finite() || half_width <= 0.0 {
        return Err(EventError::config(format!(
            "box init: L must be finite and > 0, got {}",
            half_width
        )));
    }
    if !cfg.pmax.is_finite() || cfg.pmax <= 0.0 {
        return Err(EventError::config(format!(
            "box init: pmax must be finite and > 0, got {}",
            cfg.pmax
        )));
    }
    let power = cfg.power.unwrap_or(0.0);
    if !power.is_finite() || power <= -1.0 {
        return Err(EventError::config(format!(
            "box init: power must be finite and > -1, got {}",
            power
        )));
    }

    // |p| density ~ |p|^power on [0, pmax]
    let exponent = 1.0 / (power + 1.0);
    Ok((0..count)
        .map(|_| {
            let position = Vector3::new(
                rng.gen_range(-half_width..=half_width),
                rng.gen_range(-half_width..=half_width),
                rng.gen_range(-half_width..=half_width),
            );
            let u: f64 = rng.gen();
            let magnitude = cfg.pmax * u.powf(exponent);
            let direction = kinematics::isotropic_direction(rng);
            ParticleSeed::heavy_quark(on_shell(&(direction * magnitude), mass), position)
        })
        .collect())
}

fn sample_geometric<R: Rng + ?Sized>(
    cfg: &GeometricInit,
    count: usize,
    mass: f64,
    rng: &mut R,
) -> Result<Vec<ParticleSeed>, EventError> {
    let table = cfg
        .tab
        .as_ref()
        .ok_or_else(|| EventError::config("A+B init requires an overlap table (TAB)"))?;
    table.validate()?;
    if !cfg.dxy.is_finite() || cfg.dxy <= 0.0 {
        return Err(EventError::config(format!(
            "A+B init: dxy must be finite and > 0, got {}",
            cfg.dxy
        )));
    }
    if !(cfg.pt_min.is_finite() && cfg.pt_max.is_finite()) || cfg.pt_min < 0.0 {
        return Err(EventError::config(format!(
            "A+B init: invalid pT range [{}, {}]",
            cfg.pt_min, cfg.pt_max
        )));
    }
    if cfg.pt_min >= cfg.pt_max {
        return Err(EventError::config(format!(
            "A+B init: pTmin ({}) must be below pTmax ({})",
            cfg.pt_min, cfg.pt_max
        )));
    }
    if !cfg.sample_power.is_finite() || (cfg.sample_power >= 1.0 && cfg.pt_min == 0.0) {
        return Err(EventError::config(format!(
            "A+B init: sample power {} needs pTmin > 0",
            cfg.sample_power
        )));
    }
    if !(cfg.y_min.is_finite() && cfg.y_max.is_finite()) || cfg.y_min > cfg.y_max {
        return Err(EventError::config(format!(
            "A+B init: invalid rapidity range [{}, {}]",
            cfg.y_min, cfg.y_max
        )));
    }

    let cells = OverlapSampler::new(table, cfg.dxy)?;
    Ok((0..count)
        .map(|_| {
            let position = cells.sample(rng);
            let pt = sample_power_law(cfg.sample_power, cfg.pt_min, cfg.pt_max, rng.gen());
            let phi = rng.gen_range(0.0..2.0 * PI);
            let rapidity = rng.gen_range(cfg.y_min..=cfg.y_max);
            ParticleSeed::heavy_quark(from_pt_phi_y(pt, phi, rapidity, mass), position)
        })
        .collect())
}

/// Inverse CDF of the density `pT^-n` on `[lo, hi]` at quantile `u`.
fn sample_power_law(n: f64, lo: f64, hi: f64, u: f64) -> f64 {
    if (n - 1.0).abs() < 1e-12 {
        lo * (hi / lo).powf(u)
    } else {
        let a = 1.0 - n;
        let (lo_a, hi_a) = (lo.powf(a), hi.powf(a));
        (lo_a + u * (hi_a - lo_a)).powf(1.0 / a).clamp(lo, hi)
    }
}

/// Transverse position sampler weighted by the overlap density.
struct OverlapSampler {
    index: WeightedIndex<f64>,
    nx: usize,
    ny: usize,
    dxy: f64,
}

impl OverlapSampler {
    fn new(table: &OverlapTable, dxy: f64) -> Result<Self, EventError> {
        let (nx, ny) = table.shape();
        let index = WeightedIndex::new(table.weights())
            .map_err(|e| EventError::config(format!("overlap table: {}", e)))?;
        Ok(Self { index, nx, ny, dxy })
    }

    /// Picks a cell, then a uniform point inside it; z on the collision plane.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let cell = self.index.sample(rng);
        let (ix, iy) = (cell / self.ny, cell % self.ny);
        let x0 = (self.nx as f64 - 1.0) / 2.0;
        let y0 = (self.ny as f64 - 1.0) / 2.0;
        let x = (ix as f64 - x0 + rng.gen_range(-0.5..0.5)) * self.dxy;
        let y = (iy as f64 - y0 + rng.gen_range(-0.5..0.5)) * self.dxy;
        Vector3::new(x, y, 0.0)
    }
}
