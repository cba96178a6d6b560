//! Snapshots of the ensemble for recording.

use crate::ensemble::Ensemble;
use lbtlgv_env::ParticleId;
use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Lazy view of the active ensemble.
///
/// Every accessor returns a fresh iterator over the current state, so a
/// snapshot can be consumed any number of times without copying.
#[derive(Debug, Clone, Copy)]
pub struct HistorySnapshot<'a> {
    ensemble: &'a Ensemble,
}

impl<'a> HistorySnapshot<'a> {
    pub(crate) fn new(ensemble: &'a Ensemble) -> Self {
        Self { ensemble }
    }

    /// Four-momenta of the active particles in identity order.
    pub fn momenta(&self) -> impl Iterator<Item = Vector4<f64>> + 'a {
        let ensemble = self.ensemble;
        ensemble.iter_active().map(|p| p.momentum)
    }

    /// Positions of the active particles in identity order.
    pub fn positions(&self) -> impl Iterator<Item = Vector3<f64>> + 'a {
        let ensemble = self.ensemble;
        ensemble.iter_active().map(|p| p.position)
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + 'a {
        let ensemble = self.ensemble;
        ensemble.iter_active().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.ensemble.size_active()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materializes the snapshot.
    pub fn record(&self, step: u64, time: f64) -> HistoryRecord {
        HistoryRecord {
            step,
            time,
            ids: self.ids().map(|id| id.0).collect(),
            momenta: self.momenta().map(|p| [p[0], p[1], p[2], p[3]]).collect(),
            positions: self.positions().map(|x| [x.x, x.y, x.z]).collect(),
        }
    }
}

/// Immutable recorded frame of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Step count at recording time
    pub step: u64,

    /// Simulation time (fm/c)
    pub time: f64,

    pub ids: Vec<u64>,

    /// `[E, px, py, pz]` per particle (GeV)
    pub momenta: Vec<[f64; 4]>,

    /// `[x, y, z]` per particle (fm)
    pub positions: Vec<[f64; 3]>,
}

impl HistoryRecord {
    /// Key used by keyed history containers for this frame's momenta.
    pub fn momentum_key(&self) -> String {
        format!("p-{}", self.step)
    }

    /// Key used by keyed history containers for this frame's positions.
    pub fn position_key(&self) -> String {
        format!("x-{}", self.step)
    }
}
