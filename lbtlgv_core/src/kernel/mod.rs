//! Scattering kernels: one call contract, two physics models.
//!
//! A kernel maps one particle plus the local fluid state to zero or more
//! outgoing particles for a single time step:
//!
//! - **LGV** (`LangevinKernel`): drag plus noise, always exactly one output
//! - **LBT** (`LbtKernel`): stochastic elastic and inelastic scatterings,
//!   may emit a gluon (two outputs) or absorb a gluon (empty output)

mod lbt;
mod lgv;

pub use lbt::{ChannelRates, LbtKernel};
pub use lgv::LangevinKernel;

use crate::config::PhysicsConfig;
use crate::error::EventError;
use lbtlgv_env::{MediumState, Species};
use nalgebra::Vector4;
use rand::RngCore;

/// One particle leaving a kernel call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub species: Species,
    pub momentum: Vector4<f64>,
}

impl Outgoing {
    pub fn new(species: Species, momentum: Vector4<f64>) -> Self {
        Self { species, momentum }
    }
}

/// Advances a particle's momentum through one lab-frame time step.
pub trait ScatteringKernel: Send + Sync {
    /// Model name used in logs.
    fn name(&self) -> &'static str;

    /// Heavy-quark mass (GeV).
    fn mass(&self) -> f64;

    /// Whether every call returns exactly one particle.
    fn conserves_count(&self) -> bool {
        false
    }

    /// Updates `momentum` given the medium at the particle's position.
    ///
    /// `dt` is the lab-frame step in fm/c. All randomness comes from `rng`.
    fn update(
        &self,
        species: Species,
        momentum: &Vector4<f64>,
        medium: &MediumState,
        dt: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Outgoing>, EventError>;
}

/// Builds the kernel for a validated physics configuration.
pub fn build_kernel(config: &PhysicsConfig) -> Result<Box<dyn ScatteringKernel>, EventError> {
    config.validate()?;
    Ok(match config {
        PhysicsConfig::Lbt(cfg) => Box::new(LbtKernel::new(cfg.clone())),
        PhysicsConfig::Lgv(cfg) => Box::new(LangevinKernel::new(cfg.clone())),
    })
}

/// Rejects kernel results that would poison the ensemble.
pub(crate) fn check_finite(kernel: &str, out: &[Outgoing]) -> Result<(), EventError> {
    match out.iter().find(|o| o.momentum.iter().any(|c| !c.is_finite())) {
        Some(bad) => Err(EventError::kernel(format!(
            "{} produced a non-finite momentum {:?}",
            kernel,
            bad.momentum.as_slice()
        ))),
        None => Ok(()),
    }
}
