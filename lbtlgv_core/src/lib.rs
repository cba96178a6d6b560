//! LBT-LGV Core - Event-Driven Heavy-Quark Transport
//!
//! Propagates heavy quarks through a QGP medium one time step at a time:
//! 1. **Ensemble**: arena of tracked partons with stable identities and
//!    an immutable initial-pT record for offline reweighting
//! 2. **Kernels**: Langevin (drag plus noise) or linear Boltzmann
//!    (stochastic scatterings with gluon radiation) behind one trait
//! 3. **Event driver**: owns the clock, queries the medium, applies
//!    kernel output, and signals termination through `step`'s return value

pub mod config;
pub mod driver;
pub mod ensemble;
pub mod error;
pub mod history;
pub mod initializer;
pub mod kernel;
pub mod kinematics;

// Re-export key types for convenience
pub use config::{
    BoxInit, DynamicMediumConfig, GeometricInit, InitConfig, LbtConfig, LgvConfig, MediumConfig,
    OverlapTable, PhysicsConfig, StaticMediumConfig,
};
pub use driver::{EventDriver, StepStats, DEFAULT_SEED};
pub use ensemble::{Ensemble, Particle, ParticleSeed, ParticleStatus};
pub use error::EventError;
pub use history::{HistoryRecord, HistorySnapshot};
pub use kernel::{build_kernel, LangevinKernel, LbtKernel, Outgoing, ScatteringKernel};
