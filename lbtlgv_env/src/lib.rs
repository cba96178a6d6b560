//! LBT-LGV Medium Abstraction Layer
//!
//! This crate provides the boundary between the heavy-quark transport
//! and the fluid it propagates through, so the same event driver runs on
//! a **static box** or a **dynamic** (file-backed) hydrodynamic history.
//!
//! # Core Concept: The Medium Provider
//!
//! The driver only ever asks two questions of its background:
//! - Can a step starting at time `t` complete? (`covers`)
//! - What are temperature and flow at `(t, x)`? (`lookup`)
//!
//! Running past the last hydro sample is reported as
//! `MediumError::Exhausted`, the normal end of a run.
//!
//! # Example
//!
//! ```ignore
//! use lbtlgv_env::{MediumProvider, StaticMedium};
//!
//! let medium = StaticMedium::new(0.1)?;
//! let state = medium.lookup(0.0, &Vector3::zeros())?;
//! assert_eq!(state.temperature, 0.3);
//! ```

mod error;
mod hydro;
mod medium;
mod static_box;
mod types;

pub use error::MediumError;
pub use hydro::{HydroFrame, HydroHistory, DEFAULT_TC};
pub use medium::{MediumProvider, MediumState, StaticProperties};
pub use static_box::StaticMedium;
pub use types::{ParticleId, RunId, Species};
