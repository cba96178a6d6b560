//! Core medium-provider trait and the local fluid state it returns.

use crate::error::MediumError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Local fluid properties at a spacetime point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediumState {
    /// Temperature in GeV
    pub temperature: f64,

    /// Flow three-velocity in the lab frame, units of c
    pub flow: Vector3<f64>,
}

impl MediumState {
    /// Creates a state with the given temperature and flow.
    pub fn new(temperature: f64, flow: Vector3<f64>) -> Self {
        Self { temperature, flow }
    }

    /// A fluid cell at rest.
    pub fn at_rest(temperature: f64) -> Self {
        Self::new(temperature, Vector3::zeros())
    }

    /// Empty space: no temperature, no flow.
    pub fn vacuum() -> Self {
        Self::at_rest(0.0)
    }
}

/// Homogeneous properties of a static box.
///
/// Also the per-step override accepted by the driver; keys follow the
/// `box_info` dictionary of the driver script.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticProperties {
    /// Temperature in GeV
    #[serde(rename = "Temp")]
    pub temperature: f64,

    #[serde(rename = "Vx", default)]
    pub vx: f64,

    #[serde(rename = "Vy", default)]
    pub vy: f64,

    #[serde(rename = "Vz", default)]
    pub vz: f64,
}

impl StaticProperties {
    /// Creates properties for a box at rest.
    pub fn at_rest(temperature: f64) -> Self {
        Self {
            temperature,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
        }
    }

    /// Returns the flow three-velocity.
    pub fn flow(&self) -> Vector3<f64> {
        Vector3::new(self.vx, self.vy, self.vz)
    }

    /// Checks that the properties describe a physical fluid cell.
    pub fn validate(&self) -> Result<(), MediumError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(MediumError::invalid(format!(
                "temperature must be finite and >= 0, got {}",
                self.temperature
            )));
        }
        let v2 = self.flow().norm_squared();
        if !v2.is_finite() || v2 >= 1.0 {
            return Err(MediumError::invalid(format!(
                "flow speed must be below c, got |v| = {:.4}",
                v2.sqrt()
            )));
        }
        Ok(())
    }

    /// Converts to a medium state.
    pub fn state(&self) -> MediumState {
        MediumState::new(self.temperature, self.flow())
    }
}

impl Default for StaticProperties {
    fn default() -> Self {
        Self::at_rest(0.3)
    }
}

/// The central interface between the transport and its background.
///
/// Abstracts the fluid the heavy quarks propagate through, so the event
/// driver runs unchanged on a static box or a file-backed hydro history.
///
/// # Implementations
///
/// - **Static**: `StaticMedium` - homogeneous box, optional end time
/// - **Dynamic**: `HydroHistory` - 2+1D boost-invariant hydro frames
///
/// # Time grid
///
/// The driver steps on the provider's grid: `start_time() + n * time_step()`.
/// `covers(t)` must report whether a step starting at `t` can complete;
/// past that point `lookup` fails with `MediumError::Exhausted`.
pub trait MediumProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Time of the first sample (fm/c).
    fn start_time(&self) -> f64;

    /// Step size of the time grid (fm/c).
    fn time_step(&self) -> f64;

    /// Whether a step starting at `time` stays within the medium's validity.
    fn covers(&self, time: f64) -> bool;

    /// Returns the local fluid state at a spacetime point.
    ///
    /// Fails with `Exhausted` past the last sample and `OutsideDomain`
    /// when the position is not covered by the medium.
    fn lookup(&self, time: f64, position: &Vector3<f64>) -> Result<MediumState, MediumError>;

    /// Below this temperature particles free-stream without scattering.
    fn critical_temperature(&self) -> f64 {
        0.0
    }

    /// Whether per-step static overrides replace this medium's own lookup.
    fn accepts_override(&self) -> bool {
        false
    }
}
