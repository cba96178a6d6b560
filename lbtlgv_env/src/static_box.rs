//! Static box medium: homogeneous, time-independent fluid.

use crate::error::MediumError;
use crate::medium::{MediumProvider, MediumState, StaticProperties};
use nalgebra::Vector3;

/// Relative tolerance when comparing grid times.
const TIME_EPS: f64 = 1e-9;

/// Infinite homogeneous medium stepping on a fixed `dt`.
///
/// Never exhausts unless an explicit end time is set.
#[derive(Debug, Clone)]
pub struct StaticMedium {
    /// Step size (fm/c)
    dt: f64,

    /// Properties used when no per-step override is supplied
    properties: StaticProperties,

    /// Optional end of validity (fm/c)
    t_end: Option<f64>,
}

impl StaticMedium {
    /// Creates a static box at rest with the default temperature.
    pub fn new(dt: f64) -> Result<Self, MediumError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(MediumError::invalid(format!(
                "static time step must be finite and > 0, got {}",
                dt
            )));
        }
        Ok(Self {
            dt,
            properties: StaticProperties::default(),
            t_end: None,
        })
    }

    /// Sets the homogeneous properties.
    pub fn with_properties(mut self, properties: StaticProperties) -> Result<Self, MediumError> {
        properties.validate()?;
        self.properties = properties;
        Ok(self)
    }

    /// Terminates the box at `t_end`.
    pub fn with_end_time(mut self, t_end: f64) -> Result<Self, MediumError> {
        if !t_end.is_finite() || t_end < 0.0 {
            return Err(MediumError::invalid(format!(
                "static end time must be finite and >= 0, got {}",
                t_end
            )));
        }
        self.t_end = Some(t_end);
        Ok(self)
    }

    /// Returns the homogeneous properties.
    pub fn properties(&self) -> &StaticProperties {
        &self.properties
    }

    /// Returns the end time, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.t_end
    }
}

impl MediumProvider for StaticMedium {
    fn name(&self) -> &'static str {
        "static"
    }

    fn start_time(&self) -> f64 {
        0.0
    }

    fn time_step(&self) -> f64 {
        self.dt
    }

    fn covers(&self, time: f64) -> bool {
        match self.t_end {
            Some(end) => time + self.dt <= end + TIME_EPS * self.dt,
            None => true,
        }
    }

    fn lookup(&self, time: f64, _position: &Vector3<f64>) -> Result<MediumState, MediumError> {
        if let Some(end) = self.t_end {
            if time > end + TIME_EPS * self.dt {
                return Err(MediumError::Exhausted { time, last: end });
            }
        }
        Ok(self.properties.state())
    }

    fn accepts_override(&self) -> bool {
        true
    }
}
