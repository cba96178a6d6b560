//! Closed configuration variants for the medium, the physics model and
//! the initial state.
//!
//! Tags and keys follow the dictionaries of the original driver scripts,
//! so a run card like
//!
//! ```json
//! {"type": "static", "static_dt": 0.5}
//! {"physics": "LGV", "dt_lrf": 0.02, "elastic": true, "Einstein": true, "Nf": 3, "mass": 1.3}
//! ```
//!
//! deserializes directly. Field validation happens eagerly in
//! `EventDriver::new` / `EventDriver::initialize_hq`.

use crate::error::EventError;
use lbtlgv_env::{HydroHistory, MediumProvider, StaticMedium, StaticProperties};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// MEDIUM
// ============================================================================

/// Which background the heavy quarks propagate through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediumConfig {
    Static(StaticMediumConfig),
    Dynamic(DynamicMediumConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMediumConfig {
    /// Fixed time step (fm/c)
    #[serde(rename = "static_dt")]
    pub dt: f64,

    /// Homogeneous properties used when no per-step override is given
    #[serde(rename = "box_info", default)]
    pub properties: StaticProperties,

    /// Explicit end of the static medium (fm/c); runs forever when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicMediumConfig {
    /// JSON hydro history
    #[serde(rename = "hydrofile", default)]
    pub hydro_file: Option<PathBuf>,

    /// Critical temperature (GeV); overrides the hydro file, which defaults to 0.154
    #[serde(rename = "Tc", default, skip_serializing_if = "Option::is_none")]
    pub tc: Option<f64>,
}

impl MediumConfig {
    /// Static box at rest with the default temperature.
    pub fn static_box(dt: f64) -> Self {
        MediumConfig::Static(StaticMediumConfig {
            dt,
            properties: StaticProperties::default(),
            t_end: None,
        })
    }

    /// Dynamic medium backed by a hydro history file.
    pub fn dynamic(path: impl Into<PathBuf>) -> Self {
        MediumConfig::Dynamic(DynamicMediumConfig {
            hydro_file: Some(path.into()),
            tc: None,
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MediumConfig::Static(_) => "static",
            MediumConfig::Dynamic(_) => "dynamic",
        }
    }

    /// Builds the medium provider, loading any hydro history eagerly.
    pub fn build(&self) -> Result<Box<dyn MediumProvider>, EventError> {
        match self {
            MediumConfig::Static(cfg) => {
                let mut medium = StaticMedium::new(cfg.dt)
                    .and_then(|m| m.with_properties(cfg.properties))
                    .map_err(|e| EventError::config(format!("static medium: {}", e)))?;
                if let Some(t_end) = cfg.t_end {
                    medium = medium
                        .with_end_time(t_end)
                        .map_err(|e| EventError::config(format!("static medium: {}", e)))?;
                }
                Ok(Box::new(medium))
            }
            MediumConfig::Dynamic(cfg) => {
                let path = cfg
                    .hydro_file
                    .as_ref()
                    .ok_or_else(|| EventError::config("dynamic medium requires a hydrofile"))?;
                if let Some(tc) = cfg.tc {
                    if !tc.is_finite() || tc < 0.0 {
                        return Err(EventError::config(format!(
                            "critical temperature must be finite and >= 0, got {}",
                            tc
                        )));
                    }
                }
                let history = HydroHistory::open(path).map_err(|e| {
                    EventError::config(format!("hydro history {}: {}", path.display(), e))
                })?;
                // Run card first, then the file's own value
                Ok(match cfg.tc {
                    Some(tc) => Box::new(history.with_critical_temperature(tc)),
                    None => Box::new(history),
                })
            }
        }
    }
}

// ============================================================================
// PHYSICS
// ============================================================================

/// Transport model driving the heavy-quark update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "physics")]
pub enum PhysicsConfig {
    #[serde(rename = "LBT")]
    Lbt(LbtConfig),
    #[serde(rename = "LGV")]
    Lgv(LgvConfig),
}

/// Linear Boltzmann transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbtConfig {
    /// Elastic scattering off thermal partons
    #[serde(rename = "2->2")]
    pub elastic: bool,

    /// Medium-induced gluon radiation
    #[serde(rename = "2->3")]
    pub radiative: bool,

    /// Thermal gluon absorption
    #[serde(rename = "3->2")]
    pub absorptive: bool,

    /// Active light flavours
    #[serde(rename = "Nf")]
    pub nf: u32,

    /// Heavy-quark mass (GeV)
    pub mass: f64,

    /// Strong coupling
    #[serde(default = "default_alpha_s")]
    pub alpha_s: f64,
}

/// Langevin evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LgvConfig {
    /// Maximum rest-frame sub-step (fm/c)
    pub dt_lrf: f64,

    /// Apply drag and diffusion at all
    pub elastic: bool,

    /// Fix drag from diffusion through the Einstein relation
    #[serde(rename = "Einstein")]
    pub einstein: bool,

    #[serde(rename = "Nf")]
    pub nf: u32,

    /// Heavy-quark mass (GeV)
    pub mass: f64,

    /// Spatial diffusion constant in units of 1/(2 pi T)
    #[serde(default = "default_ds_2pit")]
    pub ds_2pit: f64,
}

fn default_alpha_s() -> f64 {
    0.3
}

fn default_ds_2pit() -> f64 {
    4.0
}

impl LbtConfig {
    /// All channels on, three light flavours, charm mass.
    pub fn charm() -> Self {
        Self {
            elastic: true,
            radiative: true,
            absorptive: true,
            nf: 3,
            mass: 1.3,
            alpha_s: default_alpha_s(),
        }
    }
}

impl LgvConfig {
    /// Elastic Langevin with Einstein drag, three light flavours, charm mass.
    pub fn charm() -> Self {
        Self {
            dt_lrf: 0.02,
            elastic: true,
            einstein: true,
            nf: 3,
            mass: 1.3,
            ds_2pit: default_ds_2pit(),
        }
    }
}

impl PhysicsConfig {
    pub fn tag(&self) -> &'static str {
        match self {
            PhysicsConfig::Lbt(_) => "LBT",
            PhysicsConfig::Lgv(_) => "LGV",
        }
    }

    /// Heavy-quark mass (GeV).
    pub fn mass(&self) -> f64 {
        match self {
            PhysicsConfig::Lbt(cfg) => cfg.mass,
            PhysicsConfig::Lgv(cfg) => cfg.mass,
        }
    }

    /// Active light flavours.
    pub fn nf(&self) -> u32 {
        match self {
            PhysicsConfig::Lbt(cfg) => cfg.nf,
            PhysicsConfig::Lgv(cfg) => cfg.nf,
        }
    }

    /// Checks the fields required by the chosen model.
    pub fn validate(&self) -> Result<(), EventError> {
        let mass = self.mass();
        if !mass.is_finite() || mass <= 0.0 {
            return Err(EventError::config(format!(
                "{}: mass must be finite and > 0, got {}",
                self.tag(),
                mass
            )));
        }
        if self.nf() > 6 {
            return Err(EventError::config(format!(
                "{}: Nf must be at most 6, got {}",
                self.tag(),
                self.nf()
            )));
        }
        match self {
            PhysicsConfig::Lbt(cfg) => {
                if !cfg.alpha_s.is_finite() || cfg.alpha_s <= 0.0 || cfg.alpha_s > 1.0 {
                    return Err(EventError::config(format!(
                        "LBT: alpha_s must lie in (0, 1], got {}",
                        cfg.alpha_s
                    )));
                }
            }
            PhysicsConfig::Lgv(cfg) => {
                if !cfg.dt_lrf.is_finite() || cfg.dt_lrf <= 0.0 {
                    return Err(EventError::config(format!(
                        "LGV: dt_lrf must be finite and > 0, got {}",
                        cfg.dt_lrf
                    )));
                }
                if !cfg.ds_2pit.is_finite() || cfg.ds_2pit <= 0.0 {
                    return Err(EventError::config(format!(
                        "LGV: ds_2pit must be finite and > 0, got {}",
                        cfg.ds_2pit
                    )));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// How the initial heavy quarks are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InitConfig {
    /// Uniform in a cube, isotropic momenta up to `pmax`
    #[serde(rename = "box")]
    Box(BoxInit),

    /// Positions weighted by the nuclear overlap, power-law pT spectrum
    #[serde(rename = "A+B")]
    Geometric(GeometricInit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxInit {
    /// Half-width of the cube (fm)
    #[serde(rename = "L")]
    pub half_width: f64,

    /// Momentum cap (GeV)
    pub pmax: f64,

    /// Exponent `n` of the magnitude density `|p|^n`; uniform when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometricInit {
    /// Exponent `n` of the `pT^-n` sampling spectrum
    #[serde(rename = "sample power")]
    pub sample_power: f64,

    #[serde(rename = "pTmin")]
    pub pt_min: f64,

    #[serde(rename = "pTmax")]
    pub pt_max: f64,

    #[serde(rename = "ymin")]
    pub y_min: f64,

    #[serde(rename = "ymax")]
    pub y_max: f64,

    /// Nuclear overlap density on the transverse grid
    #[serde(rename = "TAB", default)]
    pub tab: Option<OverlapTable>,

    /// Grid spacing of the overlap table (fm)
    pub dxy: f64,
}

impl InitConfig {
    pub fn tag(&self) -> &'static str {
        match self {
            InitConfig::Box(_) => "box",
            InitConfig::Geometric(_) => "A+B",
        }
    }
}

/// Two-dimensional nuclear overlap density `T_AB(x, y)`.
///
/// `rows[ix][iy]`, grid centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlapTable {
    rows: Vec<Vec<f64>>,
}

impl OverlapTable {
    /// Creates a table from `rows[ix][iy]`.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, EventError> {
        let table = Self { rows };
        table.validate()?;
        Ok(table)
    }

    /// A flat table of `nx * ny` cells.
    pub fn uniform(nx: usize, ny: usize) -> Self {
        Self {
            rows: vec![vec![1.0; ny]; nx],
        }
    }

    /// Builds `T_AB = T_A^2` from a nuclear thickness grid.
    ///
    /// The text holds whitespace-separated rows; `#` starts a comment. Rows
    /// of the file run along y, so the grid is transposed into `[ix][iy]`.
    pub fn from_thickness_text(text: &str) -> Result<Self, EventError> {
        let mut grid: Vec<Vec<f64>> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|tok| tok.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    EventError::config(format!("thickness grid line {}: {}", lineno + 1, e))
                })?;
            grid.push(row);
        }
        let ny = grid.len();
        let nx = grid.first().map(|r| r.len()).unwrap_or(0);
        if grid.iter().any(|r| r.len() != nx) {
            return Err(EventError::config("thickness grid rows differ in length"));
        }
        let rows = (0..nx)
            .map(|ix| (0..ny).map(|iy| grid[iy][ix] * grid[iy][ix]).collect())
            .collect();
        Self::new(rows)
    }

    /// Reads a thickness grid file, see [`OverlapTable::from_thickness_text`].
    pub fn from_thickness_file(path: &Path) -> Result<Self, EventError> {
        let text = fs::read_to_string(path)
            .map_err(|e| EventError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_thickness_text(&text)
    }

    /// Grid shape `(nx, ny)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.rows.first().map(|r| r.len()).unwrap_or(0))
    }

    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        self.rows.get(ix).and_then(|r| r.get(iy)).copied()
    }

    /// Cell weights in `ix * ny + iy` order.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|r| r.iter().copied())
    }

    /// Non-empty, rectangular, finite, non-negative, and not all zero.
    pub fn validate(&self) -> Result<(), EventError> {
        let (nx, ny) = self.shape();
        if nx == 0 || ny == 0 {
            return Err(EventError::config("overlap table is empty"));
        }
        if self.rows.iter().any(|r| r.len() != ny) {
            return Err(EventError::config("overlap table is not rectangular"));
        }
        if self.weights().any(|w| !w.is_finite() || w < 0.0) {
            return Err(EventError::config(
                "overlap table entries must be finite and >= 0",
            ));
        }
        if self.weights().sum::<f64>() <= 0.0 {
            return Err(EventError::config("overlap table has zero total weight"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_medium_config_tags() {
        let cfg: MediumConfig =
            serde_json::from_str(r#"{"type": "static", "static_dt": 0.5}"#).unwrap();
        assert_eq!(cfg, MediumConfig::static_box(0.5));

        let cfg: MediumConfig =
            serde_json::from_str(r#"{"type": "dynamic", "hydrofile": "JetData.json"}"#).unwrap();
        assert_eq!(cfg, MediumConfig::dynamic("JetData.json"));

        let unknown = serde_json::from_str::<MediumConfig>(r#"{"type": "frozen"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_dynamic_medium_requires_path() {
        let cfg: MediumConfig = serde_json::from_str(r#"{"type": "dynamic"}"#).unwrap();
        let err = cfg.build().err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_dynamic_medium_missing_file_is_config_error() {
        let cfg = MediumConfig::dynamic("/nonexistent/lbtlgv/hydro.json");
        assert!(cfg.build().err().unwrap().is_config());
    }

    #[test]
    fn test_static_box_info() {
        let cfg: MediumConfig = serde_json::from_str(
            r#"{"type": "static", "static_dt": 0.1, "box_info": {"Temp": 0.25, "Vz": 0.5}}"#,
        )
        .unwrap();
        let medium = cfg.build().unwrap();
        let state = medium.lookup(0.0, &nalgebra::Vector3::zeros()).unwrap();
        assert_relative_eq!(state.temperature, 0.25);
        assert_relative_eq!(state.flow.z, 0.5);
    }

    #[test]
    fn test_physics_config_keys() {
        let cfg: PhysicsConfig = serde_json::from_str(
            r#"{"physics": "LBT", "2->2": true, "2->3": false, "3->2": false, "Nf": 3, "mass": 1.3}"#,
        )
        .unwrap();
        match &cfg {
            PhysicsConfig::Lbt(lbt) => {
                assert!(lbt.elastic);
                assert!(!lbt.radiative);
                assert_relative_eq!(lbt.alpha_s, 0.3);
            }
            other => panic!("expected LBT, got {:?}", other),
        }
        assert!(cfg.validate().is_ok());

        let cfg: PhysicsConfig = serde_json::from_str(
            r#"{"physics": "LGV", "dt_lrf": 0.02, "elastic": true, "Einstein": true, "Nf": 3, "mass": 1.3}"#,
        )
        .unwrap();
        assert_eq!(cfg, PhysicsConfig::Lgv(LgvConfig::charm()));
    }

    #[test]
    fn test_physics_missing_field_fails() {
        let missing_mass = serde_json::from_str::<PhysicsConfig>(
            r#"{"physics": "LGV", "dt_lrf": 0.02, "elastic": true, "Einstein": true, "Nf": 3}"#,
        );
        assert!(missing_mass.is_err());
    }

    #[test]
    fn test_physics_validation() {
        let mut lgv = LgvConfig::charm();
        lgv.dt_lrf = 0.0;
        assert!(PhysicsConfig::Lgv(lgv).validate().unwrap_err().is_config());

        let mut lbt = LbtConfig::charm();
        lbt.mass = -1.0;
        assert!(PhysicsConfig::Lbt(lbt).validate().unwrap_err().is_config());
    }

    #[test]
    fn test_init_config_tags() {
        let cfg: InitConfig =
            serde_json::from_str(r#"{"type": "box", "L": 10.0, "pmax": 10.0}"#).unwrap();
        assert_eq!(
            cfg,
            InitConfig::Box(BoxInit {
                half_width: 10.0,
                pmax: 10.0,
                power: None
            })
        );

        let cfg: InitConfig = serde_json::from_str(
            r#"{"type": "A+B", "sample power": 4.0, "pTmin": 0.1, "pTmax": 70.0,
                "ymin": -1.0, "ymax": 1.0, "TAB": [[1.0, 2.0], [3.0, 4.0]], "dxy": 0.1}"#,
        )
        .unwrap();
        match cfg {
            InitConfig::Geometric(geo) => {
                let tab = geo.tab.unwrap();
                assert_eq!(tab.shape(), (2, 2));
                assert_eq!(tab.get(1, 0), Some(3.0));
            }
            other => panic!("expected A+B, got {:?}", other),
        }
    }

    #[test]
    fn test_thickness_grid_transposed_and_squared() {
        let text = "# TA grid\n1 2 3\n4 5 6\n";
        let table = OverlapTable::from_thickness_text(text).unwrap();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.get(0, 1), Some(16.0));
        assert_eq!(table.get(2, 0), Some(9.0));
    }

    #[test]
    fn test_overlap_table_validation() {
        assert!(OverlapTable::new(vec![]).is_err());
        assert!(OverlapTable::new(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(OverlapTable::new(vec![vec![0.0, 0.0]]).is_err());
        assert!(OverlapTable::new(vec![vec![-1.0, 2.0]]).is_err());
        assert!(OverlapTable::from_thickness_text("1 x\n").is_err());
    }
}
