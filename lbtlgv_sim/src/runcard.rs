//! JSON run cards: one file describing a complete transport run.
//!
//! ```json
//! {
//!   "medium":  {"type": "static", "static_dt": 0.1},
//!   "physics": {"physics": "LGV", "dt_lrf": 0.02, "elastic": true,
//!               "Einstein": true, "Nf": 3, "mass": 1.3},
//!   "init":    {"type": "box", "L": 10.0, "pmax": 10.0},
//!   "particles": 1000,
//!   "steps": 100,
//!   "record_every": 10,
//!   "box_info": {"Temp": 0.3}
//! }
//! ```

use crate::error::SimError;
use lbtlgv_core::{InitConfig, MediumConfig, PhysicsConfig};
use lbtlgv_env::StaticProperties;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete description of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCard {
    /// Label used for logs and output file names
    #[serde(default = "default_label")]
    pub label: String,

    pub medium: MediumConfig,
    pub physics: PhysicsConfig,
    pub init: InitConfig,

    /// Heavy quarks to initialize
    pub particles: usize,

    /// Maximum number of steps; the medium may end the run sooner
    pub steps: u64,

    /// Record a frame every this many steps (frame 0 is always recorded)
    #[serde(default = "default_record_every")]
    pub record_every: u64,

    /// Master seed; the CLI seed is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Per-step static medium override
    #[serde(rename = "box_info", default, skip_serializing_if = "Option::is_none")]
    pub static_override: Option<StaticProperties>,
}

fn default_label() -> String {
    "run_card".to_string()
}

fn default_record_every() -> u64 {
    1
}

impl RunCard {
    /// Reads and validates a run card file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::run_card(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
            .map_err(|e| SimError::run_card(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let card: RunCard =
            serde_json::from_str(json).map_err(|e| SimError::run_card(e.to_string()))?;
        card.validate()?;
        Ok(card)
    }

    /// Harness-level checks; physics and medium fields are checked by the driver.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.particles == 0 {
            return Err(SimError::run_card("particles must be > 0"));
        }
        if self.record_every == 0 {
            return Err(SimError::run_card("record_every must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"{
        "label": "box_lgv",
        "medium": {"type": "static", "static_dt": 0.1},
        "physics": {"physics": "LGV", "dt_lrf": 0.02, "elastic": true,
                    "Einstein": true, "Nf": 3, "mass": 1.3},
        "init": {"type": "box", "L": 10.0, "pmax": 10.0},
        "particles": 100,
        "steps": 20,
        "record_every": 5,
        "box_info": {"Temp": 0.35}
    }"#;

    #[test]
    fn test_run_card_parse() {
        let card = RunCard::from_json_str(CARD).unwrap();
        assert_eq!(card.label, "box_lgv");
        assert_eq!(card.particles, 100);
        assert_eq!(card.record_every, 5);
        assert_eq!(card.seed, None);
        assert_eq!(card.static_override, Some(StaticProperties::at_rest(0.35)));
        assert_eq!(card.physics.tag(), "LGV");
    }

    #[test]
    fn test_run_card_rejects_zero_particles() {
        let json = CARD.replace("\"particles\": 100", "\"particles\": 0");
        assert!(matches!(
            RunCard::from_json_str(&json),
            Err(SimError::RunCardError(_))
        ));
    }

    #[test]
    fn test_run_card_unknown_physics_tag() {
        let json = CARD.replace("\"LGV\"", "\"MARTINI\"");
        assert!(RunCard::from_json_str(&json).is_err());
    }

    #[test]
    fn test_run_card_missing_file() {
        assert!(RunCard::load(Path::new("/nonexistent/card.json")).is_err());
    }
}
