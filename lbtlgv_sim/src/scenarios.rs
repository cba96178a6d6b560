//! Built-in transport scenarios.

use crate::error::SimError;
use crate::runcard::RunCard;
use lbtlgv_core::{
    BoxInit, GeometricInit, InitConfig, LbtConfig, LgvConfig, MediumConfig, OverlapTable,
    PhysicsConfig,
};
use lbtlgv_env::StaticProperties;
use std::path::Path;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Charm in a 0.3 GeV static box, LBT with all channels
    StaticLbt,

    /// Charm in a static box, Langevin with non-relativistic drag
    StaticLgv,

    /// Charm in a static box, Langevin with Einstein drag
    StaticLgvEinstein,

    /// Charm from an A+B overlap in an expanding hydro medium
    HydroLgv,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::StaticLbt,
            ScenarioId::StaticLgv,
            ScenarioId::StaticLgvEinstein,
            ScenarioId::HydroLgv,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::StaticLbt => "static_lbt",
            ScenarioId::StaticLgv => "static_lgv",
            ScenarioId::StaticLgvEinstein => "static_lgv_einstein",
            ScenarioId::HydroLgv => "hydro_lgv",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::StaticLbt => "Box L=10 fm, T=0.3 GeV, LBT 2->2 + 2->3 + 3->2",
            ScenarioId::StaticLgv => "Box L=10 fm, T=0.3 GeV, LGV drag kappa/(2TM)",
            ScenarioId::StaticLgvEinstein => "Box L=10 fm, T=0.3 GeV, LGV Einstein drag",
            ScenarioId::HydroLgv => "A+B initial state in a hydro history, LGV Einstein drag",
        }
    }

    /// Whether the scenario needs a hydro history file.
    pub fn needs_hydro(&self) -> bool {
        matches!(self, ScenarioId::HydroLgv)
    }

    /// Builds the run card for this scenario.
    pub fn run_card(
        &self,
        particles: usize,
        steps: u64,
        record_every: u64,
        hydro: Option<&Path>,
    ) -> Result<RunCard, SimError> {
        let box_init = InitConfig::Box(BoxInit {
            half_width: 10.0,
            pmax: 10.0,
            power: None,
        });
        let box_override = Some(StaticProperties::at_rest(0.3));

        let (medium, physics, init, static_override) = match self {
            ScenarioId::StaticLbt => (
                MediumConfig::static_box(0.1),
                PhysicsConfig::Lbt(LbtConfig::charm()),
                box_init,
                box_override,
            ),
            ScenarioId::StaticLgv => (
                MediumConfig::static_box(0.1),
                PhysicsConfig::Lgv(LgvConfig {
                    einstein: false,
                    ..LgvConfig::charm()
                }),
                box_init,
                box_override,
            ),
            ScenarioId::StaticLgvEinstein => (
                MediumConfig::static_box(0.1),
                PhysicsConfig::Lgv(LgvConfig::charm()),
                box_init,
                box_override,
            ),
            ScenarioId::HydroLgv => {
                let path = hydro.ok_or_else(|| {
                    SimError::run_card("hydro_lgv needs a hydro history (--hydro)")
                })?;
                (
                    MediumConfig::dynamic(path),
                    PhysicsConfig::Lgv(LgvConfig::charm()),
                    InitConfig::Geometric(GeometricInit {
                        sample_power: 4.0,
                        pt_min: 0.1,
                        pt_max: 70.0,
                        y_min: -1.0,
                        y_max: 1.0,
                        tab: Some(OverlapTable::uniform(20, 20)),
                        dxy: 0.5,
                    }),
                    None,
                )
            }
        };

        let card = RunCard {
            label: self.name().to_string(),
            medium,
            physics,
            init,
            particles,
            steps,
            record_every,
            seed: None,
            static_override,
        };
        card.validate()?;
        Ok(card)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static_lbt" | "lbt" => Ok(ScenarioId::StaticLbt),
            "static_lgv" | "lgv" => Ok(ScenarioId::StaticLgv),
            "static_lgv_einstein" | "einstein" => Ok(ScenarioId::StaticLgvEinstein),
            "hydro_lgv" | "hydro" => Ok(ScenarioId::HydroLgv),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_hydro_scenario_requires_path() {
        let err = ScenarioId::HydroLgv.run_card(10, 10, 1, None).unwrap_err();
        assert!(matches!(err, SimError::RunCardError(_)));

        let card = ScenarioId::HydroLgv
            .run_card(10, 10, 1, Some(Path::new("hydro.json")))
            .unwrap();
        assert_eq!(card.medium, MediumConfig::dynamic("hydro.json"));
        assert_eq!(card.static_override, None);
    }

    #[test]
    fn test_static_scenarios_use_box() {
        for scenario in [ScenarioId::StaticLbt, ScenarioId::StaticLgv, ScenarioId::StaticLgvEinstein] {
            let card = scenario.run_card(100, 10, 2, None).unwrap();
            assert_eq!(card.init.tag(), "box");
            assert_eq!(card.medium.tag(), "static");
            assert!(card.static_override.is_some());
        }
    }
}
