//! Run harness: drives an `EventDriver` from a run card and streams
//! recorded frames into a history store.

use crate::error::SimError;
use crate::runcard::RunCard;
use crate::store::HistoryStore;
use lbtlgv_core::EventDriver;
use lbtlgv_env::RunId;
use serde::Serialize;
use tracing::{debug, info};

/// Results from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Run card label
    pub label: String,

    pub run_id: RunId,

    /// Seed used
    pub seed: u64,

    /// Steps completed
    pub steps: u64,

    /// Final simulation time (fm/c)
    pub final_time: f64,

    /// True when the medium or an empty ensemble ended the run
    pub terminated: bool,

    /// Heavy quarks initialized
    pub initial_count: usize,

    /// Particles still active at the end
    pub active: usize,

    /// Particles created by branching
    pub created: usize,

    pub absorbed: usize,
    pub escaped: usize,

    /// Frames written to the store
    pub frames_recorded: usize,

    /// Mean transverse momentum of active particles (GeV)
    pub mean_pt: f64,
}

/// Runs transport from a run card.
pub struct Runner {
    card: RunCard,
    seed: u64,
}

impl Runner {
    /// Creates a runner; the card's own seed wins over `seed`.
    pub fn new(card: RunCard, seed: u64) -> Self {
        let seed = card.seed.unwrap_or(seed);
        Self { card, seed }
    }

    pub fn card(&self) -> &RunCard {
        &self.card
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs the card to completion.
    ///
    /// Frame 0 is recorded after initialization, then every
    /// `record_every` steps and once more at the final step.
    pub fn run(&self, store: &mut dyn HistoryStore) -> Result<RunResult, SimError> {
        let card = &self.card;
        let run_id = RunId::from_seed(self.seed);
        info!(
            "Starting {} (run {}, seed={}): {} particles, up to {} steps",
            card.label, run_id, self.seed, card.particles, card.steps
        );

        let mut driver = EventDriver::new(card.medium.clone(), card.physics.clone())?
            .with_seed(self.seed);
        driver.initialize_hq(card.particles, &card.init)?;

        store.write_initial_pt(driver.initial_pt_snapshot()?)?;
        write_frame(&driver, store)?;
        let mut frames_recorded = 1;
        let mut last_recorded = 0;

        let mut terminated = false;
        let mut created = 0;
        while driver.step_count() < card.steps {
            if !driver.step(card.static_override.as_ref())? {
                terminated = true;
                break;
            }
            created += driver.last_stats().created;
            if driver.step_count() % card.record_every == 0 {
                last_recorded = write_frame(&driver, store)?;
                frames_recorded += 1;
            }
            debug!(
                "{} t={:.3} active={}",
                card.label,
                driver.current_time(),
                driver.ensemble()?.size_active()
            );
        }
        if last_recorded != driver.step_count() {
            write_frame(&driver, store)?;
            frames_recorded += 1;
        }
        store.flush()?;

        let ensemble = driver.ensemble()?;
        let (active, absorbed, escaped) = ensemble.status_counts();
        let mean_pt = if active > 0 {
            ensemble.iter_active().map(|p| p.transverse_momentum()).sum::<f64>() / active as f64
        } else {
            0.0
        };

        let result = RunResult {
            label: card.label.clone(),
            run_id,
            seed: self.seed,
            steps: driver.step_count(),
            final_time: driver.current_time(),
            terminated,
            initial_count: card.particles,
            active,
            created,
            absorbed,
            escaped,
            frames_recorded,
            mean_pt,
        };
        info!(
            "Finished {}: {} steps, t={:.3} fm/c, active={} absorbed={} escaped={} <pT>={:.3} GeV{}",
            result.label,
            result.steps,
            result.final_time,
            result.active,
            result.absorbed,
            result.escaped,
            result.mean_pt,
            if terminated { " (medium ended)" } else { "" }
        );
        Ok(result)
    }
}

/// Streams the current ensemble straight into the store, returning its step.
fn write_frame(driver: &EventDriver, store: &mut dyn HistoryStore) -> Result<u64, SimError> {
    let frame = driver
        .history_snapshot()?
        .record(driver.step_count(), driver.current_time());
    store.write_frame(&frame)?;
    Ok(frame.step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::JsonHistoryExport;
    use crate::scenarios::ScenarioId;
    use crate::store::SledHistoryStore;
    use approx::assert_relative_eq;
    use lbtlgv_env::{HydroFrame, HydroHistory};

    #[test]
    fn test_runner_records_on_cadence() {
        let card = ScenarioId::StaticLgvEinstein.run_card(50, 10, 4, None).unwrap();
        let mut export = JsonHistoryExport::new(&card.label, 42);
        let result = Runner::new(card, 42).run(&mut export).unwrap();

        assert_eq!(result.steps, 10);
        assert!(!result.terminated);
        assert_eq!(result.active, 50);
        let steps: Vec<u64> = export.frames.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![0, 4, 8, 10]);
        assert_eq!(result.frames_recorded, 4);
        assert_eq!(export.initial_pt.len(), 50);
    }

    #[test]
    fn test_runner_lbt_into_sled() {
        let card = ScenarioId::StaticLbt.run_card(40, 20, 10, None).unwrap();
        let mut store = SledHistoryStore::open_temp(RunId::from_seed(3)).unwrap();
        let result = Runner::new(card, 3).run(&mut store).unwrap();

        assert_eq!(store.initial_pt().unwrap().map(|v| v.len()), Some(40));
        let final_momenta = store.momenta(20).unwrap().unwrap();
        assert_eq!(final_momenta.len(), result.active);
        assert!(store.positions(10).unwrap().is_some());
    }

    #[test]
    fn test_runner_deterministic() {
        let run = || {
            let card = ScenarioId::StaticLbt.run_card(30, 15, 5, None).unwrap();
            let mut export = JsonHistoryExport::new("det", 9);
            Runner::new(card, 9).run(&mut export).unwrap();
            export.frames
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_runner_stops_when_hydro_ends() {
        let frames = (0..4).map(|_| HydroFrame::uniform(9, 9, 0.3)).collect();
        let history = HydroHistory::new(0.6, 0.2, 0.5, 9, 9, frames).unwrap();
        let path = std::env::temp_dir().join(format!("lbtlgv-runner-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&history).unwrap()).unwrap();

        let card = ScenarioId::HydroLgv
            .run_card(200, 100, 1, Some(path.as_path()))
            .unwrap();
        let mut export = JsonHistoryExport::new("hydro", 5);
        let result = Runner::new(card, 5).run(&mut export).unwrap();

        assert!(result.terminated);
        assert_eq!(result.steps, 3);
        assert_relative_eq!(result.final_time, 1.2, epsilon = 1e-9);
        let steps: Vec<u64> = export.frames.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert_eq!(result.frames_recorded, export.frames.len());
        std::fs::remove_file(path).ok();
    }
}
