//! The event driver: owns the clock and the ensemble, mediates between
//! the medium and the scattering kernel.

use crate::config::{InitConfig, MediumConfig, PhysicsConfig};
use crate::ensemble::{Ensemble, ParticleSeed, ParticleStatus};
use crate::error::EventError;
use crate::history::{HistoryRecord, HistorySnapshot};
use crate::initializer;
use crate::kernel::{self, ScatteringKernel};
use crate::kinematics;
use lbtlgv_env::{MediumError, MediumProvider, StaticProperties};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Counters for a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub updated: usize,
    pub free_streamed: usize,
    pub created: usize,
    pub absorbed: usize,
    pub escaped: usize,
}

/// Heavy-quark transport session.
///
/// Lifecycle: `new` → `initialize_hq` → `step` until it returns `false`.
/// Time advances on the medium's grid, `start_time + n * time_step`.
pub struct EventDriver {
    medium_config: MediumConfig,
    physics_config: PhysicsConfig,

    medium: Box<dyn MediumProvider>,
    kernel: Box<dyn ScatteringKernel>,

    /// None until `initialize_hq`
    ensemble: Option<Ensemble>,

    /// Completed steps
    step_count: u64,

    seed: u64,

    /// Stream for initial-state sampling
    init_rng: ChaCha8Rng,

    /// Stream handed to the kernel
    kernel_rng: ChaCha8Rng,

    history: Vec<HistoryRecord>,
    last_stats: StepStats,
}

impl EventDriver {
    /// Validates both configurations and builds the medium and kernel.
    ///
    /// A dynamic medium's history is loaded here; a missing or unreadable
    /// file is a `ConfigError`.
    pub fn new(
        medium_config: MediumConfig,
        physics_config: PhysicsConfig,
    ) -> Result<Self, EventError> {
        let kernel = kernel::build_kernel(&physics_config)?;
        let medium = medium_config.build()?;

        info!(
            "Event driver: {} medium (t0={}, dt={}), {} physics, M={} GeV",
            medium.name(),
            medium.start_time(),
            medium.time_step(),
            kernel.name(),
            kernel.mass()
        );

        Ok(Self {
            medium_config,
            physics_config,
            medium,
            kernel,
            ensemble: None,
            step_count: 0,
            seed: DEFAULT_SEED,
            init_rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
            kernel_rng: ChaCha8Rng::seed_from_u64(kernel_seed(DEFAULT_SEED)),
            history: Vec::new(),
            last_stats: StepStats::default(),
        })
    }

    /// Reseeds both random streams.
    ///
    /// Initial-state sampling and kernel randomness use separate streams so
    /// changing the particle count does not shift the kernel's draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.init_rng = ChaCha8Rng::seed_from_u64(seed);
        self.kernel_rng = ChaCha8Rng::seed_from_u64(kernel_seed(seed));
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn medium_config(&self) -> &MediumConfig {
        &self.medium_config
    }

    pub fn physics_config(&self) -> &PhysicsConfig {
        &self.physics_config
    }

    pub fn medium(&self) -> &dyn MediumProvider {
        self.medium.as_ref()
    }

    /// Populates the ensemble with `count` heavy quarks.
    ///
    /// Replaces any existing ensemble. Particles start at the current time.
    pub fn initialize_hq(&mut self, count: usize, init: &InitConfig) -> Result<(), EventError> {
        let state =
            initializer::sample(init, count, self.physics_config.mass(), &mut self.init_rng)?;

        if let Some(old) = &self.ensemble {
            warn!(
                "Replacing existing ensemble of {} particles ({} active)",
                old.len(),
                old.size_active()
            );
        }
        self.ensemble = Some(Ensemble::from_seeds(state.seeds, state.initial_pt));

        info!(
            "Initialized {} heavy quarks ({} init) at t={}",
            count,
            init.tag(),
            self.current_time()
        );
        Ok(())
    }

    /// Initial transverse momenta, one per initialized heavy quark.
    pub fn initial_pt_snapshot(&self) -> Result<&[f64], EventError> {
        Ok(self.ensemble()?.initial_pt())
    }

    pub fn current_time(&self) -> f64 {
        self.medium.start_time() + self.step_count as f64 * self.medium.time_step()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// The ensemble, or `StateError` before initialization.
    pub fn ensemble(&self) -> Result<&Ensemble, EventError> {
        self.ensemble
            .as_ref()
            .ok_or_else(|| EventError::state("ensemble not initialized; call initialize_hq first"))
    }

    /// Counters of the most recent completed step.
    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Advances every active particle by one time step.
    ///
    /// `static_override` replaces the medium lookup when the medium is a
    /// static box; it is validated on every call and ignored by a dynamic
    /// medium. Returns `false` once the medium can no longer cover a step
    /// or the ensemble is empty, without advancing time.
    pub fn step(&mut self, static_override: Option<&StaticProperties>) -> Result<bool, EventError> {
        if let Some(props) = static_override {
            props
                .validate()
                .map_err(|e| EventError::config(format!("static override: {}", e)))?;
        }

        let time = self.current_time();
        let dt = self.medium.time_step();
        let tc = self.medium.critical_temperature();

        let ensemble = self
            .ensemble
            .as_mut()
            .ok_or_else(|| EventError::state("step called before initialize_hq"))?;

        if ensemble.size_active() == 0 {
            debug!("Ensemble empty at t={}", time);
            return Ok(false);
        }
        if !self.medium.covers(time) {
            info!("{} medium exhausted at t={}", self.medium.name(), time);
            return Ok(false);
        }

        let fixed_state = match static_override {
            Some(props) if self.medium.accepts_override() => Some(props.state()),
            Some(_) => {
                debug!("Static override ignored by {} medium", self.medium.name());
                None
            }
            None => None,
        };

        let mut stats = StepStats::default();
        for id in ensemble.active_ids() {
            let Some(particle) = ensemble.get(id) else {
                continue;
            };
            let (species, momentum, position) =
                (particle.species, particle.momentum, particle.position);

            let state = match fixed_state {
                Some(state) => state,
                None => match self.medium.lookup(time, &position) {
                    Ok(state) => state,
                    Err(MediumError::OutsideDomain(reason)) => {
                        debug!("Particle {} escaped: {}", id, reason);
                        ensemble.remove(id, ParticleStatus::Escaped);
                        stats.escaped += 1;
                        continue;
                    }
                    Err(e) if e.is_exhausted() => {
                        info!("{} medium exhausted mid-step: {}", self.medium.name(), e);
                        return Ok(false);
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            let outputs = if state.temperature > tc {
                stats.updated += 1;
                self.kernel
                    .update(species, &momentum, &state, dt, &mut self.kernel_rng)?
            } else {
                stats.free_streamed += 1;
                vec![kernel::Outgoing::new(species, momentum)]
            };
            if self.kernel.conserves_count() && outputs.len() != 1 {
                return Err(EventError::kernel(format!(
                    "{} returned {} particles for {}",
                    self.kernel.name(),
                    outputs.len(),
                    id
                )));
            }

            let mut outputs = outputs.into_iter();
            let Some(first) = outputs.next() else {
                ensemble.remove(id, ParticleStatus::Absorbed);
                stats.absorbed += 1;
                continue;
            };
            if let Some(particle) = ensemble.get_mut(id) {
                particle.species = first.species;
                particle.momentum = first.momentum;
                particle.position += kinematics::velocity(&first.momentum) * dt;
            }
            for extra in outputs {
                ensemble.add_descendant(
                    ParticleSeed {
                        species: extra.species,
                        momentum: extra.momentum,
                        position,
                    },
                    id,
                );
                stats.created += 1;
            }
        }

        self.step_count += 1;
        self.last_stats = stats;
        let active = ensemble.size_active();
        debug!(
            "Step {} t={:.4}: active={} updated={} free={} created={} absorbed={} escaped={}",
            self.step_count,
            time + dt,
            active,
            stats.updated,
            stats.free_streamed,
            stats.created,
            stats.absorbed,
            stats.escaped
        );
        Ok(active > 0)
    }

    /// Lazy view of the current ensemble.
    pub fn history_snapshot(&self) -> Result<HistorySnapshot<'_>, EventError> {
        Ok(HistorySnapshot::new(self.ensemble()?))
    }

    /// Materializes the current snapshot into the history buffer.
    pub fn record_history(&mut self) -> Result<&HistoryRecord, EventError> {
        let record = self
            .history_snapshot()?
            .record(self.step_count, self.current_time());
        self.history.push(record);
        Ok(&self.history[self.history.len() - 1])
    }

    /// Recorded frames in recording order.
    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    /// Drains the history buffer, leaving it empty.
    pub fn take_history(&mut self) -> Vec<HistoryRecord> {
        std::mem::take(&mut self.history)
    }
}

fn kernel_seed(seed: u64) -> u64 {
    seed.wrapping_mul(0x9e3779b97f4a7c15)
}
