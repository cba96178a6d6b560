//! Particle ensemble: arena of tracked partons with logical deletion.

use crate::kinematics;
use lbtlgv_env::{ParticleId, Species};
use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleStatus {
    Active,
    /// Removed by the kernel (empty output)
    Absorbed,
    /// Left the medium's spatial domain
    Escaped,
}

/// A tracked parton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Stable identity, never reused
    pub id: ParticleId,

    pub species: Species,

    /// Four-momentum `(E, px, py, pz)` in GeV
    pub momentum: Vector4<f64>,

    /// Position in fm
    pub position: Vector3<f64>,

    pub status: ParticleStatus,

    /// Initialized heavy quark this particle descends from
    pub origin: ParticleId,
}

impl Particle {
    pub fn is_active(&self) -> bool {
        self.status == ParticleStatus::Active
    }

    pub fn transverse_momentum(&self) -> f64 {
        kinematics::transverse_momentum(&self.momentum)
    }
}

/// Position and momentum of a particle about to enter the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSeed {
    pub species: Species,
    pub momentum: Vector4<f64>,
    pub position: Vector3<f64>,
}

impl ParticleSeed {
    pub fn heavy_quark(momentum: Vector4<f64>, position: Vector3<f64>) -> Self {
        Self {
            species: Species::HeavyQuark,
            momentum,
            position,
        }
    }
}

/// Arena of particles indexed by identity.
///
/// Removal only flips the status, so identities stay valid as indices and
/// the initial-pT record (indexed by identity) never desynchronizes.
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    particles: Vec<Particle>,
    initial_pt: Vec<f64>,
    active: usize,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an ensemble from initializer output.
    ///
    /// `initial_pt[i]` belongs to the i-th seed, which receives identity `i`.
    pub fn from_seeds(seeds: Vec<ParticleSeed>, initial_pt: Vec<f64>) -> Self {
        debug_assert_eq!(seeds.len(), initial_pt.len());
        let mut ensemble = Self {
            particles: Vec::with_capacity(seeds.len()),
            initial_pt,
            active: 0,
        };
        for seed in seeds {
            ensemble.add(seed);
        }
        ensemble
    }

    fn next_id(&self) -> ParticleId {
        ParticleId(self.particles.len() as u64)
    }

    /// Appends a particle that is its own origin.
    pub fn add(&mut self, seed: ParticleSeed) -> ParticleId {
        let id = self.next_id();
        self.push(id, seed, id)
    }

    /// Appends a particle produced by `parent`, inheriting its origin.
    pub fn add_descendant(&mut self, seed: ParticleSeed, parent: ParticleId) -> ParticleId {
        let id = self.next_id();
        let origin = self.get(parent).map(|p| p.origin).unwrap_or(parent);
        self.push(id, seed, origin)
    }

    fn push(&mut self, id: ParticleId, seed: ParticleSeed, origin: ParticleId) -> ParticleId {
        self.particles.push(Particle {
            id,
            species: seed.species,
            momentum: seed.momentum,
            position: seed.position,
            status: ParticleStatus::Active,
            origin,
        });
        self.active += 1;
        id
    }

    /// Marks an active particle inactive with the given final status.
    ///
    /// Returns false if the particle is unknown or already inactive.
    pub fn remove(&mut self, id: ParticleId, status: ParticleStatus) -> bool {
        debug_assert!(status != ParticleStatus::Active);
        match self.particles.get_mut(id.index()) {
            Some(p) if p.is_active() => {
                p.status = status;
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    /// Active particles in insertion order.
    ///
    /// The iterator is `Clone`, so a consumer can restart it.
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> + Clone + '_ {
        self.particles.iter().filter(|p| p.is_active())
    }

    /// Every particle ever created, including inactive ones.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter()
    }

    /// Identities of the currently active particles.
    pub fn active_ids(&self) -> Vec<ParticleId> {
        self.iter_active().map(|p| p.id).collect()
    }

    pub fn size_active(&self) -> usize {
        self.active
    }

    /// Number of identities handed out so far.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Initial transverse momenta recorded at initialization.
    pub fn initial_pt(&self) -> &[f64] {
        &self.initial_pt
    }

    /// Initial pT of the heavy quark a particle descends from.
    pub fn initial_pt_of(&self, id: ParticleId) -> Option<f64> {
        let origin = self.get(id)?.origin;
        self.initial_pt.get(origin.index()).copied()
    }

    /// Counts particles by final status: `(active, absorbed, escaped)`.
    pub fn status_counts(&self) -> (usize, usize, usize) {
        self.particles
            .iter()
            .fold((0, 0, 0), |(a, b, e), p| match p.status {
                ParticleStatus::Active => (a + 1, b, e),
                ParticleStatus::Absorbed => (a, b + 1, e),
                ParticleStatus::Escaped => (a, b, e + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn seed(px: f64) -> ParticleSeed {
        ParticleSeed::heavy_quark(
            kinematics::on_shell(&Vector3::new(px, 0.0, 0.0), 1.3),
            Vector3::zeros(),
        )
    }

    #[test]
    fn test_ensemble_from_seeds() {
        let ensemble = Ensemble::from_seeds(vec![seed(1.0), seed(2.0)], vec![1.0, 2.0]);
        assert_eq!(ensemble.size_active(), 2);
        assert_eq!(ensemble.initial_pt(), &[1.0, 2.0]);
        assert_eq!(ensemble.get(ParticleId(1)).unwrap().origin, ParticleId(1));
    }

    #[test]
    fn test_ensemble_remove_is_logical() {
        let mut ensemble = Ensemble::from_seeds(vec![seed(1.0), seed(2.0), seed(3.0)], vec![1.0, 2.0, 3.0]);

        assert!(ensemble.remove(ParticleId(1), ParticleStatus::Escaped));
        assert!(!ensemble.remove(ParticleId(1), ParticleStatus::Absorbed));
        assert!(!ensemble.remove(ParticleId(9), ParticleStatus::Absorbed));

        assert_eq!(ensemble.size_active(), 2);
        assert_eq!(ensemble.len(), 3);
        assert_eq!(ensemble.active_ids(), vec![ParticleId(0), ParticleId(2)]);
        assert_eq!(
            ensemble.get(ParticleId(1)).unwrap().status,
            ParticleStatus::Escaped
        );
        assert_eq!(ensemble.initial_pt().len(), 3);
        assert_eq!(ensemble.status_counts(), (2, 0, 1));
    }

    #[test]
    fn test_ensemble_iter_active_restartable() {
        let ensemble = Ensemble::from_seeds(vec![seed(1.0), seed(2.0)], vec![1.0, 2.0]);
        let iter = ensemble.iter_active();
        let first: Vec<_> = iter.clone().map(|p| p.id).collect();
        let second: Vec<_> = iter.map(|p| p.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ensemble_descendant_inherits_origin() {
        let mut ensemble = Ensemble::from_seeds(vec![seed(1.0), seed(2.0)], vec![1.0, 2.0]);
        let child = ensemble.add_descendant(seed(0.5), ParticleId(1));
        let grandchild = ensemble.add_descendant(seed(0.2), child);

        assert_eq!(child, ParticleId(2));
        assert_eq!(ensemble.get(grandchild).unwrap().origin, ParticleId(1));
        assert_eq!(ensemble.initial_pt_of(grandchild), Some(2.0));
        assert_eq!(ensemble.initial_pt().len(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Branch(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Add),
            (0usize..64).prop_map(Op::Branch),
            (0usize..64).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_identities_never_collide(initial in 1usize..16, ops in prop::collection::vec(op(), 0..200)) {
            let seeds = (0..initial).map(|i| seed(i as f64)).collect();
            let pts = (0..initial).map(|i| i as f64).collect();
            let mut ensemble = Ensemble::from_seeds(seeds, pts);
            let mut seen: HashSet<ParticleId> = ensemble.iter().map(|p| p.id).collect();

            for op in ops {
                match op {
                    Op::Add => {
                        prop_assert!(seen.insert(ensemble.add(seed(1.0))));
                    }
                    Op::Branch(i) => {
                        let parent = ParticleId((i % ensemble.len()) as u64);
                        prop_assert!(seen.insert(ensemble.add_descendant(seed(1.0), parent)));
                    }
                    Op::Remove(i) => {
                        ensemble.remove(ParticleId((i % ensemble.len()) as u64), ParticleStatus::Escaped);
                    }
                }
                prop_assert_eq!(ensemble.size_active(), ensemble.iter_active().count());
                prop_assert_eq!(ensemble.initial_pt().len(), initial);
            }

            for (index, p) in ensemble.iter().enumerate() {
                prop_assert_eq!(p.id.index(), index);
                prop_assert!(p.origin <= p.id);
            }
        }
    }
}
