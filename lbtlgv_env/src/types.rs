//! Common types shared by the medium layer and the transport core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a tracked particle.
///
/// Identities are handed out sequentially by the ensemble and never reused,
/// so the inner value doubles as the arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl ParticleId {
    /// Returns the arena index for this identity.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ParticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parton species tracked by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Charm (or bottom) quark evolved by the kernels
    HeavyQuark,

    /// Radiated gluon produced by LBT 2->3 branching
    Gluon,
}

impl Species {
    /// PDG Monte Carlo id.
    pub fn pdg_id(&self) -> i32 {
        match self {
            Species::HeavyQuark => 4,
            Species::Gluon => 21,
        }
    }
}

/// Identifier for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a deterministic RunId from a seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_deterministic() {
        assert_eq!(RunId::from_seed(42), RunId::from_seed(42));
        assert_ne!(RunId::from_seed(42), RunId::from_seed(43));
        assert_eq!(RunId::from_seed(7).to_string().len(), 8);
    }

    #[test]
    fn test_species_pdg() {
        assert_eq!(Species::HeavyQuark.pdg_id(), 4);
        assert_eq!(Species::Gluon.pdg_id(), 21);
    }

    #[test]
    fn test_particle_id_index() {
        assert_eq!(ParticleId(17).index(), 17);
        assert_eq!(ParticleId(3).to_string(), "#3");
    }
}
