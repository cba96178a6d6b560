//! Langevin heavy-quark evolution.

use super::{check_finite, Outgoing, ScatteringKernel};
use crate::config::LgvConfig;
use crate::error::EventError;
use crate::kinematics::{boost, on_shell, three, HBARC};
use lbtlgv_env::{MediumState, Species};
use nalgebra::{Vector3, Vector4};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Drag and white-noise kicks in the fluid rest frame.
///
/// Momentum-space diffusion `kappa = 4 pi T^3 (1 + Nf/6) / ds_2pit`; the
/// drag follows either from the Einstein relation at the current energy
/// or from the non-relativistic `kappa / (2 T M)`.
#[derive(Debug, Clone)]
pub struct LangevinKernel {
    config: LgvConfig,
}

impl LangevinKernel {
    pub fn new(config: LgvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LgvConfig {
        &self.config
    }

    /// Momentum diffusion coefficient kappa (GeV^3).
    pub fn kappa(&self, temperature: f64) -> f64 {
        let nf = self.config.nf as f64;
        4.0 * PI * temperature.powi(3) * (1.0 + nf / 6.0) / self.config.ds_2pit
    }

    /// Drag coefficient eta (GeV) at rest-frame energy `energy`.
    pub fn drag(&self, temperature: f64, energy: f64) -> f64 {
        let inertia = if self.config.einstein {
            energy
        } else {
            self.config.mass
        };
        self.kappa(temperature) / (2.0 * temperature * inertia)
    }
}

fn gaussian3(rng: &mut dyn RngCore) -> Vector3<f64> {
    Vector3::new(
        StandardNormal.sample(&mut *rng),
        StandardNormal.sample(&mut *rng),
        StandardNormal.sample(&mut *rng),
    )
}

impl ScatteringKernel for LangevinKernel {
    fn name(&self) -> &'static str {
        "LGV"
    }

    fn mass(&self) -> f64 {
        self.config.mass
    }

    fn conserves_count(&self) -> bool {
        true
    }

    fn update(
        &self,
        species: Species,
        momentum: &Vector4<f64>,
        medium: &MediumState,
        dt: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Outgoing>, EventError> {
        let temperature = medium.temperature;
        if species != Species::HeavyQuark || !self.config.elastic || temperature <= 0.0 {
            return Ok(vec![Outgoing::new(species, *momentum)]);
        }

        let mass = self.config.mass;
        let p_lrf = boost(momentum, &medium.flow);
        // Rest-frame duration of the lab step for this particle
        let dt_lrf = dt * p_lrf[0] / momentum[0];
        let substeps = (dt_lrf / self.config.dt_lrf).ceil().max(1.0) as usize;
        let h = dt_lrf / substeps as f64 / HBARC;
        let kappa = self.kappa(temperature);

        let mut p3 = three(&p_lrf);
        for _ in 0..substeps {
            let energy = (p3.norm_squared() + mass * mass).sqrt();
            let eta = self.drag(temperature, energy);
            p3 = p3 * (1.0 - eta * h) + gaussian3(rng) * (kappa * h).sqrt();
        }

        let out = vec![Outgoing::new(
            Species::HeavyQuark,
            boost(&on_shell(&p3, mass), &(-medium.flow)),
        )];
        check_finite(self.name(), &out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::mass_squared;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn charm_at(p: f64) -> Vector4<f64> {
        on_shell(&Vector3::new(0.0, 0.0, p), 1.3)
    }

    #[test]
    fn test_lgv_coefficients() {
        let kernel = LangevinKernel::new(LgvConfig::charm());
        let kappa = kernel.kappa(0.3);
        assert_relative_eq!(kappa, 4.0 * PI * 0.027 * 1.5 / 4.0, epsilon = 1e-12);
        assert_relative_eq!(kernel.drag(0.3, 2.0), kappa / 1.2, epsilon = 1e-12);

        let mut cfg = LgvConfig::charm();
        cfg.einstein = false;
        let kernel = LangevinKernel::new(cfg);
        assert_relative_eq!(kernel.drag(0.3, 2.0), kappa / (0.6 * 1.3), epsilon = 1e-12);
    }

    #[test]
    fn test_lgv_always_one_output() {
        let kernel = LangevinKernel::new(LgvConfig::charm());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let medium = MediumState::new(0.4, Vector3::new(0.3, 0.0, 0.2));
        let mut p = charm_at(5.0);
        for _ in 0..200 {
            let out = kernel.update(Species::HeavyQuark, &p, &medium, 0.1, &mut rng).unwrap();
            assert_eq!(out.len(), 1);
            assert_relative_eq!(mass_squared(&out[0].momentum), 1.69, epsilon = 1e-8);
            p = out[0].momentum;
        }
    }

    #[test]
    fn test_lgv_inelastic_off_is_identity() {
        let mut cfg = LgvConfig::charm();
        cfg.elastic = false;
        let kernel = LangevinKernel::new(cfg);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = charm_at(3.0);
        let out = kernel
            .update(Species::HeavyQuark, &p, &MediumState::at_rest(0.3), 0.5, &mut rng)
            .unwrap();
        assert_eq!(out, vec![Outgoing::new(Species::HeavyQuark, p)]);
    }

    #[test]
    fn test_lgv_cold_medium_is_identity() {
        let kernel = LangevinKernel::new(LgvConfig::charm());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = charm_at(3.0);
        let out = kernel
            .update(Species::HeavyQuark, &p, &MediumState::vacuum(), 0.5, &mut rng)
            .unwrap();
        assert_eq!(out[0].momentum, p);
    }

    #[test]
    fn test_lgv_drag_slows_fast_quarks() {
        let kernel = LangevinKernel::new(LgvConfig::charm());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let medium = MediumState::at_rest(0.3);

        let n = 400;
        let mut mean_pz = 0.0;
        for _ in 0..n {
            let mut p = charm_at(10.0);
            for _ in 0..20 {
                p = kernel.update(Species::HeavyQuark, &p, &medium, 0.1, &mut rng).unwrap()[0]
                    .momentum;
            }
            mean_pz += p[3];
        }
        mean_pz /= n as f64;
        assert!(mean_pz < 9.0, "mean pz {} did not drop", mean_pz);
        assert!(mean_pz > 5.0, "mean pz {} dropped too far", mean_pz);
    }
}
