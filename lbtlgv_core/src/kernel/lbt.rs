//! Linear Boltzmann transport kernel.

use super::{check_finite, Outgoing, ScatteringKernel};
use crate::config::LbtConfig;
use crate::error::EventError;
use crate::kinematics::{boost, isotropic_direction, on_shell, rotate_about, three, HBARC};
use lbtlgv_env::{MediumState, Species};
use nalgebra::{Vector3, Vector4};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Gamma};
use std::f64::consts::PI;

const C_F: f64 = 4.0 / 3.0;
const C_A: f64 = 3.0;

/// Gluons softer than this many T in the fluid frame thermalize.
const GLUON_ABSORPTION: f64 = 3.0;

/// Radiation needs `E > RADIATION_THRESHOLD * T` in the fluid frame.
const RADIATION_THRESHOLD: f64 = 4.0;

/// Per-channel scattering rates in the fluid frame (GeV).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelRates {
    pub elastic: f64,
    pub radiative: f64,
    pub absorptive: f64,
}

impl ChannelRates {
    pub fn total(&self) -> f64 {
        self.elastic + self.radiative + self.absorptive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Elastic,
    Radiative,
    Absorptive,
}

/// Stochastic scatterings off a thermal medium of light partons.
///
/// Per step the quark scatters with probability `1 - exp(-Gamma dt')`,
/// then one channel is picked by rate:
///
/// - **2->2**: elastic scattering off a thermal parton, screened
///   `1/(|t| + m_D^2)^2` momentum transfer
/// - **2->3**: emits a gluon, output `[quark, gluon]`
/// - **3->2**: absorbs a thermal gluon
#[derive(Debug, Clone)]
pub struct LbtKernel {
    config: LbtConfig,
}

impl LbtKernel {
    pub fn new(config: LbtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LbtConfig {
        &self.config
    }

    fn flavour_factor(&self) -> f64 {
        1.0 + self.config.nf as f64 / 6.0
    }

    /// Debye screening mass squared (GeV^2).
    pub fn debye_mass2(&self, temperature: f64) -> f64 {
        4.0 * PI * self.config.alpha_s * temperature * temperature * self.flavour_factor()
    }

    /// Rates at temperature `temperature` for rest-frame energy `energy`.
    pub fn rates(&self, temperature: f64, energy: f64) -> ChannelRates {
        if temperature <= 0.0 {
            return ChannelRates::default();
        }
        let alpha_s = self.config.alpha_s;
        let base = C_F * alpha_s * temperature * self.flavour_factor();
        let gluon = base * C_A * alpha_s / PI;

        ChannelRates {
            elastic: if self.config.elastic { base } else { 0.0 },
            radiative: if self.config.radiative && energy > RADIATION_THRESHOLD * temperature {
                gluon * (1.0 + energy / (2.0 * temperature)).ln()
            } else {
                0.0
            },
            absorptive: if self.config.absorptive {
                gluon * temperature / energy
            } else {
                0.0
            },
        }
    }

    fn pick_channel(rates: &ChannelRates, rng: &mut dyn RngCore) -> Channel {
        let r = rng.gen::<f64>() * rates.total();
        if r < rates.elastic {
            Channel::Elastic
        } else if r < rates.elastic + rates.radiative {
            Channel::Radiative
        } else {
            Channel::Absorptive
        }
    }

    /// Massless thermal parton, energy ~ E^2 exp(-E/T).
    fn thermal_parton(temperature: f64, rng: &mut dyn RngCore) -> Result<Vector4<f64>, EventError> {
        let energy: f64 = Gamma::new(3.0, temperature)
            .map_err(|e| EventError::kernel(format!("thermal spectrum at T={}: {}", temperature, e)))?
            .sample(&mut *rng);
        let k = isotropic_direction(&mut *rng) * energy;
        Ok(Vector4::new(energy, k.x, k.y, k.z))
    }

    /// Momentum transfer squared on `[0, q2_max]` with density `1/(q2 + m_D^2)^2`.
    fn screened_q2(md2: f64, q2_max: f64, u: f64) -> f64 {
        let a = 1.0 / md2;
        let b = 1.0 / (q2_max + md2);
        (1.0 / (a - u * (a - b)) - md2).clamp(0.0, q2_max)
    }

    fn elastic(
        &self,
        p: &Vector4<f64>,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vector4<f64>, EventError> {
        let k = Self::thermal_parton(temperature, rng)?;
        let total = p + k;
        let beta = three(&total) / total[0];

        let p_cm = boost(p, &beta);
        let pcm = three(&p_cm).norm();
        if pcm <= 0.0 {
            return Ok(*p);
        }
        let q2 = Self::screened_q2(self.debye_mass2(temperature), 4.0 * pcm * pcm, rng.gen());
        let cos_theta = (1.0 - q2 / (2.0 * pcm * pcm)).clamp(-1.0, 1.0);
        let phi = rng.gen_range(0.0..2.0 * PI);

        let dir = rotate_about(&(three(&p_cm) / pcm), cos_theta, phi);
        let scattered = Vector4::new(p_cm[0], dir.x * pcm, dir.y * pcm, dir.z * pcm);
        Ok(boost(&scattered, &(-beta)))
    }

    /// Returns `(quark, gluon)` after emitting a gluon.
    fn radiate(
        &self,
        p: &Vector4<f64>,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> (Vector4<f64>, Vector4<f64>) {
        let energy = p[0];
        let p3 = three(p);
        let axis = if p3.norm() > 0.0 {
            p3.normalize()
        } else {
            Vector3::z()
        };

        // Energy fraction x ~ 1/x on [2T/E, 1/2]
        let x_min = 2.0 * temperature / energy;
        let x = x_min * (0.5 / x_min).powf(rng.gen::<f64>());
        let omega = x * energy;

        let kt2 = Self::screened_q2(self.debye_mass2(temperature), omega * omega, rng.gen());
        let cos_theta = ((omega * omega - kt2).max(0.0).sqrt() / omega).clamp(-1.0, 1.0);
        let phi = rng.gen_range(0.0..2.0 * PI);
        let k3 = rotate_about(&axis, cos_theta, phi) * omega;

        let quark = on_shell(&(p3 - k3), self.config.mass);
        (quark, Vector4::new(omega, k3.x, k3.y, k3.z))
    }

    fn absorb(
        &self,
        p: &Vector4<f64>,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vector4<f64>, EventError> {
        let k = Self::thermal_parton(temperature, rng)?;
        Ok(on_shell(&(three(p) + three(&k)), self.config.mass))
    }
}

impl ScatteringKernel for LbtKernel {
    fn name(&self) -> &'static str {
        "LBT"
    }

    fn mass(&self) -> f64 {
        self.config.mass
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
        if temperature <= 0.0 {
            return Ok(vec![Outgoing::new(species, *momentum)]);
        }
        let p_lrf = boost(momentum, &medium.flow);

        if species == Species::Gluon {
            if p_lrf[0] < GLUON_ABSORPTION * temperature {
                return Ok(Vec::new());
            }
            return Ok(vec![Outgoing::new(species, *momentum)]);
        }

        let rates = self.rates(temperature, p_lrf[0]);
        let dt_lrf = dt * p_lrf[0] / momentum[0];
        let probability = 1.0 - (-rates.total() * dt_lrf / HBARC).exp();
        if rates.total() <= 0.0 || rng.gen::<f64>() >= probability {
            return Ok(vec![Outgoing::new(species, *momentum)]);
        }

        let back = -medium.flow;
        let out = match Self::pick_channel(&rates, rng) {
            Channel::Elastic => {
                let q = self.elastic(&p_lrf, temperature, rng)?;
                vec![Outgoing::new(Species::HeavyQuark, boost(&q, &back))]
            }
            Channel::Radiative => {
                let (q, g) = self.radiate(&p_lrf, temperature, rng);
                vec![
                    Outgoing::new(Species::HeavyQuark, boost(&q, &back)),
                    Outgoing::new(Species::Gluon, boost(&g, &back)),
                ]
            }
            Channel::Absorptive => {
                let q = self.absorb(&p_lrf, temperature, rng)?;
                vec![Outgoing::new(Species::HeavyQuark, boost(&q, &back))]
            }
        };
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

    fn only(elastic: bool, radiative: bool, absorptive: bool) -> LbtKernel {
        LbtKernel::new(LbtConfig {
            elastic,
            radiative,
            absorptive,
            ..LbtConfig::charm()
        })
    }

    fn charm_at(p: f64) -> Vector4<f64> {
        on_shell(&Vector3::new(p, 0.0, 0.0), 1.3)
    }

    #[test]
    fn test_lbt_rates() {
        let kernel = only(true, true, true);
        let rates = kernel.rates(0.3, 10.0);
        assert_relative_eq!(rates.elastic, C_F * 0.3 * 0.3 * 1.5, epsilon = 1e-12);
        assert!(rates.radiative > 0.0);
        assert!(rates.absorptive > 0.0);

        // Below the radiation threshold
        assert_eq!(kernel.rates(0.3, 1.0).radiative, 0.0);

        let none = only(false, false, false).rates(0.3, 10.0);
        assert_eq!(none.total(), 0.0);
        assert_eq!(kernel.rates(0.0, 10.0).total(), 0.0);
    }

    #[test]
    fn test_lbt_screened_q2_bounds() {
        for u in [0.0, 0.25, 0.5, 0.999] {
            let q2 = LbtKernel::screened_q2(0.5, 4.0, u);
            assert!((0.0..=4.0).contains(&q2));
        }
        assert_relative_eq!(LbtKernel::screened_q2(0.5, 4.0, 0.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lbt_no_channels_is_identity() {
        let kernel = only(false, false, false);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let p = charm_at(5.0);
        let out = kernel
            .update(Species::HeavyQuark, &p, &MediumState::at_rest(0.4), 1.0, &mut rng)
            .unwrap();
        assert_eq!(out, vec![Outgoing::new(Species::HeavyQuark, p)]);
    }

    #[test]
    fn test_lbt_elastic_stays_on_shell() {
        let kernel = only(true, false, false);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let medium = MediumState::new(0.35, Vector3::new(0.0, 0.4, 0.3));
        let mut p = charm_at(8.0);
        let mut changed = 0;
        for _ in 0..300 {
            let out = kernel.update(Species::HeavyQuark, &p, &medium, 0.5, &mut rng).unwrap();
            assert_eq!(out.len(), 1);
            assert_relative_eq!(mass_squared(&out[0].momentum), 1.69, epsilon = 1e-8);
            if out[0].momentum != p {
                changed += 1;
            }
            p = out[0].momentum;
        }
        assert!(changed > 50);
    }

    #[test]
    fn test_lbt_radiation_emits_gluon() {
        let kernel = only(false, true, false);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let medium = MediumState::at_rest(0.4);
        let p = charm_at(20.0);

        let mut emitted = 0;
        for _ in 0..200 {
            let out = kernel.update(Species::HeavyQuark, &p, &medium, 1.0, &mut rng).unwrap();
            if out.len() == 2 {
                emitted += 1;
                assert_eq!(out[0].species, Species::HeavyQuark);
                assert_eq!(out[1].species, Species::Gluon);
                let gluon = out[1].momentum;
                assert!(gluon[0] >= 0.8 - 1e-9 && gluon[0] <= 0.5 * p[0] + 1e-9);
                assert_relative_eq!(mass_squared(&gluon), 0.0, epsilon = 1e-8);
                let recoil = three(&out[0].momentum) + three(&gluon);
                assert_relative_eq!(recoil, three(&p), epsilon = 1e-9);
            } else {
                assert_eq!(out.len(), 1);
            }
        }
        assert!(emitted > 20);
    }

    #[test]
    fn test_lbt_soft_gluon_absorbed() {
        let kernel = only(true, true, true);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let medium = MediumState::at_rest(0.3);

        let soft = Vector4::new(0.5, 0.5, 0.0, 0.0);
        let out = kernel.update(Species::Gluon, &soft, &medium, 0.1, &mut rng).unwrap();
        assert!(out.is_empty());

        let hard = Vector4::new(5.0, 0.0, 5.0, 0.0);
        let out = kernel.update(Species::Gluon, &hard, &medium, 0.1, &mut rng).unwrap();
        assert_eq!(out, vec![Outgoing::new(Species::Gluon, hard)]);
    }

    #[test]
    fn test_lbt_absorption_adds_thermal_momentum() {
        let kernel = only(false, false, true);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let medium = MediumState::at_rest(0.5);
        let p = on_shell(&Vector3::zeros(), 1.3);

        let mut hits = 0;
        for _ in 0..500 {
            let out = kernel.update(Species::HeavyQuark, &p, &medium, 2.0, &mut rng).unwrap();
            assert_eq!(out.len(), 1);
            if out[0].momentum != p {
                hits += 1;
                assert!(out[0].momentum[0] > 1.3);
            }
        }
        assert!(hits > 10);
    }

    #[test]
    fn test_lbt_deterministic_for_seed() {
        let kernel = only(true, true, true);
        let medium = MediumState::at_rest(0.4);
        let p = charm_at(15.0);
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|_| kernel.update(Species::HeavyQuark, &p, &medium, 0.5, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
