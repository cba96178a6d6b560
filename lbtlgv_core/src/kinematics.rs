//! Four-momentum helpers.
//!
//! Four-momenta are `Vector4` in `(E, px, py, pz)` order, GeV.
//! Positions are `Vector3` in fm.

use nalgebra::{Vector3, Vector4};
use rand::Rng;
use std::f64::consts::PI;

/// hbar * c in GeV fm.
pub const HBARC: f64 = 0.1973;

/// Spatial part of a four-momentum.
pub fn three(p: &Vector4<f64>) -> Vector3<f64> {
    Vector3::new(p[1], p[2], p[3])
}

/// Puts a three-momentum on the mass shell.
pub fn on_shell(p3: &Vector3<f64>, mass: f64) -> Vector4<f64> {
    let e = (p3.norm_squared() + mass * mass).sqrt();
    Vector4::new(e, p3.x, p3.y, p3.z)
}

/// Four-momentum from transverse momentum, azimuth and rapidity.
pub fn from_pt_phi_y(pt: f64, phi: f64, rapidity: f64, mass: f64) -> Vector4<f64> {
    let mt = (pt * pt + mass * mass).sqrt();
    Vector4::new(
        mt * rapidity.cosh(),
        pt * phi.cos(),
        pt * phi.sin(),
        mt * rapidity.sinh(),
    )
}

pub fn transverse_momentum(p: &Vector4<f64>) -> f64 {
    (p[1] * p[1] + p[2] * p[2]).sqrt()
}

/// Invariant mass squared, `E^2 - |p|^2`.
pub fn mass_squared(p: &Vector4<f64>) -> f64 {
    p[0] * p[0] - three(p).norm_squared()
}

/// Three-velocity `p / E`.
pub fn velocity(p: &Vector4<f64>) -> Vector3<f64> {
    if p[0] > 0.0 {
        three(p) / p[0]
    } else {
        Vector3::zeros()
    }
}

/// Lorentz boost into a frame moving with velocity `v` (|v| < 1).
///
/// Boosting by `-v` undoes the transformation.
pub fn boost(p: &Vector4<f64>, v: &Vector3<f64>) -> Vector4<f64> {
    let v2 = v.norm_squared();
    if v2 < 1e-24 {
        return *p;
    }
    let gamma = 1.0 / (1.0 - v2).sqrt();
    let p3 = three(p);
    let vp = v.dot(&p3);
    let e = gamma * (p[0] - vp);
    let q = p3 + v * ((gamma - 1.0) * vp / v2 - gamma * p[0]);
    Vector4::new(e, q.x, q.y, q.z)
}

/// Unit vector drawn uniformly on the sphere.
pub fn isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let cos_theta: f64 = rng.gen_range(-1.0..=1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi: f64 = rng.gen_range(0.0..2.0 * PI);
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Two unit vectors completing `axis` (assumed normalized) to an orthonormal basis.
pub fn orthonormal_basis(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let e1 = axis.cross(&helper).normalize();
    let e2 = axis.cross(&e1);
    (e1, e2)
}

/// Direction at polar angle `cos_theta` and azimuth `phi` around `axis`.
pub fn rotate_about(axis: &Vector3<f64>, cos_theta: f64, phi: f64) -> Vector3<f64> {
    let (e1, e2) = orthonormal_basis(axis);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    axis * cos_theta + (e1 * phi.cos() + e2 * phi.sin()) * sin_theta
}
