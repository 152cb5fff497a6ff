//! Seeded particle generators.
//!
//! The solver itself never creates particles; these produce reproducible
//! starting states for the demo binary and the tests. The same seed always
//! yields the same galaxy.

use std::f64::consts::TAU;

use nalgebra::convert;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::{
    error::Result,
    galaxy::Galaxy,
    shared::{Float, Vec2},
};

/// Orbit radii are drawn uniformly from this interval.
pub const ORBIT_RADII: (f64, f64) = (10.0, 100.0);

/// Hubble constant used by [`big_bang`].
pub const HUBBLE: f64 = 1.0;

/// Particles on circular orbits around an (absent) central mass at the origin.
///
/// Each particle sits at a uniform angle and a uniform radius in
/// [`ORBIT_RADII`], with mass `|N(2, 0.1)|` and tangential speed
/// `sqrt(g * central_mass / (r + eps))`. The central mass itself is not part of
/// the returned galaxy; add it with [`Galaxy::add`] if it should attract.
pub fn random_orbits<F: Float>(
    n: usize,
    seed: u64,
    central_mass: F,
    g: F,
    eps: F,
) -> Result<Galaxy<F>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mass_distribution = Normal::<f64>::new(2.0, 0.1)?;

    let mut positions = Vec::with_capacity(n);
    let mut velocities = Vec::with_capacity(n);
    let mut masses = Vec::with_capacity(n);
    for _ in 0..n {
        let angle: f64 = rng.random_range(0.0..TAU);
        let radius: f64 = rng.random_range(ORBIT_RADII.0..ORBIT_RADII.1);
        let position = Vec2::new(
            convert::<f64, F>(radius * angle.cos()),
            convert::<f64, F>(radius * angle.sin()),
        );

        let r = position.norm();
        let speed = (g * central_mass / (r + eps)).sqrt();
        let tangent = Vec2::new(-position.y, position.x) / r;

        positions.push(position);
        velocities.push(tangent * speed);
        masses.push(convert::<f64, F>(mass_distribution.sample(&mut rng).abs()));
    }
    log::debug!("Generated {} orbiting particles (seed {})", n, seed);
    Galaxy::new(positions, velocities, masses)
}

/// An expanding shell: random directions, radii uniform in `[1, 5)`, masses
/// `|N(1, 0.05)|` and outward Hubble flow `v = H0 * x`.
pub fn big_bang<F: Float>(n: usize, seed: u64) -> Result<Galaxy<F>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let direction_distribution = Normal::<f64>::new(0.0, 1.0)?;
    let mass_distribution = Normal::<f64>::new(1.0, 0.05)?;

    let mut positions = Vec::with_capacity(n);
    let mut velocities = Vec::with_capacity(n);
    let mut masses = Vec::with_capacity(n);
    for _ in 0..n {
        let dx: f64 = direction_distribution.sample(&mut rng);
        let dy: f64 = direction_distribution.sample(&mut rng);
        let length = dx.hypot(dy);
        let (ux, uy) = if length > 0.0 {
            (dx / length, dy / length)
        } else {
            (1.0, 0.0)
        };
        let radius: f64 = rng.random_range(1.0..5.0);
        let position = Vec2::new(convert::<f64, F>(ux * radius), convert::<f64, F>(uy * radius));

        velocities.push(position * convert::<f64, F>(HUBBLE));
        positions.push(position);
        masses.push(convert::<f64, F>(mass_distribution.sample(&mut rng).abs()));
    }
    log::debug!("Generated big bang with {} particles (seed {})", n, seed);
    Galaxy::new(positions, velocities, masses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_galaxy() {
        let a = random_orbits::<f64>(32, 9, 1000.0, 0.1, 0.01).unwrap();
        let b = random_orbits::<f64>(32, 9, 1000.0, 0.1, 0.01).unwrap();
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
        assert_eq!(a.masses(), b.masses());

        let c = random_orbits::<f64>(32, 10, 1000.0, 0.1, 0.01).unwrap();
        assert_ne!(a.positions(), c.positions());
    }

    #[test]
    fn orbits_are_tangential_with_circular_speed() {
        let (m, g, eps) = (1000.0, 0.1, 0.01);
        let galaxy = random_orbits::<f64>(64, 3, m, g, eps).unwrap();
        for (p, v) in galaxy.positions().iter().zip(galaxy.velocities()) {
            let r = p.norm();
            assert!(r > ORBIT_RADII.0 - 1e-9 && r < ORBIT_RADII.1 + 1e-9);
            assert!(p.dot(v).abs() < 1e-9 * r * v.norm());
            assert!((v.norm() - (g * m / (r + eps)).sqrt()).abs() < 1e-9);
        }
        assert!(galaxy.masses().iter().all(|&m| m > 0.0));
    }

    #[test]
    fn big_bang_expands_from_a_small_shell() {
        let galaxy = big_bang::<f32>(50, 1).unwrap();
        assert_eq!(galaxy.len(), 50);
        for (p, v) in galaxy.positions().iter().zip(galaxy.velocities()) {
            let r = p.norm();
            assert!(r >= 0.999 && r < 5.001, "radius {r}");
            assert_eq!(*v, *p);
        }
    }
}
