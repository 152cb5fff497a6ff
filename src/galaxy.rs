use std::fmt;

use crate::{
    error::{Error, Result},
    shared::{Float, Vec2},
};

/// Particle state of one run: parallel position, velocity and mass arrays
/// indexed by a stable particle id. The particle count never changes.
#[derive(Clone, Debug)]
pub struct Galaxy<F: Float> {
    positions: Vec<Vec2<F>>,
    velocities: Vec<Vec2<F>>,
    masses: Vec<F>,
    // permutation from the latest Morton sort, identity until the first step
    morton: Vec<usize>,
    next_slot: usize,
}

impl<F: Float> Galaxy<F> {
    pub fn new(positions: Vec<Vec2<F>>, velocities: Vec<Vec2<F>>, masses: Vec<F>) -> Result<Self> {
        if positions.len() != velocities.len() || positions.len() != masses.len() {
            return Err(Error::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
                masses: masses.len(),
            });
        }
        let n = positions.len();
        log::debug!("Galaxy created with {} particles", n);
        Ok(Self {
            positions,
            velocities,
            masses,
            morton: (0..n).collect(),
            next_slot: n.saturating_sub(1),
        })
    }

    /// `n` massless particles at rest at the origin.
    pub fn zeros(n: usize) -> Self {
        Self {
            positions: vec![Vec2::zeros(); n],
            velocities: vec![Vec2::zeros(); n],
            masses: vec![F::zero(); n],
            morton: (0..n).collect(),
            next_slot: n.saturating_sub(1),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2<F>] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec2<F>] {
        &self.velocities
    }

    pub fn masses(&self) -> &[F] {
        &self.masses
    }

    /// Particle ids in ascending Morton order as of the latest step.
    pub fn morton(&self) -> &[usize] {
        &self.morton
    }

    /// Slot the next call to [`Galaxy::add`] will overwrite.
    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    pub fn kinematics_mut(&mut self) -> (&mut [Vec2<F>], &mut [Vec2<F>]) {
        (&mut self.positions, &mut self.velocities)
    }

    pub(crate) fn set_morton(&mut self, order: Vec<usize>) {
        debug_assert_eq!(order.len(), self.len());
        self.morton = order;
    }

    /// Overwrites the particle in the next free slot and returns its id.
    ///
    /// Slots are handed out from the end of the arrays backwards; after slot 0
    /// the cursor wraps around to `N - 1`, so the arrays behave as a fixed-size
    /// ring. Returns `None` for an empty galaxy.
    pub fn add(&mut self, mass: F, position: Vec2<F>, velocity: Vec2<F>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let slot = self.next_slot;
        self.masses[slot] = mass;
        self.positions[slot] = position;
        self.velocities[slot] = velocity;
        self.next_slot = match slot {
            0 => self.len() - 1,
            _ => slot - 1,
        };
        Some(slot)
    }

    pub fn total_mass(&self) -> F {
        self.masses.iter().fold(F::zero(), |acc, &m| acc + m)
    }
}

fn min_max_mean<F: Float>(values: impl Iterator<Item = F>) -> Option<(F, F, F)> {
    let mut count = 0usize;
    let mut acc: Option<(F, F, F)> = None;
    for v in values {
        count += 1;
        acc = Some(match acc {
            None => (v, v, v),
            Some((lo, hi, sum)) => (lo.min(v), hi.max(v), sum + v),
        });
    }
    acc.map(|(lo, hi, sum)| (lo, hi, sum / nalgebra::convert::<f64, F>(count as f64)))
}

impl<F: Float> fmt::Display for Galaxy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Galaxy(")?;
        writeln!(f, "  particles : {}", self.len())?;
        let masses = min_max_mean(self.masses.iter().copied());
        let xs = min_max_mean(self.positions.iter().map(|p| p.x));
        let ys = min_max_mean(self.positions.iter().map(|p| p.y));
        let speeds = min_max_mean(self.velocities.iter().map(|v| v.norm()));
        if let (Some(m), Some(x), Some(y), Some(s)) = (masses, xs, ys, speeds) {
            writeln!(f, "  mass      : min={:.2}, max={:.2}, mean={:.2}", m.0, m.1, m.2)?;
            writeln!(
                f,
                "  position  : x∈[{:.2}, {:.2}], y∈[{:.2}, {:.2}]",
                x.0, x.1, y.0, y.1
            )?;
            writeln!(f, "  speed     : min={:.2}, max={:.2}, mean={:.2}", s.0, s.1, s.2)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Galaxy<f64> {
        Galaxy::new(
            (0..n).map(|i| Vec2::new(i as f64, 0.0)).collect(),
            vec![Vec2::zeros(); n],
            vec![1.0; n],
        )
        .unwrap()
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = Galaxy::<f64>::new(vec![Vec2::zeros(); 2], vec![Vec2::zeros(); 2], vec![1.0]);
        assert!(matches!(
            err,
            Err(Error::LengthMismatch {
                positions: 2,
                velocities: 2,
                masses: 1
            })
        ));
    }

    #[test]
    fn morton_starts_as_identity() {
        assert_eq!(line(4).morton(), &[0, 1, 2, 3]);
    }

    #[test]
    fn add_fills_slots_backwards_and_wraps() {
        let mut galaxy = line(3);
        let v = Vec2::new(0.0, 1.0);
        assert_eq!(galaxy.add(5.0, Vec2::new(7.0, 7.0), v), Some(2));
        assert_eq!(galaxy.add(6.0, Vec2::new(8.0, 8.0), v), Some(1));
        assert_eq!(galaxy.add(7.0, Vec2::new(9.0, 9.0), v), Some(0));
        assert_eq!(galaxy.next_slot(), 2);
        assert_eq!(galaxy.add(8.0, Vec2::new(1.0, 1.0), v), Some(2));

        assert_eq!(galaxy.masses(), &[7.0, 6.0, 8.0]);
        assert_eq!(galaxy.positions()[2], Vec2::new(1.0, 1.0));
        assert_eq!(galaxy.velocities()[1], v);
        assert_eq!(galaxy.len(), 3);
    }

    #[test]
    fn add_on_empty_galaxy_is_a_no_op() {
        let mut galaxy = Galaxy::<f32>::zeros(0);
        assert_eq!(galaxy.add(1.0, Vec2::zeros(), Vec2::zeros()), None);
        assert!(galaxy.is_empty());
    }

    #[test]
    fn summary_mentions_particle_count_and_ranges() {
        let text = line(3).to_string();
        assert!(text.contains("particles : 3"));
        assert!(text.contains("x∈[0.00, 2.00]"));
        assert!(text.contains("mean=1.00"));
    }

    #[test]
    fn empty_summary_has_no_statistics() {
        let text = Galaxy::<f64>::zeros(0).to_string();
        assert_eq!(text, "Galaxy(\n  particles : 0\n)");
    }
}
