use nalgebra::convert;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    shared::{Float, SimulationSettings, Vec2},
    solver::tree::Tree,
};

/// Softened point-mass kernel: `g * mass * d / (|d| + eps)^3` with `d = source - position`.
#[inline]
pub fn point_mass_acceleration<F: Float>(
    position: &Vec2<F>,
    source: &Vec2<F>,
    mass: F,
    g: F,
    eps: F,
) -> Vec2<F> {
    let d = source - position;
    let dist = d.norm() + eps;
    d * (g * mass / (dist * dist * dist))
}

/// Exact O(N²) sum with the same kernel, including the (zero) self term.
pub fn direct_sum<F: Float>(positions: &[Vec2<F>], masses: &[F], g: F, eps: F) -> Vec<Vec2<F>> {
    positions
        .iter()
        .map(|p| {
            positions
                .iter()
                .zip(masses)
                .filter(|&(_, &m)| m > F::zero())
                .fold(Vec2::zeros(), |acc, (q, &m)| {
                    acc + point_mass_acceleration(p, q, m, g, eps)
                })
        })
        .collect()
}

/// Barnes–Hut evaluation over an aggregated [`Tree`].
///
/// The node "size" is `2L * len / N`, a stand-in proportional to the share of
/// particles in the node rather than its geometric extent. The self term is
/// not removed: a coarse node containing the particle itself may be accepted
/// and then pulls toward its own centre of mass. Both are approximations of
/// the method, kept as is.
pub struct ForceEvaluator<'a, F: Float> {
    tree: &'a Tree<F>,
    order: &'a [usize],
    positions: &'a [Vec2<F>],
    masses: &'a [F],
    g: F,
    eps: F,
    theta: F,
    box_width: F,
    count: F,
}

impl<'a, F: Float> ForceEvaluator<'a, F> {
    pub fn new(
        tree: &'a Tree<F>,
        order: &'a [usize],
        positions: &'a [Vec2<F>],
        masses: &'a [F],
        settings: &SimulationSettings<F>,
    ) -> Self {
        Self {
            tree,
            order,
            positions,
            masses,
            g: settings.g,
            eps: settings.eps,
            theta: settings.theta,
            box_width: settings.bounds().width(),
            count: convert::<f64, F>(positions.len() as f64),
        }
    }

    /// Acceleration felt at `position`.
    ///
    /// Scans the pre-order arena from the root. An accepted node (a single
    /// particle, or `size / dist < theta`) contributes its aggregate and its
    /// subtree is skipped; a rejected node is refined by scanning on into its
    /// subtree, and a rejected node with no sub-ranges is summed member by
    /// member. A node whose mass is not positive is never accepted, so the
    /// positive members below it are still reached.
    pub fn acceleration(&self, position: &Vec2<F>) -> Vec2<F> {
        let nodes = self.tree.nodes();
        let mut acceleration = Vec2::zeros();
        let mut k = 0;
        while k < nodes.len() {
            let node = &nodes[k];
            let d = node.center_of_mass - position;
            let dist = d.norm() + self.eps;
            let size = self.box_width * convert::<f64, F>(node.len() as f64) / self.count;

            if node.mass > F::zero() && (node.is_leaf() || size < self.theta * dist) {
                acceleration += d * (self.g * node.mass / (dist * dist * dist));
                k = node.skip;
            } else if self.tree.is_terminal(k) {
                for &j in &self.order[node.range()] {
                    if self.masses[j] > F::zero() {
                        acceleration += point_mass_acceleration(
                            position,
                            &self.positions[j],
                            self.masses[j],
                            self.g,
                            self.eps,
                        );
                    }
                }
                k = node.skip;
            } else {
                k += 1;
            }
        }
        acceleration
    }

    /// Accelerations of every particle, indexed by particle id. Particles are
    /// visited in Morton order.
    #[cfg(not(feature = "parallel"))]
    pub fn accelerations(&self) -> Vec<Vec2<F>> {
        let mut accelerations = vec![Vec2::zeros(); self.positions.len()];
        for &i in self.order {
            accelerations[i] = self.acceleration(&self.positions[i]);
        }
        accelerations
    }

    /// Accelerations of every particle, indexed by particle id. Particles are
    /// spread over the rayon pool in Morton order chunks.
    #[cfg(feature = "parallel")]
    pub fn accelerations(&self) -> Vec<Vec2<F>> {
        let computed: Vec<(usize, Vec2<F>)> = self
            .order
            .par_iter()
            .map(|&i| (i, self.acceleration(&self.positions[i])))
            .collect();
        let mut accelerations = vec![Vec2::zeros(); self.positions.len()];
        for (i, a) in computed {
            accelerations[i] = a;
        }
        accelerations
    }
}
