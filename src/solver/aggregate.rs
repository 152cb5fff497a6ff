use crate::{
    shared::{Float, Vec2},
    solver::tree::Tree,
};

/// Fills in the mass and centre of mass of every node from its member slice.
///
/// Nodes whose total mass is zero or negative get a zero centre of mass so no
/// NaN can reach the force evaluation.
pub fn aggregate<F: Float>(tree: &mut Tree<F>, order: &[usize], positions: &[Vec2<F>], masses: &[F]) {
    for node in tree.nodes_mut() {
        let (mass, weighted) = order[node.range()].iter().fold(
            (F::zero(), Vec2::<F>::zeros()),
            |(mass, weighted), &k| (mass + masses[k], weighted + positions[k] * masses[k]),
        );
        node.mass = mass;
        node.center_of_mass = if mass > F::zero() {
            weighted / mass
        } else {
            Vec2::zeros()
        };
    }
}
