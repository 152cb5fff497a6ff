mod aggregate;
mod force;
mod sort;
mod tree;

pub use aggregate::aggregate;
pub use force::{ForceEvaluator, direct_sum, point_mass_acceleration};
pub use sort::{MortonOrder, morton_code, quantize};
pub use tree::{Node, Tree, level_mask};

use crate::{
    error::Result,
    galaxy::Galaxy,
    shared::{Float, Integrator, LeapFrogIntegrator, Simulation, SimulationSettings, Vec2},
};

/// Summary of one force evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats<F: Float> {
    pub particles: usize,
    /// Nodes in the flat arena, all levels included.
    pub nodes: usize,
    /// Nodes with no finer sub-ranges, see [`Tree::finest`].
    pub terminal_nodes: usize,
    /// Mass of the root node.
    pub total_mass: F,
}

/// Barnes–Hut solver over an implicit Morton-order tree that is rebuilt from
/// scratch on every step.
#[derive(Clone, Debug)]
pub struct MortonSimulation<F: Float, I = LeapFrogIntegrator<F>>
where
    I: Integrator<F>,
{
    galaxy: Galaxy<F>,
    integrator: I,
    settings: SimulationSettings<F>,
    accelerations: Vec<Vec2<F>>,
    elapsed: F,
}

impl<F: Float, I: Integrator<F>> MortonSimulation<F, I> {
    pub fn new(galaxy: Galaxy<F>, integrator: I, settings: SimulationSettings<F>) -> Result<Self> {
        settings.validate()?;
        log::debug!(
            "Morton simulation over {} particles, {} bits per axis, theta {}",
            galaxy.len(),
            settings.bits,
            settings.theta
        );
        let n = galaxy.len();
        Ok(Self {
            galaxy,
            integrator,
            settings,
            accelerations: vec![Vec2::zeros(); n],
            elapsed: F::zero(),
        })
    }

    /// Accelerations from the latest force evaluation, indexed by particle id.
    pub fn accelerations(&self) -> &[Vec2<F>] {
        &self.accelerations
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    /// Seeds a particle into the galaxy's next free slot, see [`Galaxy::add`].
    pub fn add_particle(&mut self, mass: F, position: Vec2<F>, velocity: Vec2<F>) -> Option<usize> {
        self.galaxy.add(mass, position, velocity)
    }

    pub fn into_galaxy(self) -> Galaxy<F> {
        self.galaxy
    }
}

impl<F: Float, I: Integrator<F>> Simulation<F> for MortonSimulation<F, I> {
    fn init(&mut self) {
        self.integrator.init();
        self.elapsed = F::zero();
    }

    fn settings(&self) -> &SimulationSettings<F> {
        &self.settings
    }

    fn set_settings(&mut self, settings: SimulationSettings<F>) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    fn dt_mut(&mut self) -> &mut F {
        &mut self.settings.dt
    }

    fn theta_mut(&mut self) -> &mut F {
        &mut self.settings.theta
    }

    fn elapsed(&self) -> F {
        self.elapsed
    }

    fn update_forces(&mut self) -> StepStats<F> {
        let bits = self.settings.bits;
        let positions = self.galaxy.positions();
        let masses = self.galaxy.masses();

        let sorted = MortonOrder::sort(positions, &self.settings.bounds(), bits);
        let mut tree = Tree::build(&sorted.sorted_codes, bits);
        aggregate(&mut tree, &sorted.order, positions, masses);

        self.accelerations =
            ForceEvaluator::new(&tree, &sorted.order, positions, masses, &self.settings)
                .accelerations();

        let stats = StepStats {
            particles: positions.len(),
            nodes: tree.len(),
            terminal_nodes: tree.finest().count(),
            total_mass: tree.root().map_or(F::zero(), |root| root.mass),
        };
        self.galaxy.set_morton(sorted.order);
        stats
    }

    fn step_by(&mut self, dt: F) -> StepStats<F> {
        let stats = self.update_forces();
        let bounds = self.settings.bounds();
        self.integrator
            .integrate(&mut self.galaxy, &self.accelerations, dt, &bounds);
        self.elapsed += dt;
        log::trace!(
            "Step to t = {}: {} particles, {} nodes ({} terminal), mass {}",
            self.elapsed,
            stats.particles,
            stats.nodes,
            stats.terminal_nodes,
            stats.total_mass
        );
        stats
    }

    fn galaxy(&self) -> &Galaxy<F> {
        &self.galaxy
    }
}
