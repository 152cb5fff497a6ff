use clap::{Parser, ValueEnum};
use mnlib::{
    LeapFrogIntegrator, MortonSimulation, Simulation, SimulationSettings, Vec2, initialize,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Particles on circular orbits around a heavy central body.
    Orbits,
    /// An expanding shell with Hubble flow.
    BigBang,
}

#[derive(Parser, Debug)]
#[command(about = "Barnes-Hut gravity on a periodic 2D domain, ordered by a Morton curve")]
struct Args {
    #[arg(long, value_enum, default_value_t = Scenario::Orbits)]
    scenario: Scenario,
    #[arg(short = 'n', long, default_value_t = 100)]
    particles: usize,
    #[arg(long, default_value_t = 1000)]
    steps: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Mass of the central body added to the orbit scenario.
    #[arg(long, default_value_t = 1000.0)]
    central_mass: f64,
    #[arg(long, default_value_t = 0.01)]
    dt: f64,
    #[arg(long, default_value_t = 0.1)]
    g: f64,
    #[arg(long, default_value_t = 0.01)]
    eps: f64,
    /// Half-width of the periodic domain.
    #[arg(long, default_value_t = 100.0)]
    half_width: f64,
    #[arg(long, default_value_t = 8)]
    bits: u32,
    #[arg(long, default_value_t = 0.5)]
    theta: f64,
}

fn init_logger() {
    env_logger::init();
}

fn main() -> mnlib::Result<()> {
    init_logger();
    let args = Args::parse();

    let settings = SimulationSettings {
        dt: args.dt,
        g: args.g,
        eps: args.eps,
        half_width: args.half_width,
        bits: args.bits,
        theta: args.theta,
    };

    let galaxy = match args.scenario {
        Scenario::Orbits => {
            let mut galaxy =
                initialize::random_orbits(args.particles, args.seed, args.central_mass, args.g, args.eps)?;
            // the central body takes over the last generated slot
            galaxy.add(args.central_mass, Vec2::zeros(), Vec2::zeros());
            galaxy
        }
        Scenario::BigBang => initialize::big_bang(args.particles, args.seed)?,
    };
    println!("{}", galaxy);

    let mut sim = MortonSimulation::new(galaxy, LeapFrogIntegrator::new(), settings)?;
    sim.init();

    let start = std::time::Instant::now();
    let mut nodes = 0;
    for _ in 0..args.steps {
        nodes += sim.step().nodes;
    }
    let elapsed = start.elapsed();

    println!("{}", sim.galaxy());
    println!(
        "Elapsed: {:?} for {} steps ({:.1} nodes per step, t = {})",
        elapsed,
        args.steps,
        nodes as f64 / args.steps.max(1) as f64,
        sim.elapsed()
    );
    Ok(())
}
