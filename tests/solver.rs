use approx::assert_relative_eq;
use mnlib::{
    Bounds, Galaxy, LeapFrogIntegrator, MortonSimulation, Simulation, SimulationSettings, Vec2,
    initialize,
    solver::{ForceEvaluator, MortonOrder, Tree, aggregate, direct_sum, morton_code, quantize},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Uniform particles in `[-extent, extent)²` with masses in `[1, 3)`.
fn random_particles(n: usize, extent: f64, seed: u64) -> (Vec<Vec2<f64>>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = (0..n)
        .map(|_| {
            Vec2::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            )
        })
        .collect();
    let masses = (0..n).map(|_| rng.random_range(1.0..3.0)).collect();
    (positions, masses)
}

fn tree_accelerations(
    positions: &[Vec2<f64>],
    masses: &[f64],
    settings: &SimulationSettings<f64>,
) -> Vec<Vec2<f64>> {
    let sorted = MortonOrder::sort(positions, &settings.bounds(), settings.bits);
    let mut tree = Tree::build(&sorted.sorted_codes, settings.bits);
    aggregate(&mut tree, &sorted.order, positions, masses);
    ForceEvaluator::new(&tree, &sorted.order, positions, masses, settings).accelerations()
}

/// Summed error magnitude relative to the summed exact magnitude.
fn relative_error(approx: &[Vec2<f64>], exact: &[Vec2<f64>]) -> f64 {
    let err: f64 = approx.iter().zip(exact).map(|(a, e)| (a - e).norm()).sum();
    let total: f64 = exact.iter().map(|e| e.norm()).sum();
    err / total
}

fn two_body(g: f64) -> Galaxy<f64> {
    Galaxy::new(
        vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)],
        vec![Vec2::zeros(), Vec2::new(0.0, (g * 1000.0 / 10.0_f64).sqrt())],
        vec![1000.0, 1.0],
    )
    .unwrap()
}

fn two_body_settings(dt: f64) -> SimulationSettings<f64> {
    SimulationSettings {
        dt,
        g: 0.1,
        eps: 0.01,
        half_width: 50.0,
        bits: 4,
        theta: 0.5,
    }
}

#[test]
fn particles_appear_in_morton_order() {
    let (positions, _) = random_particles(300, 60.0, 1);
    let bounds = Bounds::new(50.0);
    let sorted = MortonOrder::sort(&positions, &bounds, 5);

    for (rank, &id) in sorted.order.iter().enumerate() {
        let p = positions[id];
        let code = morton_code(quantize(p.x, &bounds, 5), quantize(p.y, &bounds, 5));
        assert_eq!(sorted.codes[id], code);
        assert_eq!(sorted.sorted_codes[rank], code);
    }
    for pair in sorted.order.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(sorted.codes[a] < sorted.codes[b] || (sorted.codes[a] == sorted.codes[b] && a < b));
    }

    let again = MortonOrder::sort(&positions, &bounds, 5);
    assert_eq!(sorted.order, again.order);
}

#[test]
fn finest_nodes_partition_the_sorted_order() {
    for (n, bits, seed) in [(1, 3, 2), (17, 2, 3), (250, 6, 4), (400, 16, 5)] {
        let (positions, _) = random_particles(n, 50.0, seed);
        let sorted = MortonOrder::sort(&positions, &Bounds::new(50.0), bits);
        let tree = Tree::<f64>::build(&sorted.sorted_codes, bits);

        let mut covered = vec![0u32; n];
        for range in tree.finest() {
            for slot in range {
                covered[slot] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "n = {n}, bits = {bits}");
        assert!(tree.nodes().iter().all(|node| node.level <= bits));
    }
}

#[test]
fn root_mass_equals_total_mass() {
    let (positions, masses) = random_particles(123, 45.0, 6);
    let sorted = MortonOrder::sort(&positions, &Bounds::new(50.0), 7);
    let mut tree = Tree::build(&sorted.sorted_codes, 7);
    aggregate(&mut tree, &sorted.order, &positions, &masses);

    let total: f64 = masses.iter().sum();
    assert_relative_eq!(tree.root().unwrap().mass, total, max_relative = 1e-12);
}

#[test]
fn zero_theta_reproduces_direct_summation() {
    let (positions, masses) = random_particles(80, 40.0, 7);
    let settings = SimulationSettings {
        g: 1.0,
        eps: 0.05,
        half_width: 50.0,
        bits: 8,
        theta: 0.0,
        ..Default::default()
    };
    let approx = tree_accelerations(&positions, &masses, &settings);
    let exact = direct_sum(&positions, &masses, 1.0, 0.05);
    assert!(relative_error(&approx, &exact) < 1e-10);
}

#[test]
fn larger_theta_never_improves_accuracy() {
    for seed in [7, 11, 42] {
        let (positions, masses) = random_particles(60, 40.0, seed);
        let exact = direct_sum(&positions, &masses, 1.0, 0.05);

        let errors: Vec<f64> = [0.0, 0.1, 0.5, 1e6]
            .into_iter()
            .map(|theta| {
                let settings = SimulationSettings {
                    g: 1.0,
                    eps: 0.05,
                    half_width: 50.0,
                    bits: 8,
                    theta,
                    ..Default::default()
                };
                relative_error(&tree_accelerations(&positions, &masses, &settings), &exact)
            })
            .collect();

        assert!(
            errors.windows(2).all(|w| w[0] <= w[1]),
            "seed {seed}: errors {errors:?}"
        );
        assert!(errors[3] > errors[0]);
    }
}

#[test]
fn empty_galaxy_is_a_valid_no_op() {
    let mut sim = MortonSimulation::new(
        Galaxy::<f32>::zeros(0),
        LeapFrogIntegrator::new(),
        SimulationSettings::default(),
    )
    .unwrap();
    for _ in 0..3 {
        sim.step();
    }
    assert!(sim.galaxy().positions().is_empty());
    assert!(sim.accelerations().is_empty());
}

#[test]
fn two_body_radius_after_one_step() {
    let mut sim =
        MortonSimulation::new(two_body(0.1), LeapFrogIntegrator::new(), two_body_settings(0.01))
            .unwrap();
    sim.step();
    let r = sim.galaxy().positions()[1].norm();
    assert_relative_eq!(r, 10.0, max_relative = 0.01);
}

#[test]
fn circular_orbit_radius_stays_bounded() {
    let mut sim =
        MortonSimulation::new(two_body(0.1), LeapFrogIntegrator::new(), two_body_settings(0.002))
            .unwrap();
    // roughly one orbital period
    for _ in 0..10_000 {
        sim.step();
        let p = sim.galaxy().positions();
        let r = (p[1] - p[0]).norm();
        assert!((r - 10.0).abs() < 0.1, "radius drifted to {r} at t = {}", sim.elapsed());
    }
}

#[test]
fn particles_stay_inside_the_periodic_domain() {
    let galaxy = initialize::big_bang::<f64>(64, 3).unwrap();
    let settings = SimulationSettings {
        dt: 0.05,
        half_width: 4.0,
        bits: 4,
        ..Default::default()
    };
    let bounds = settings.bounds();
    let initial_mass = galaxy.total_mass();
    let mut sim = MortonSimulation::new(galaxy, LeapFrogIntegrator::new(), settings).unwrap();

    for _ in 0..200 {
        let stats = sim.step();
        assert_eq!(stats.particles, 64);
        assert_relative_eq!(stats.total_mass, initial_mass, max_relative = 1e-12);
        assert!(sim.galaxy().positions().iter().all(|p| bounds.contains(p)));
    }
    assert_eq!(sim.galaxy().total_mass(), initial_mass);
}

#[test]
fn identical_inputs_give_identical_trajectories() {
    let run = || {
        let galaxy = initialize::random_orbits::<f64>(50, 5, 1000.0, 0.1, 0.01).unwrap();
        let mut sim =
            MortonSimulation::new(galaxy, LeapFrogIntegrator::new(), SimulationSettings::default())
                .unwrap();
        for _ in 0..20 {
            sim.step();
        }
        sim.into_galaxy()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.velocities(), b.velocities());
    assert_eq!(a.morton(), b.morton());
}
