pub mod error;
pub mod galaxy;
pub mod initialize;
pub mod shared;
pub mod solver;

pub use error::{Error, Result};
pub use galaxy::Galaxy;
pub use shared::{Bounds, Float, Integrator, LeapFrogIntegrator, Simulation, SimulationSettings, Vec2};
pub use solver::{MortonSimulation, StepStats};
