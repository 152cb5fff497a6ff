// This file defines the numeric types, settings and traits shared by every stage of the solver.

use std::marker::PhantomData;

use nalgebra::{RealField, SVector, convert};
use num_traits::NumCast;

use crate::{
    error::{Error, Result},
    galaxy::Galaxy,
    solver::StepStats,
};

/// Scalar type the solver is generic over (`f32` or `f64`).
pub trait Float: RealField + NumCast + Copy {}

impl<T: RealField + NumCast + Copy> Float for T {}

pub type Vec2<F> = SVector<F, 2>;

/// Largest supported number of bits per axis; two axes fill a `u32` Morton code.
pub const MAX_BITS: u32 = 16;

/// Square periodic domain `[-L, L)²`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<F: Float> {
    pub half_width: F,
}

impl<F: Float> Bounds<F> {
    pub fn new(half_width: F) -> Self {
        Self { half_width }
    }

    pub fn width(&self) -> F {
        self.half_width + self.half_width
    }

    pub fn contains(&self, point: &Vec2<F>) -> bool {
        point
            .iter()
            .all(|&x| x >= -self.half_width && x < self.half_width)
    }

    /// Maps one coordinate into `[-L, L)` with a floored modulo. Coordinates
    /// already inside the domain are returned untouched.
    pub fn wrap_coordinate(&self, x: F) -> F {
        let l = self.half_width;
        if x >= -l && x < l {
            return x;
        }
        let width = self.width();
        let mut shifted = (x + l) % width;
        if shifted < F::zero() {
            shifted += width;
        }
        if shifted >= width {
            shifted -= width;
        }
        let wrapped = shifted - l;
        // rounding in `shifted - l` can land exactly on the open upper edge
        if wrapped >= l { -l } else { wrapped }
    }

    pub fn wrap(&self, point: &Vec2<F>) -> Vec2<F> {
        point.map(|x| self.wrap_coordinate(x))
    }
}

/// Named parameters of a run. Passed explicitly to the simulation, never global.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSettings<F: Float> {
    /// Integration step size.
    pub dt: F,
    /// Gravitational constant.
    pub g: F,
    /// Softening length added to every separation.
    pub eps: F,
    /// Half-width `L` of the periodic domain, also used for grid quantization.
    pub half_width: F,
    /// Bits per axis of the Morton grid, `GRID = 2^bits`.
    pub bits: u32,
    /// Multipole acceptance threshold.
    pub theta: F,
}

impl<F: Float> Default for SimulationSettings<F> {
    fn default() -> Self {
        Self {
            dt: convert::<f64, F>(0.01),
            g: convert::<f64, F>(1.0),
            eps: convert::<f64, F>(0.01),
            half_width: convert::<f64, F>(100.0),
            bits: 8,
            theta: convert::<f64, F>(0.5),
        }
    }
}

impl<F: Float> SimulationSettings<F> {
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() {
            return Err(Error::InvalidParameter(format!("dt must be finite, got {}", self.dt)));
        }
        if !self.g.is_finite() {
            return Err(Error::InvalidParameter(format!("g must be finite, got {}", self.g)));
        }
        if !(self.eps > F::zero()) || !self.eps.is_finite() {
            return Err(Error::NonPositiveSoftening);
        }
        if !(self.half_width > F::zero()) || !self.half_width.is_finite() {
            return Err(Error::NonPositiveHalfWidth);
        }
        if self.bits == 0 || self.bits > MAX_BITS {
            return Err(Error::InvalidBits {
                bits: self.bits,
                max: MAX_BITS,
            });
        }
        if !(self.theta >= F::zero()) {
            return Err(Error::InvalidTheta);
        }
        log::debug!(
            "Settings: dt {}, g {}, eps {}, L {}, {} bits, theta {}",
            self.dt,
            self.g,
            self.eps,
            self.half_width,
            self.bits,
            self.theta
        );
        Ok(())
    }

    pub fn bounds(&self) -> Bounds<F> {
        Bounds::new(self.half_width)
    }

    /// Cells per axis.
    pub fn grid(&self) -> u32 {
        1 << self.bits
    }
}

pub trait Integrator<F: Float> {
    fn init(&mut self);
    /// Advances every particle by `dt` using `accelerations` (indexed by
    /// particle id) and wraps the result into `bounds`.
    fn integrate(
        &mut self,
        galaxy: &mut Galaxy<F>,
        accelerations: &[Vec2<F>],
        dt: F,
        bounds: &Bounds<F>,
    );
}

/// Kick-drift-kick leapfrog. Both half kicks reuse the acceleration computed
/// before the drift.
#[derive(Clone, Debug)]
pub struct LeapFrogIntegrator<F: Float> {
    steps: usize,
    _float: PhantomData<F>,
}

impl<F: Float> LeapFrogIntegrator<F> {
    pub fn new() -> Self {
        Self {
            steps: 0,
            _float: PhantomData,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl<F: Float> Default for LeapFrogIntegrator<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Integrator<F> for LeapFrogIntegrator<F> {
    fn init(&mut self) {
        self.steps = 0;
    }

    fn integrate(
        &mut self,
        galaxy: &mut Galaxy<F>,
        accelerations: &[Vec2<F>],
        dt: F,
        bounds: &Bounds<F>,
    ) {
        let half_dt = dt * convert::<f64, F>(0.5);
        let (positions, velocities) = galaxy.kinematics_mut();
        for ((position, velocity), acceleration) in positions
            .iter_mut()
            .zip(velocities.iter_mut())
            .zip(accelerations)
        {
            *velocity += acceleration * half_dt;
            *position += *velocity * dt;
            *velocity += acceleration * half_dt;
            *position = bounds.wrap(position);
        }
        self.steps += 1;
    }
}

pub trait Simulation<F: Float> {
    fn init(&mut self);
    fn settings(&self) -> &SimulationSettings<F>;
    fn set_settings(&mut self, settings: SimulationSettings<F>) -> Result<()>;
    fn dt_mut(&mut self) -> &mut F;
    fn theta_mut(&mut self) -> &mut F;
    fn elapsed(&self) -> F;
    fn update_forces(&mut self) -> StepStats<F>;
    fn step_by(&mut self, dt: F) -> StepStats<F>;
    fn galaxy(&self) -> &Galaxy<F>;

    fn dt(&self) -> F {
        self.settings().dt
    }

    fn step(&mut self) -> StepStats<F> {
        let dt = self.dt();
        self.step_by(dt)
    }
}
