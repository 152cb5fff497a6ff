//! Error types for the solver.
//!
//! Nothing inside a step can fail; errors are only raised when a galaxy or a
//! set of settings is constructed from inconsistent input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "particle arrays disagree in length: {positions} positions, {velocities} velocities, {masses} masses"
    )]
    LengthMismatch {
        positions: usize,
        velocities: usize,
        masses: usize,
    },

    #[error("softening length must be positive")]
    NonPositiveSoftening,

    #[error("domain half-width must be positive")]
    NonPositiveHalfWidth,

    #[error("bits per axis must lie in 1..={max}, got {bits}")]
    InvalidBits { bits: u32, max: u32 },

    #[error("opening angle theta must be a non-negative number")]
    InvalidTheta,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid sampling distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),
}

pub type Result<T> = std::result::Result<T, Error>;
