use morton_encoding::morton_encode;
use nalgebra::convert;

use crate::shared::{Bounds, Float, MAX_BITS, Vec2};

/// Grid cell index of one coordinate on a `2^bits` grid spanning `[-L, L]`.
///
/// Coordinates outside the domain (and NaN) are clamped into the grid rather
/// than rejected. `bits` must lie in `1..=MAX_BITS`; settings are validated
/// against the same range.
pub fn quantize<F: Float>(x: F, bounds: &Bounds<F>, bits: u32) -> u16 {
    debug_assert!((1..=MAX_BITS).contains(&bits), "{bits} bits per axis");
    let top = convert::<f64, F>(((1u32 << bits) - 1) as f64);
    let cell = ((x + bounds.half_width) / bounds.width() * top).floor();
    let clamped = cell.max(F::zero()).min(top);
    num_traits::cast::<F, u16>(clamped).unwrap_or(0)
}

/// Interleaves the cell coordinates: x fills the even bits, y the odd bits.
pub fn morton_code(ix: u16, iy: u16) -> u32 {
    // the first coordinate supplies the more significant bit of every pair
    morton_encode([iy, ix])
}

/// Morton codes and the permutation that sorts particles by them.
#[derive(Clone, Debug, Default)]
pub struct MortonOrder {
    /// Code of every particle, indexed by particle id.
    pub codes: Vec<u32>,
    /// Particle ids in ascending code order; equal codes keep id order.
    pub order: Vec<usize>,
    /// `codes` permuted by `order`.
    pub sorted_codes: Vec<u32>,
}

impl MortonOrder {
    /// Sorts particle ids by the Morton code of their `bits`-per-axis cell.
    pub fn sort<F: Float>(positions: &[Vec2<F>], bounds: &Bounds<F>, bits: u32) -> Self {
        debug_assert!((1..=MAX_BITS).contains(&bits), "{bits} bits per axis");
        let codes: Vec<u32> = positions
            .iter()
            .map(|p| morton_code(quantize(p.x, bounds, bits), quantize(p.y, bounds, bits)))
            .collect();

        let mut order: Vec<usize> = (0..positions.len()).collect();
        order.sort_by_key(|&i| codes[i]);

        let sorted_codes = order.iter().map(|&i| codes[i]).collect();
        Self {
            codes,
            order,
            sorted_codes,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
