use std::ops::Range;

use crate::shared::{Float, MAX_BITS, Vec2};

/// One implicit tree node: a contiguous slice `[start, end)` of the Morton
/// sorted order plus its aggregate mass and centre of mass.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<F: Float> {
    pub start: usize,
    pub end: usize,
    /// Number of Morton bit pairs resolved above this node (0 for the root).
    pub level: u32,
    /// Arena index of the first node past this node's subtree.
    pub skip: usize,
    pub mass: F,
    pub center_of_mass: Vec2<F>,
}

impl<F: Float> Node<F> {
    fn new(start: usize, end: usize, level: u32) -> Self {
        Self {
            start,
            end,
            level,
            skip: 0,
            mass: F::zero(),
            center_of_mass: Vec2::zeros(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Holds a single particle.
    pub fn is_leaf(&self) -> bool {
        self.len() == 1
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Mask selecting the bit pair examined at `level` of a `bits`-per-axis code.
pub fn level_mask(level: u32, bits: u32) -> u32 {
    0b11 << (2 * (bits - 1 - level))
}

/// Flat pre-order arena of index ranges over the Morton sorted order.
///
/// There are no child pointers: the children of a node are the nodes that
/// follow it in the arena up to its `skip` index, reached by hopping from one
/// sibling's `skip` to the next.
#[derive(Clone, Debug)]
pub struct Tree<F: Float> {
    nodes: Vec<Node<F>>,
    bits: u32,
}

impl<F: Float> Tree<F> {
    /// Splits `[0, N)` level by level wherever the bit pair of adjacent sorted
    /// codes changes. A range that does not change at a level is carried down
    /// unchanged; ranges of one particle are never split.
    ///
    /// `bits` must lie in `1..=MAX_BITS`.
    pub fn build(sorted_codes: &[u32], bits: u32) -> Self {
        debug_assert!((1..=MAX_BITS).contains(&bits), "{bits} bits per axis");
        let n = sorted_codes.len();
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * n),
            bits,
        };
        if n > 0 {
            let mut cuts = Vec::new();
            tree.split(sorted_codes, 0, n, 0, &mut cuts);
        }
        log::trace!("Built {} nodes over {} particles", tree.nodes.len(), n);
        tree
    }

    fn split(&mut self, codes: &[u32], start: usize, end: usize, level: u32, cuts: &mut Vec<usize>) {
        let index = self.nodes.len();
        self.nodes.push(Node::new(start, end, level));

        if end - start > 1 {
            for level in level..self.bits {
                let mask = level_mask(level, self.bits);
                cuts.clear();
                cuts.extend((start + 1..end).filter(|&i| codes[i] & mask != codes[i - 1] & mask));
                if cuts.is_empty() {
                    continue;
                }
                cuts.push(end);
                let bounds = std::mem::take(cuts);
                let mut lo = start;
                for &hi in &bounds {
                    self.split(codes, lo, hi, level + 1, cuts);
                    lo = hi;
                }
                break;
            }
        }

        self.nodes[index].skip = self.nodes.len();
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node<F>] {
        &mut self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Node<F>> {
        self.nodes.first()
    }

    /// True when the node at `index` has no finer sub-ranges.
    pub fn is_terminal(&self, index: usize) -> bool {
        self.nodes[index].skip == index + 1
    }

    /// Arena indices of the direct sub-ranges of the node at `index`.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let end = self.nodes[index].skip;
        let first = (index + 1 < end).then_some(index + 1);
        std::iter::successors(first, move |&child| {
            let sibling = self.nodes[child].skip;
            (sibling < end).then_some(sibling)
        })
    }

    /// The finest level: terminal ranges in ascending order, partitioning `[0, N)`.
    pub fn finest(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.nodes.len())
            .filter(|&i| self.is_terminal(i))
            .map(|i| self.nodes[i].range())
    }
}
