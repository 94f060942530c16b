//! Huffman code construction.
//!
//! Builds prefix codes from observed symbol frequencies; encoding and
//! decoding of actual streams is left to the callers sizing their output.
//! Tree nodes live in an integer-indexed pool as a tagged enum, and code
//! assignment walks the pool with an explicit stack, so arbitrarily skewed
//! codes cannot exhaust the native stack.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use bitvec::prelude::*;

/// A symbol's prefix code.
pub type HuffCode = BitVec;

/// Node of the code tree, indexed by pool position.
#[derive(Debug, Clone, Copy)]
enum HuffNode {
    /// Terminal node carrying a dense symbol index.
    Leaf { symbol: usize },
    /// Combination of two pool entries.
    Inner { left: usize, right: usize },
}

/// Frequency-counting Huffman code builder over hashable symbols.
#[derive(Debug, Clone, Default)]
pub struct HuffmanBuilder<S: Eq + Hash + Clone> {
    symbols: HashMap<S, usize>,
    frequencies: Vec<u64>,
    codes: Vec<HuffCode>,
    num_items: u64,
}

impl<S: Eq + Hash + Clone> HuffmanBuilder<S> {
    /// Create a builder with no observations.
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            frequencies: Vec::new(),
            codes: Vec::new(),
            num_items: 0,
        }
    }

    /// Record one occurrence of `symbol`.
    pub fn add_item(&mut self, symbol: &S) {
        let next_index = self.symbols.len();
        let index = *self
            .symbols
            .entry(symbol.clone())
            .or_insert(next_index);
        if index == self.frequencies.len() {
            self.frequencies.push(0);
        }
        self.frequencies[index] += 1;
        self.num_items += 1;
    }

    /// Record a sequence of occurrences.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = S>) {
        for item in items {
            self.add_item(&item);
        }
    }

    /// Number of distinct symbols observed.
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Total number of occurrences observed.
    pub fn num_items(&self) -> u64 {
        self.num_items
    }

    /// Build the code from the recorded frequencies.
    ///
    /// A single-symbol alphabet gets the empty code, matching its zero-bit
    /// information content.
    pub fn construct(&mut self) {
        self.codes = vec![HuffCode::new(); self.frequencies.len()];
        if self.frequencies.is_empty() {
            return;
        }

        let mut pool: Vec<HuffNode> = Vec::with_capacity(2 * self.frequencies.len());
        let mut queue: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
        for (symbol, &frequency) in self.frequencies.iter().enumerate() {
            debug_assert!(frequency > 0);
            pool.push(HuffNode::Leaf { symbol });
            queue.push(Reverse((frequency, pool.len() - 1)));
        }
        while queue.len() > 1 {
            let Reverse((right_freq, right)) = queue.pop().expect("queue length checked");
            let Reverse((left_freq, left)) = queue.pop().expect("queue length checked");
            pool.push(HuffNode::Inner { left, right });
            queue.push(Reverse((left_freq + right_freq, pool.len() - 1)));
        }

        // Assign codes from the root down; left extends with 0, right with 1.
        let root = pool.len() - 1;
        let mut stack: Vec<(usize, HuffCode)> = vec![(root, HuffCode::new())];
        while let Some((node, prefix)) = stack.pop() {
            match pool[node] {
                HuffNode::Leaf { symbol } => self.codes[symbol] = prefix,
                HuffNode::Inner { left, right } => {
                    let mut left_prefix = prefix.clone();
                    left_prefix.push(false);
                    stack.push((left, left_prefix));
                    let mut right_prefix = prefix;
                    right_prefix.push(true);
                    stack.push((right, right_prefix));
                }
            }
        }
    }

    /// The code assigned to `symbol`. Requires [`construct`] to have run.
    ///
    /// [`construct`]: HuffmanBuilder::construct
    pub fn code(&self, symbol: &S) -> Option<&BitSlice> {
        let &index = self.symbols.get(symbol)?;
        self.codes.get(index).map(|code| code.as_bitslice())
    }

    /// Length in bits of the code assigned to `symbol`.
    pub fn code_len(&self, symbol: &S) -> Option<usize> {
        self.code(symbol).map(|code| code.len())
    }

    /// Bits to encode all recorded occurrences plus the shape of the code
    /// tree (2 bits per combination).
    pub fn bits_needed(&self) -> u64 {
        debug_assert_eq!(self.frequencies.len(), self.codes.len());
        let payload: u64 = self
            .frequencies
            .iter()
            .zip(&self.codes)
            .map(|(&frequency, code)| frequency * code.len() as u64)
            .sum();
        payload + 2 * (self.symbols.len().saturating_sub(1) as u64)
    }

    /// Bits to store the code table entries as fixed-width references.
    pub fn bits_for_table_labels(&self) -> u64 {
        let symbols = self.symbols.len() as u64;
        symbols * u64::from(fixed_code_width(self.symbols.len()))
    }
}

/// Width of a fixed-length code distinguishing `count` values.
pub fn fixed_code_width(count: usize) -> u32 {
    match count {
        0 | 1 => 1,
        _ => usize::BITS - (count - 1).leading_zeros(),
    }
}
