//! Seeded random tree and label generation for experiments.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::labels::{LabelId, Labels};
use crate::tree::OrderedTree;

/// Generator of uniformly random ordered trees.
///
/// A tree with `n` edges is drawn by shuffling `n` opening and `n` closing
/// parentheses, rotating the word to the unique balanced rotation (cycle
/// lemma), and reading it as the child forest of a fresh root. Fixing the
/// RNG seed fixes the tree.
#[derive(Debug)]
pub struct RandomTreeGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomTreeGenerator<R> {
    /// Create a generator drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a random ordered tree with `num_edges` edges (and one more
    /// node).
    pub fn generate_tree(&mut self, num_edges: usize) -> OrderedTree {
        let mut tree = OrderedTree::with_capacity(num_edges + 1);
        let root = tree.add_node();
        if num_edges == 0 {
            return tree;
        }

        let word = self.balanced_word(num_edges);
        let mut stack = vec![root];
        for open in word {
            if open {
                let node = tree.add_node();
                let parent = *stack.last().expect("root stays on the stack");
                tree.add_edge(parent, node);
                stack.push(node);
            } else {
                stack.pop();
            }
        }
        tree
    }

    /// Uniform label assignment over a fresh `l0 .. l{count-1}` alphabet.
    pub fn random_labels(
        &mut self,
        num_nodes: usize,
        alphabet_size: usize,
        labels: &mut Labels,
    ) -> Vec<LabelId> {
        assert!(alphabet_size > 0, "label alphabet cannot be empty");
        let alphabet: Vec<LabelId> = (0..alphabet_size)
            .map(|index| labels.intern(&format!("l{index}")))
            .collect();
        (0..num_nodes)
            .map(|_| alphabet[self.rng.gen_range(0..alphabet_size)])
            .collect()
    }

    /// A uniformly random balanced parenthesis word with `pairs` pairs.
    fn balanced_word(&mut self, pairs: usize) -> Vec<bool> {
        let mut word: Vec<bool> = Vec::with_capacity(2 * pairs);
        word.extend(std::iter::repeat(true).take(pairs));
        word.extend(std::iter::repeat(false).take(pairs));
        word.shuffle(&mut self.rng);

        // Cycle lemma: rotating past the minimum prefix sum balances the
        // word.
        let mut sum = 0isize;
        let mut min_sum = 0isize;
        let mut rotation = 0usize;
        for (index, &open) in word.iter().enumerate() {
            sum += if open { 1 } else { -1 };
            if sum < min_sum {
                min_sum = sum;
                rotation = index + 1;
            }
        }
        let len = word.len();
        word.rotate_left(rotation % len);
        debug_assert!(is_balanced(&word));
        word
    }
}

fn is_balanced(word: &[bool]) -> bool {
    let mut depth = 0isize;
    for &open in word {
        depth += if open { 1 } else { -1 };
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}
