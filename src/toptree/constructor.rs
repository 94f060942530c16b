//! Greedy top-tree construction.
//!
//! The constructor repeatedly contracts the ordered tree, one round at a
//! time, until a single node remains. Every round runs a horizontal merge
//! pass (adjacent sibling pairs), then a vertical merge pass (nodes with a
//! single child), then compacts the edge array. Each merge appends one
//! cluster to the top tree; the cluster of the surviving tree node is
//! updated so that the final remaining node owns the root cluster.

use crate::stats::DebugInfo;
use crate::toptree::{ClusterId, MergeType, TopTree};
use crate::tree::{NodeId, OrderedTree};
use crate::CompressionError;

/// Reduces an ordered tree to a single node, recording merges as clusters.
///
/// The tree is consumed destructively; the top tree must have been created
/// with one leaf per tree node (see [`TopTree::new`]).
#[derive(Debug)]
pub struct TopTreeConstructor<'a> {
    tree: &'a mut OrderedTree,
    top_tree: &'a mut TopTree,
    node_clusters: Vec<ClusterId>,
    verbose: bool,
}

impl<'a> TopTreeConstructor<'a> {
    /// Create a constructor over `tree`, recording clusters into `top_tree`.
    pub fn new(tree: &'a mut OrderedTree, top_tree: &'a mut TopTree) -> Self {
        let node_clusters = (0..tree.num_nodes()).collect();
        Self {
            tree,
            top_tree,
            node_clusters,
            verbose: false,
        }
    }

    /// Enable per-round progress output on stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run rounds until one node remains. Edge ratios are reported into
    /// `debug` per round.
    pub fn construct(&mut self, debug: &mut DebugInfo) -> Result<(), CompressionError> {
        assert_eq!(
            self.top_tree.num_leaves(),
            self.tree.num_nodes(),
            "top tree must hold one leaf per tree node"
        );
        let mut round = 0usize;
        while self.tree.num_edges() > 0 {
            let before = self.tree.num_edges();
            self.horizontal_merges();
            self.vertical_merges();
            self.tree.compact();
            let after = self.tree.num_edges();
            if after >= before {
                return Err(CompressionError::StalledRound { round, edges: after });
            }
            let ratio = before as f64 / after.max(1) as f64;
            debug.add_edge_ratio(ratio);
            if self.verbose {
                eprintln!("round {round}: {before} -> {after} edges (ratio {ratio:.3})");
            }
            round += 1;
        }
        Ok(())
    }

    /// Pair adjacent siblings left to right under every parent with at
    /// least two children. A pair merges only when at least one side is
    /// currently a leaf; with an odd child count the trailing sibling is
    /// left for a later round.
    fn horizontal_merges(&mut self) {
        for parent in 0..self.tree.num_nodes() {
            if self.tree.out_degree(parent) < 2 {
                continue;
            }
            let kids = self.tree.child_slots(parent);
            let mut index = 0;
            while index + 1 < kids.len() {
                let (left_slot, left) = kids[index];
                let (right_slot, right) = kids[index + 1];
                if self.tree.is_leaf(left) || self.tree.is_leaf(right) {
                    let (survivor, merge_type) =
                        self.tree.merge_siblings(parent, left_slot, right_slot);
                    self.record(left, right, survivor, merge_type);
                }
                index += 2;
            }
        }
    }

    /// Single ascending sweep of vertical merges. Nodes whose degree
    /// dropped to one during this round's horizontal pass are eligible;
    /// nodes already consumed by this sweep are not.
    fn vertical_merges(&mut self) {
        let num_nodes = self.tree.num_nodes();
        let mut consumed = vec![false; num_nodes];
        for node in 0..num_nodes {
            if consumed[node] {
                continue;
            }
            let Some(child) = self.tree.single_child(node) else {
                continue;
            };
            if consumed[child] {
                continue;
            }
            let (child, merge_type) = self.tree.merge_chain(node);
            consumed[node] = true;
            consumed[child] = true;
            self.record(node, child, node, merge_type);
        }
    }

    /// Append the cluster for a performed merge and re-point the surviving
    /// tree node at it.
    fn record(&mut self, left: NodeId, right: NodeId, survivor: NodeId, merge_type: MergeType) {
        let cluster = self.top_tree.add_cluster(
            self.node_clusters[left],
            self.node_clusters[right],
            merge_type,
        );
        self.node_clusters[survivor] = cluster;
    }
}
