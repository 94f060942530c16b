//! RePair-aware top-tree construction.
//!
//! The greedy constructor merges every eligible sibling pair it encounters.
//! This variant instead groups a round's candidate pairs by the subtree
//! fingerprints of their two sides (the digram, in RePair terms) and merges
//! the most frequent digrams first, stopping once the round is predicted to
//! reach the caller-supplied minimum edge ratio. Identical digrams produce
//! identical clusters, which the DAG builder later shares; favoring them
//! buys extra sharing at no cost in rounds. When the threshold cannot be
//! reached the round degrades to merging every candidate, i.e. the greedy
//! behavior.

use std::collections::HashMap;

use crate::stats::DebugInfo;
use crate::toptree::{ClusterId, MergeType, TopTree};
use crate::tree::{NodeId, OrderedTree};
use crate::CompressionError;

/// Top-tree constructor that prefers frequent sibling digrams.
#[derive(Debug)]
pub struct RePairConstructor<'a> {
    tree: &'a mut OrderedTree,
    top_tree: &'a mut TopTree,
    node_clusters: Vec<ClusterId>,
    /// Subtree fingerprint per cluster, grown alongside the pool.
    fingerprints: Vec<u64>,
    min_ratio: f64,
    verbose: bool,
}

/// A mergeable sibling pair collected during the horizontal pass.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    parent: NodeId,
    left_slot: usize,
    right_slot: usize,
    left: NodeId,
    right: NodeId,
    digram: (u64, u64),
}

impl<'a> RePairConstructor<'a> {
    /// Create a constructor over `tree` with the given minimum edge ratio.
    pub fn new(tree: &'a mut OrderedTree, top_tree: &'a mut TopTree, min_ratio: f64) -> Self {
        let node_clusters: Vec<ClusterId> = (0..tree.num_nodes()).collect();
        let fingerprints = top_tree
            .clusters
            .iter()
            .map(|cluster| {
                let mut seed = 0u64;
                hash_combine(&mut seed, u64::from(cluster.label.unwrap_or(0)));
                seed
            })
            .collect();
        Self {
            tree,
            top_tree,
            node_clusters,
            fingerprints,
            min_ratio,
            verbose: false,
        }
    }

    /// Enable per-round progress output on stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run rounds until one node remains, reporting edge ratios into
    /// `debug`.
    pub fn construct(&mut self, debug: &mut DebugInfo) -> Result<(), CompressionError> {
        assert_eq!(
            self.top_tree.num_leaves(),
            self.tree.num_nodes(),
            "top tree must hold one leaf per tree node"
        );
        let mut round = 0usize;
        while self.tree.num_edges() > 0 {
            let before = self.tree.num_edges();
            self.horizontal_merges(before);
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

    /// Collect the round's candidate pairs, rank digram groups by
    /// frequency, and merge groups until the predicted ratio clears the
    /// threshold (or everything, when it cannot).
    fn horizontal_merges(&mut self, edges_before: usize) {
        let candidates = self.collect_candidates();
        if candidates.is_empty() {
            return;
        }

        let selected = self.select_candidates(&candidates, edges_before);
        for index in selected {
            let candidate = candidates[index];
            // The sides cannot have changed: candidate pairs are disjoint
            // and the vertical pass has not run yet.
            let (survivor, merge_type) =
                self.tree
                    .merge_siblings(candidate.parent, candidate.left_slot, candidate.right_slot);
            self.record(candidate.left, candidate.right, survivor, merge_type);
        }
    }

    /// Walk every parent's child run pairing adjacent children with stride
    /// two, exactly like the greedy pass, but collect instead of merging.
    fn collect_candidates(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();
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
                    candidates.push(Candidate {
                        parent,
                        left_slot,
                        right_slot,
                        left,
                        right,
                        digram: (
                            self.fingerprints[self.node_clusters[left]],
                            self.fingerprints[self.node_clusters[right]],
                        ),
                    });
                }
                index += 2;
            }
        }
        candidates
    }

    /// Pick candidate indices group by group, most frequent digram first
    /// (first-seen order breaks ties), until performing them would reach
    /// the minimum edge ratio for this round. Returns indices in
    /// collection order so merges replay left to right.
    fn select_candidates(&self, candidates: &[Candidate], edges_before: usize) -> Vec<usize> {
        let needed = needed_merges(edges_before, self.min_ratio);
        if needed == 0 || needed >= candidates.len() {
            return (0..candidates.len()).collect();
        }

        let mut groups: HashMap<(u64, u64), Vec<usize>> = HashMap::new();
        let mut group_order: Vec<(u64, u64)> = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let members = groups.entry(candidate.digram).or_insert_with(|| {
                group_order.push(candidate.digram);
                Vec::new()
            });
            members.push(index);
        }

        let mut ranked: Vec<(usize, (u64, u64))> = group_order
            .iter()
            .enumerate()
            .map(|(seen, &digram)| (seen, digram))
            .collect();
        ranked.sort_by(|a, b| {
            let count_a = groups[&a.1].len();
            let count_b = groups[&b.1].len();
            count_b.cmp(&count_a).then(a.0.cmp(&b.0))
        });

        let mut selected = Vec::new();
        for (_, digram) in ranked {
            selected.extend_from_slice(&groups[&digram]);
            if selected.len() >= needed {
                break;
            }
        }
        selected.sort_unstable();
        selected
    }

    /// Same single ascending sweep as the greedy constructor.
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

    fn record(&mut self, left: NodeId, right: NodeId, survivor: NodeId, merge_type: MergeType) {
        let left_cluster = self.node_clusters[left];
        let right_cluster = self.node_clusters[right];
        let cluster = self
            .top_tree
            .add_cluster(left_cluster, right_cluster, merge_type);
        let mut seed = merge_type as u64;
        hash_combine(&mut seed, self.fingerprints[left_cluster]);
        hash_combine(&mut seed, self.fingerprints[right_cluster]);
        self.fingerprints.push(seed);
        debug_assert_eq!(self.fingerprints.len(), self.top_tree.len());
        self.node_clusters[survivor] = cluster;
    }
}

/// Merges required so that `edges / (edges - merges) >= min_ratio`.
fn needed_merges(edges: usize, min_ratio: f64) -> usize {
    if min_ratio <= 1.0 {
        return 0;
    }
    let fraction = (min_ratio - 1.0) / min_ratio;
    (edges as f64 * fraction).ceil() as usize
}

/// Order-dependent hash mixing, applied to labels, merge types and child
/// fingerprints so that structurally identical subtrees collide.
fn hash_combine(seed: &mut u64, value: u64) {
    *seed ^= value
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needed_merges_matches_ratio_arithmetic() {
        // 100 / (100 - 19) > 1.22 but 100 / (100 - 18) < 1.22
        assert_eq!(needed_merges(100, 1.22), 19);
        assert_eq!(needed_merges(10, 1.0), 0);
        assert_eq!(needed_merges(0, 2.0), 0);
    }

    #[test]
    fn identical_digrams_share_fingerprints() {
        // Two identical two-leaf stars below the root.
        let mut tree = OrderedTree::new();
        tree.add_nodes(7);
        tree.add_edge(0, 1);
        tree.add_edge(0, 2);
        tree.add_edge(1, 3);
        tree.add_edge(1, 4);
        tree.add_edge(2, 5);
        tree.add_edge(2, 6);

        let labels = vec![0, 1, 1, 2, 3, 2, 3];
        let mut top = TopTree::new(&labels);
        let mut debug = DebugInfo::default();
        let mut constructor = RePairConstructor::new(&mut tree, &mut top, 1.22);
        constructor.construct(&mut debug).unwrap();
        let fingerprints = constructor.fingerprints.clone();
        drop(constructor);

        // The first round merges the two (2, 3) sibling pairs into clusters
        // 7 and 8; identical digrams must collide on one fingerprint.
        assert_eq!(top.clusters[7].merge_type, Some(MergeType::HorzNoBbn));
        assert_eq!(top.clusters[8].merge_type, Some(MergeType::HorzNoBbn));
        assert_eq!(
            fingerprints[7], fingerprints[8],
            "identical digram clusters should collide"
        );
    }

    #[test]
    fn low_threshold_still_terminates() {
        let mut tree = OrderedTree::new();
        tree.add_nodes(4);
        tree.add_edge(0, 1);
        tree.add_edge(0, 2);
        tree.add_edge(0, 3);
        let mut top = TopTree::new(&[0; 4]);
        let mut debug = DebugInfo::default();
        RePairConstructor::new(&mut tree, &mut top, 0.5)
            .construct(&mut debug)
            .unwrap();
        assert_eq!(tree.num_edges(), 0);
        assert_eq!(top.len(), 4 + 3);
    }
}
