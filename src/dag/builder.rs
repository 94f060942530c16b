//! Folding a top tree into its minimal DAG.
//!
//! Clusters are visited in pool order, which puts children before parents,
//! and each one is hash-consed on the canonical key
//! `(left dag id, right dag id, merge type, label)`. A key hit reuses the
//! existing node without touching in-degrees; a miss appends a node and
//! bumps the in-degree of both children. Ids therefore grow monotonically
//! and every child id is smaller than its parent's.

use std::collections::HashMap;

use crate::dag::{BinaryDag, DagNodeId};
use crate::labels::LabelId;
use crate::toptree::{MergeType, TopTree};

type DagKey = (DagNodeId, DagNodeId, Option<MergeType>, Option<LabelId>);

/// Hash-consing builder from a top tree into a [`BinaryDag`].
#[derive(Debug)]
pub struct DagBuilder<'a> {
    top_tree: &'a TopTree,
    dag: &'a mut BinaryDag,
    known: HashMap<DagKey, DagNodeId>,
}

impl<'a> DagBuilder<'a> {
    /// Create a builder writing into a DAG that holds only the sentinel.
    pub fn new(top_tree: &'a TopTree, dag: &'a mut BinaryDag) -> Self {
        assert!(dag.is_empty(), "building into a non-empty DAG");
        Self {
            top_tree,
            dag,
            known: HashMap::new(),
        }
    }

    /// Fold every cluster; the top tree root becomes the DAG root.
    pub fn build(&mut self) {
        let mut cluster_nodes: Vec<DagNodeId> = Vec::with_capacity(self.top_tree.len());
        for cluster in &self.top_tree.clusters {
            let left = cluster.left.map_or(0, |child| cluster_nodes[child]);
            let right = cluster.right.map_or(0, |child| cluster_nodes[child]);
            let key = (left, right, cluster.merge_type, cluster.label);
            let id = match self.known.get(&key) {
                Some(&id) => id,
                None => {
                    let id = self
                        .dag
                        .add_node(left, right, cluster.merge_type, cluster.label);
                    self.known.insert(key, id);
                    id
                }
            };
            cluster_nodes.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn build(top_tree: &TopTree) -> BinaryDag {
        let mut dag = BinaryDag::new();
        DagBuilder::new(top_tree, &mut dag).build();
        dag
    }

    #[test]
    fn identical_subtrees_are_shared() {
        let mut top = TopTree::new(&[1, 1, 1, 1]);
        let a = top.add_cluster(0, 1, MergeType::HorzNoBbn);
        let b = top.add_cluster(2, 3, MergeType::HorzNoBbn);
        top.add_cluster(a, b, MergeType::HorzNoBbn);

        let dag = build(&top);
        // one shared leaf, one shared pair, one root
        assert_eq!(dag.num_nodes(), 3);
        let root = dag.root().unwrap();
        assert_eq!(dag.nodes[root].left, dag.nodes[root].right);
    }

    #[test]
    fn keys_are_unique_and_children_precede_parents() {
        let mut top = TopTree::new(&[0, 1, 2]);
        let inner = top.add_cluster(1, 2, MergeType::HorzNoBbn);
        top.add_cluster(0, inner, MergeType::VertNoBbn);

        let dag = build(&top);
        let mut seen = HashSet::new();
        for (id, node) in dag.nodes.iter().enumerate().skip(1) {
            assert!(node.left < id && node.right < id);
            assert!(seen.insert((node.left, node.right, node.merge_type, node.label)));
        }
    }

    #[test]
    fn in_degrees_match_reference_counts() {
        let mut top = TopTree::new(&[5, 5, 5, 5]);
        let a = top.add_cluster(0, 1, MergeType::HorzNoBbn);
        let b = top.add_cluster(2, 3, MergeType::HorzNoBbn);
        top.add_cluster(a, b, MergeType::VertWithBbn);

        let dag = build(&top);
        for (id, node) in dag.nodes.iter().enumerate().skip(1) {
            let references = dag
                .nodes
                .iter()
                .skip(1)
                .map(|n| usize::from(n.left == id) + usize::from(n.right == id))
                .sum::<usize>();
            assert_eq!(node.in_degree as usize, references, "node {id}");
        }
    }
}
