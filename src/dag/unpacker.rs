//! Expansion of a DAG back into a top tree.
//!
//! Shared DAG nodes are expanded once per occurrence: the resulting pool
//! holds no sharing, children precede parents, and the last appended
//! cluster corresponds to the DAG root.

use crate::dag::{BinaryDag, DagNodeId};
use crate::toptree::{ClusterId, TopTree};
use crate::CompressionError;

/// Rebuilds an unshared top tree from a [`BinaryDag`].
#[derive(Debug)]
pub struct DagUnpacker<'a> {
    dag: &'a BinaryDag,
    top_tree: &'a mut TopTree,
}

impl<'a> DagUnpacker<'a> {
    /// Create an unpacker writing into an empty top tree.
    pub fn new(dag: &'a BinaryDag, top_tree: &'a mut TopTree) -> Self {
        assert!(top_tree.is_empty(), "unpacking into a non-empty top tree");
        Self { dag, top_tree }
    }

    /// Expand the DAG root into clusters, returning the root cluster id.
    pub fn unpack(&mut self) -> Result<ClusterId, CompressionError> {
        let root = self.dag.root().ok_or(CompressionError::EmptyDag)?;
        Ok(self.expand(root))
    }

    fn expand(&mut self, node: DagNodeId) -> ClusterId {
        let record = self.dag.nodes[node];
        if record.left == 0 && record.right == 0 {
            let label = record.label.expect("leaf DAG node without label");
            return self.top_tree.add_leaf(label);
        }
        debug_assert!(
            record.left != 0 && record.right != 0,
            "DAG node {node} has exactly one child"
        );
        let left = self.expand(record.left);
        let right = self.expand(record.right);
        let merge_type = record.merge_type.expect("inner DAG node without merge type");
        self.top_tree.add_cluster(left, right, merge_type)
    }
}
