//! Expansion of a top tree back into an ordered tree.
//!
//! Inverts the constructor: the root cluster is expanded recursively, each
//! merge type telling where the right subtree attaches. Every expansion
//! returns the cluster's bottom boundary node, the node a parent vertical
//! merge hangs its right side below.

use crate::labels::LabelId;
use crate::toptree::{ClusterId, MergeType, TopTree};
use crate::tree::{NodeId, OrderedTree};
use crate::CompressionError;

/// Rebuilds an ordered tree and its label vector from a top tree.
#[derive(Debug)]
pub struct TopTreeUnpacker<'a> {
    top_tree: &'a TopTree,
    tree: &'a mut OrderedTree,
    node_labels: &'a mut Vec<LabelId>,
}

impl<'a> TopTreeUnpacker<'a> {
    /// Create an unpacker writing into an empty tree and label vector.
    pub fn new(
        top_tree: &'a TopTree,
        tree: &'a mut OrderedTree,
        node_labels: &'a mut Vec<LabelId>,
    ) -> Self {
        assert_eq!(tree.num_nodes(), 0, "unpacking into a non-empty tree");
        Self {
            top_tree,
            tree,
            node_labels,
        }
    }

    /// Expand the root cluster. The first node emitted is the tree root,
    /// so the reconstructed root has id 0.
    pub fn unpack(&mut self) -> Result<(), CompressionError> {
        let root = self
            .top_tree
            .root()
            .ok_or(CompressionError::EmptyTopTree)?;
        self.expand(root, None);
        Ok(())
    }

    /// Emit the subtree of `cluster` below `parent`, returning the bottom
    /// boundary node when the cluster kept one.
    fn expand(&mut self, cluster: ClusterId, parent: Option<NodeId>) -> Option<NodeId> {
        let record = self.top_tree.clusters[cluster];
        let (Some(left), Some(right)) = (record.left, record.right) else {
            let label = record.label.expect("leaf cluster without label");
            let node = self.tree.add_node();
            self.node_labels.push(label);
            if let Some(parent) = parent {
                self.tree.add_edge(parent, node);
            }
            return Some(node);
        };

        let merge_type = record.merge_type.expect("inner cluster without merge type");
        match merge_type {
            MergeType::VertNoBbn | MergeType::VertWithBbn => {
                let boundary = self
                    .expand(left, parent)
                    .expect("vertical merge below a boundary-less cluster");
                let right_boundary = self.expand(right, Some(boundary));
                match merge_type {
                    MergeType::VertWithBbn => right_boundary,
                    _ => None,
                }
            }
            MergeType::HorzLeftBbn | MergeType::HorzRightBbn | MergeType::HorzNoBbn => {
                let left_boundary = self.expand(left, parent);
                let right_boundary = self.expand(right, parent);
                match merge_type {
                    MergeType::HorzLeftBbn => left_boundary,
                    MergeType::HorzRightBbn => right_boundary,
                    _ => None,
                }
            }
        }
    }
}
