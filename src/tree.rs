//! Mutable ordered tree store.
//!
//! Nodes are dense small integers; the root is node 0. Every node owns a
//! contiguous run of slots in one shared edge array, holding its children in
//! sibling order. Removing an edge marks its slot invalid; [`compact`]
//! rebuilds the array so that every run consists of valid slots only. The
//! two merge operations implement the primitives the top-tree constructor
//! is built from: replacing two adjacent siblings by one synthetic node, and
//! collapsing a node into its only child.
//!
//! [`compact`]: OrderedTree::compact

use crate::toptree::MergeType;

/// Identifier of a tree node.
pub type NodeId = usize;

/// Per-node bookkeeping record.
///
/// `num_slots` counts all slots of the node's edge run including invalidated
/// ones; `num_valid` counts live edges only. The two agree right after
/// [`OrderedTree::compact`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeNode {
    /// Offset of the node's first edge slot in the shared edge array.
    pub first_edge: usize,
    /// Total slots in the node's run, invalid ones included.
    pub num_slots: usize,
    /// Live edges in the node's run.
    pub num_valid: usize,
    /// Parent node, `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,
}

/// A slot in the shared edge array.
#[derive(Debug, Clone, Copy)]
pub struct TreeEdge {
    /// Child node this edge points at.
    pub head: NodeId,
    /// Cleared when the edge is removed; reclaimed by compaction.
    pub valid: bool,
}

/// Rooted ordered tree with shared edge storage.
#[derive(Debug, Clone, Default)]
pub struct OrderedTree {
    nodes: Vec<TreeNode>,
    edges: Vec<TreeEdge>,
    num_edges: usize,
}

impl OrderedTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with storage for `nodes` nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(nodes.saturating_sub(1)),
            num_edges: 0,
        }
    }

    /// Append a new node without edges and return its id.
    pub fn add_node(&mut self) -> NodeId {
        self.nodes.push(TreeNode::default());
        self.nodes.len() - 1
    }

    /// Append `count` nodes, returning the id of the first.
    pub fn add_nodes(&mut self, count: usize) -> NodeId {
        let first = self.nodes.len();
        self.nodes
            .resize(self.nodes.len() + count, TreeNode::default());
        first
    }

    /// Number of node records, detached ones included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of live children of `node`.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.nodes[node].num_valid
    }

    /// Whether `node` currently has no live children.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.nodes[node].num_valid == 0
    }

    /// Parent of `node`, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    /// Append an edge `parent -> child` after the existing children.
    ///
    /// When the parent's run cannot grow in place, the run is relocated to
    /// the end of the edge array, dropping invalidated slots on the way.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) {
        assert!(parent < self.nodes.len(), "edge from unknown node {parent}");
        assert!(child < self.nodes.len(), "edge to unknown node {child}");

        let record = self.nodes[parent];
        if record.num_slots == 0 {
            self.nodes[parent].first_edge = self.edges.len();
        } else if record.first_edge + record.num_slots != self.edges.len() {
            self.relocate_run(parent);
        }
        self.edges.push(TreeEdge {
            head: child,
            valid: true,
        });
        self.nodes[parent].num_slots += 1;
        self.nodes[parent].num_valid += 1;
        self.nodes[child].parent = Some(parent);
        self.num_edges += 1;
    }

    /// Copy the valid part of a node's run to the end of the edge array.
    fn relocate_run(&mut self, node: NodeId) {
        let record = self.nodes[node];
        let new_first = self.edges.len();
        for slot in record.first_edge..record.first_edge + record.num_slots {
            if self.edges[slot].valid {
                let edge = self.edges[slot];
                self.edges.push(edge);
            }
        }
        self.nodes[node].first_edge = new_first;
        self.nodes[node].num_slots = record.num_valid;
    }

    /// Mark the edge in `slot` of `parent`'s run as removed.
    pub fn remove_edge(&mut self, parent: NodeId, slot: usize) {
        let record = self.nodes[parent];
        assert!(
            slot >= record.first_edge && slot < record.first_edge + record.num_slots,
            "slot {slot} outside the run of node {parent}"
        );
        assert!(self.edges[slot].valid, "edge in slot {slot} already removed");
        self.edges[slot].valid = false;
        self.nodes[parent].num_valid -= 1;
        self.num_edges -= 1;
    }

    /// Live children of `node`, in sibling order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let record = self.nodes[node];
        self.edges[record.first_edge..record.first_edge + record.num_slots]
            .iter()
            .filter(|edge| edge.valid)
            .map(|edge| edge.head)
    }

    /// Live children of `node` together with their slot indices.
    pub fn child_slots(&self, node: NodeId) -> Vec<(usize, NodeId)> {
        let record = self.nodes[node];
        (record.first_edge..record.first_edge + record.num_slots)
            .filter(|&slot| self.edges[slot].valid)
            .map(|slot| (slot, self.edges[slot].head))
            .collect()
    }

    /// The only live child of `node`, when its out-degree is exactly one.
    pub fn single_child(&self, node: NodeId) -> Option<NodeId> {
        if self.nodes[node].num_valid != 1 {
            return None;
        }
        self.children(node).next()
    }

    /// Replace two adjacent live siblings by one synthetic node.
    ///
    /// `left_slot` and `right_slot` are the slots of the two edges in
    /// `parent`'s run. At least one of the two heads must be a leaf; the
    /// side that still has children survives and keeps its bottom boundary
    /// (when both are leaves the left one survives). Returns the surviving
    /// node and the merge type describing the combination.
    pub fn merge_siblings(
        &mut self,
        parent: NodeId,
        left_slot: usize,
        right_slot: usize,
    ) -> (NodeId, MergeType) {
        let left = self.edges[left_slot].head;
        let right = self.edges[right_slot].head;
        debug_assert!(self.edges[left_slot].valid && self.edges[right_slot].valid);

        let (survivor, removed_slot, detached, merge_type) =
            match (self.is_leaf(left), self.is_leaf(right)) {
                (true, true) => (left, right_slot, right, MergeType::HorzNoBbn),
                (true, false) => (right, left_slot, left, MergeType::HorzRightBbn),
                (false, true) => (left, right_slot, right, MergeType::HorzLeftBbn),
                (false, false) => {
                    panic!("merging two siblings that both still have children")
                }
            };
        self.remove_edge(parent, removed_slot);
        self.detach(detached);
        (survivor, merge_type)
    }

    /// Collapse `node` into its only child: the node survives and adopts
    /// the grandchild edges. Returns the absorbed child and the merge type
    /// (`VertNoBbn` when the child was a leaf).
    pub fn merge_chain(&mut self, node: NodeId) -> (NodeId, MergeType) {
        let child = self
            .single_child(node)
            .expect("vertical merge on a node whose out-degree is not one");
        let merge_type = if self.is_leaf(child) {
            MergeType::VertNoBbn
        } else {
            MergeType::VertWithBbn
        };

        let child_record = self.nodes[child];
        // The edge node -> child disappears; the grandchildren re-home.
        self.num_edges -= 1;
        self.nodes[node].first_edge = child_record.first_edge;
        self.nodes[node].num_slots = child_record.num_slots;
        self.nodes[node].num_valid = child_record.num_valid;
        for slot in child_record.first_edge..child_record.first_edge + child_record.num_slots {
            if self.edges[slot].valid {
                let grandchild = self.edges[slot].head;
                self.nodes[grandchild].parent = Some(node);
            }
        }
        self.detach(child);
        (child, merge_type)
    }

    /// Clear the record of a node that was absorbed by a merge.
    fn detach(&mut self, node: NodeId) {
        self.nodes[node] = TreeNode::default();
    }

    /// Drop invalidated slots, preserving sibling order and refreshing
    /// every node's run offset and slot count.
    pub fn compact(&mut self) {
        let mut compacted = Vec::with_capacity(self.num_edges);
        for node in 0..self.nodes.len() {
            let record = self.nodes[node];
            if record.num_slots == 0 {
                continue;
            }
            let new_first = compacted.len();
            for slot in record.first_edge..record.first_edge + record.num_slots {
                if self.edges[slot].valid {
                    compacted.push(self.edges[slot]);
                }
            }
            self.nodes[node].first_edge = new_first;
            self.nodes[node].num_slots = record.num_valid;
        }
        self.edges = compacted;
    }

    /// Height of the tree: the number of edges on the longest root-to-leaf
    /// path. A single-node tree has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        self.visit_depths(|_, depth| height = height.max(depth));
        height
    }

    /// Average depth over all nodes reachable from the root.
    pub fn avg_depth(&self) -> f64 {
        let mut total = 0usize;
        let mut count = 0usize;
        self.visit_depths(|_, depth| {
            total += depth;
            count += 1;
        });
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    fn visit_depths(&self, mut visit: impl FnMut(NodeId, usize)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            for child in self.children(node) {
                stack.push((child, depth + 1));
            }
        }
    }

    /// One-line description used in progress output.
    pub fn summary(&self) -> String {
        format!(
            "ordered tree with {} nodes and {} edges",
            self.nodes.len(),
            self.num_edges
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> OrderedTree {
        // 0 -> 1, 2, 3; 1 -> 4, 5
        let mut tree = OrderedTree::new();
        tree.add_nodes(6);
        tree.add_edge(0, 1);
        tree.add_edge(0, 2);
        tree.add_edge(0, 3);
        tree.add_edge(1, 4);
        tree.add_edge(1, 5);
        tree
    }

    #[test]
    fn children_enumerate_in_insertion_order() {
        let tree = sample_tree();
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(tree.num_edges(), 5);
        assert_eq!(tree.parent(4), Some(1));
        assert_eq!(tree.parent(0), None);
    }

    #[test]
    fn interleaved_insertion_relocates_runs() {
        let mut tree = OrderedTree::new();
        tree.add_nodes(5);
        tree.add_edge(0, 1);
        tree.add_edge(1, 2); // forces node 0's run away from the array end
        tree.add_edge(0, 3);
        tree.add_edge(0, 4);
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn remove_and_compact_preserve_order() {
        let mut tree = sample_tree();
        let slots = tree.child_slots(0);
        tree.remove_edge(0, slots[1].0); // drop child 2
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(tree.out_degree(0), 2);

        tree.compact();
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(tree.num_edges(), 4);
        let record = tree.nodes[0];
        assert_eq!(record.num_slots, record.num_valid);
    }

    #[test]
    fn sibling_merge_keeps_the_side_with_children() {
        let mut tree = sample_tree();
        let slots = tree.child_slots(0);
        // children 1 (internal) and 2 (leaf)
        let (survivor, merge_type) = tree.merge_siblings(0, slots[0].0, slots[1].0);
        assert_eq!(survivor, 1);
        assert_eq!(merge_type, MergeType::HorzLeftBbn);
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3]);

        // reversed roles: left operand is the leaf 2, right the internal 1
        let mut tree = sample_tree();
        let slots = tree.child_slots(0);
        let (survivor, merge_type) = tree.merge_siblings(0, slots[1].0, slots[0].0);
        assert_eq!(survivor, 1);
        assert_eq!(merge_type, MergeType::HorzRightBbn);
    }

    #[test]
    fn leaf_pair_merge_keeps_the_left_side() {
        let mut tree = sample_tree();
        let slots = tree.child_slots(1);
        let (survivor, merge_type) = tree.merge_siblings(1, slots[0].0, slots[1].0);
        assert_eq!(survivor, 4);
        assert_eq!(merge_type, MergeType::HorzNoBbn);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![4]);
        assert!(tree.is_leaf(4));
    }

    #[test]
    fn chain_merge_adopts_grandchildren() {
        // 0 -> 1 -> {2, 3}
        let mut tree = OrderedTree::new();
        tree.add_nodes(4);
        tree.add_edge(0, 1);
        tree.add_edge(1, 2);
        tree.add_edge(1, 3);

        let (child, merge_type) = tree.merge_chain(0);
        assert_eq!(child, 1);
        assert_eq!(merge_type, MergeType::VertWithBbn);
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(tree.parent(2), Some(0));
        assert_eq!(tree.parent(3), Some(0));
        assert_eq!(tree.num_edges(), 2);
    }

    #[test]
    fn chain_merge_with_leaf_child_ends_the_chain() {
        let mut tree = OrderedTree::new();
        tree.add_nodes(2);
        tree.add_edge(0, 1);
        let (child, merge_type) = tree.merge_chain(0);
        assert_eq!(child, 1);
        assert_eq!(merge_type, MergeType::VertNoBbn);
        assert!(tree.is_leaf(0));
        assert_eq!(tree.num_edges(), 0);
    }

    #[test]
    fn height_and_avg_depth() {
        let tree = sample_tree();
        assert_eq!(tree.height(), 2);
        // depths: 0, 1, 1, 1, 2, 2
        assert!((tree.avg_depth() - 7.0 / 6.0).abs() < 1e-9);
    }
}
