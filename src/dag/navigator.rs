//! Tree navigation directly on a binary DAG.
//!
//! The navigator never materializes the tree. It keeps a *dag stack* (the
//! active path through the DAG down to the leaf standing for the current
//! tree node) and a *tree stack* of dag-stack snapshots, one per ancestor
//! of the current node. Every move is decided from the `came from left`
//! flags on the path and the merge types of the parents along it; each
//! move costs O(height of the encoded tree).

use crate::dag::{BinaryDag, DagNodeId};
use crate::labels::LabelId;
use crate::toptree::MergeType;

/// One frame of the dag stack.
#[derive(Debug, Clone, Copy)]
struct NavigationRecord {
    /// DAG node this frame moved to.
    node: DagNodeId,
    /// DAG node the move came from; `None` on the root frame.
    parent: Option<DagNodeId>,
    /// Whether `node` is `parent`'s left child.
    from_left: bool,
}

/// Stateful cursor over the tree encoded by a DAG.
///
/// Navigation failures (no parent, no next sibling, first child of a leaf)
/// are reported as `false`, not as errors; they are expected conditions.
#[derive(Debug)]
pub struct Navigator<'a> {
    dag: &'a BinaryDag,
    dag_stack: Vec<NavigationRecord>,
    tree_stack: Vec<Vec<NavigationRecord>>,
}

impl<'a> Navigator<'a> {
    /// Position a new navigator on the root of the encoded tree.
    ///
    /// # Panics
    /// Panics if the DAG holds only the sentinel.
    pub fn new(dag: &'a BinaryDag) -> Self {
        let root = dag.root().expect("navigating an empty DAG");
        let mut navigator = Self {
            dag,
            dag_stack: Vec::new(),
            tree_stack: Vec::new(),
        };
        navigator.dag_stack.push(NavigationRecord {
            node: root,
            parent: None,
            from_left: true,
        });
        navigator.descend_left();
        navigator
    }

    /// Label of the current tree node.
    pub fn label(&self) -> LabelId {
        let top = self.dag_stack.last().expect("empty dag stack");
        self.dag.nodes[top.node]
            .label
            .expect("dag stack not positioned on a leaf")
    }

    /// Whether the current tree node has no children.
    pub fn is_leaf(&self) -> bool {
        for record in self.dag_stack.iter().rev() {
            let Some(parent) = record.parent else {
                // Bottom frame: only reachable as the top on a single-leaf
                // DAG, i.e. a one-node tree.
                return self.dag.is_leaf(record.node);
            };
            let merge_type = self.merge_type(parent);

            let came_from_right = !record.from_left;
            if (came_from_right
                && matches!(merge_type, MergeType::VertNoBbn | MergeType::HorzLeftBbn))
                || (record.from_left && merge_type == MergeType::HorzRightBbn)
                || merge_type == MergeType::HorzNoBbn
                || (came_from_right && Some(record.node) == self.dag.root())
            {
                return true;
            }
            if record.from_left
                && matches!(merge_type, MergeType::VertWithBbn | MergeType::VertNoBbn)
            {
                return false;
            }
        }
        debug_assert!(false, "leaf question fell off the dag stack");
        false
    }

    /// Move to the first child of the current node. Returns `false` on a
    /// leaf.
    pub fn first_child(&mut self) -> bool {
        if self.is_leaf() {
            return false;
        }
        self.tree_stack.push(self.dag_stack.clone());
        // Pop down to the frame that entered the vertical merge from the
        // left: its right sibling holds the children.
        while let Some(&record) = self.dag_stack.last() {
            let parent = record.parent.expect("no vertical frame above the root");
            if record.from_left
                && matches!(
                    self.merge_type(parent),
                    MergeType::VertWithBbn | MergeType::VertNoBbn
                )
            {
                break;
            }
            self.dag_stack.pop();
        }
        self.swap_to_right_child();
        true
    }

    /// Move to the next sibling of the current node. Returns `false` on
    /// the last sibling.
    pub fn next_sibling(&mut self) -> bool {
        // Scan on a copy: an aborted move must not disturb the cursor.
        let mut scan = self.dag_stack.clone();
        loop {
            let Some(&record) = scan.last() else {
                return false;
            };
            let Some(parent) = record.parent else {
                scan.pop();
                continue;
            };
            let merge_type = self.merge_type(parent);
            if record.from_left
                && matches!(
                    merge_type,
                    MergeType::HorzLeftBbn | MergeType::HorzRightBbn | MergeType::HorzNoBbn
                )
            {
                break;
            }
            if !record.from_left
                && matches!(merge_type, MergeType::VertWithBbn | MergeType::VertNoBbn)
            {
                return false;
            }
            scan.pop();
        }
        self.dag_stack = scan;
        self.swap_to_right_child();
        true
    }

    /// Move to the parent of the current node. Returns `false` on the tree
    /// root.
    pub fn parent(&mut self) -> bool {
        match self.tree_stack.pop() {
            Some(snapshot) => {
                self.dag_stack = snapshot;
                true
            }
            None => false,
        }
    }

    /// Replace the top frame by its parent's right child, then descend to
    /// the leftmost leaf below it.
    fn swap_to_right_child(&mut self) {
        let top = self
            .dag_stack
            .pop()
            .expect("swap on an empty dag stack");
        let parent = top.parent.expect("swap on the root frame");
        let right = self.dag.nodes[parent].right;
        self.dag_stack.push(NavigationRecord {
            node: right,
            parent: Some(parent),
            from_left: false,
        });
        self.descend_left();
    }

    /// Push frames along left children until reaching a leaf.
    fn descend_left(&mut self) {
        let mut node = self
            .dag_stack
            .last()
            .expect("descend on an empty dag stack")
            .node;
        loop {
            let left = self.dag.nodes[node].left;
            if left == 0 {
                break;
            }
            self.dag_stack.push(NavigationRecord {
                node: left,
                parent: Some(node),
                from_left: true,
            });
            node = left;
        }
    }

    fn merge_type(&self, node: DagNodeId) -> MergeType {
        self.dag.nodes[node]
            .merge_type
            .expect("navigation across a leaf DAG node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DagBuilder;
    use crate::toptree::TopTree;

    /// DAG of the tree root[a, b]: leaves plus one horizontal and one
    /// vertical merge.
    fn two_child_dag() -> BinaryDag {
        let mut top = TopTree::new(&[0, 1, 2]);
        let pair = top.add_cluster(1, 2, MergeType::HorzNoBbn);
        top.add_cluster(0, pair, MergeType::VertNoBbn);
        let mut dag = BinaryDag::new();
        DagBuilder::new(&top, &mut dag).build();
        dag
    }

    #[test]
    fn walks_root_and_both_children() {
        let dag = two_child_dag();
        let mut nav = Navigator::new(&dag);

        assert_eq!(nav.label(), 0);
        assert!(!nav.is_leaf());
        assert!(!nav.parent());

        assert!(nav.first_child());
        assert_eq!(nav.label(), 1);
        assert!(nav.is_leaf());
        assert!(!nav.first_child());

        assert!(nav.next_sibling());
        assert_eq!(nav.label(), 2);
        assert!(nav.is_leaf());
        assert!(!nav.next_sibling());

        assert!(nav.parent());
        assert_eq!(nav.label(), 0);
        assert!(!nav.parent());
    }

    #[test]
    fn single_node_tree_is_a_leaf() {
        let top = TopTree::new(&[4]);
        let mut dag = BinaryDag::new();
        DagBuilder::new(&top, &mut dag).build();

        let mut nav = Navigator::new(&dag);
        assert_eq!(nav.label(), 4);
        assert!(nav.is_leaf());
        assert!(!nav.first_child());
        assert!(!nav.next_sibling());
        assert!(!nav.parent());
    }
}
