//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use topdag::{Compression, CompressionConfig, Compressor, LabelId, Labels, OrderedTree};

/// `root[a, b]` with three distinct labels.
pub fn two_child_tree() -> (OrderedTree, Labels, Vec<LabelId>) {
    let mut tree = OrderedTree::new();
    tree.add_nodes(3);
    tree.add_edge(0, 1);
    tree.add_edge(0, 2);
    let mut labels = Labels::new();
    let node_labels = vec![
        labels.intern("root"),
        labels.intern("a"),
        labels.intern("b"),
    ];
    (tree, labels, node_labels)
}

/// A chain of `len` nodes with distinct labels.
pub fn chain_tree(len: usize) -> (OrderedTree, Labels, Vec<LabelId>) {
    assert!(len > 0);
    let mut tree = OrderedTree::new();
    tree.add_nodes(len);
    for node in 0..len - 1 {
        tree.add_edge(node, node + 1);
    }
    let mut labels = Labels::new();
    let node_labels = (0..len)
        .map(|node| labels.intern(&format!("c{node}")))
        .collect();
    (tree, labels, node_labels)
}

/// The 11-node harness tree: root with children 1, 2, 3; 1 with 4, 5;
/// 3 with the chain 6, 7, 8; 4 with 9, 10. Every node is labeled "chain"
/// except the root.
pub fn harness_tree() -> (OrderedTree, Labels, Vec<LabelId>) {
    let mut tree = OrderedTree::new();
    tree.add_nodes(11);
    tree.add_edge(0, 1);
    tree.add_edge(0, 2);
    tree.add_edge(0, 3);
    tree.add_edge(1, 4);
    tree.add_edge(1, 5);
    tree.add_edge(3, 6);
    tree.add_edge(6, 7);
    tree.add_edge(7, 8);
    tree.add_edge(4, 9);
    tree.add_edge(4, 10);
    let mut labels = Labels::new();
    let root = labels.intern("root");
    let chain = labels.intern("chain");
    let mut node_labels = vec![chain; 11];
    node_labels[0] = root;
    (tree, labels, node_labels)
}

/// A perfect binary tree with `levels` levels (so `2^levels - 1` nodes),
/// every node carrying the same label.
pub fn perfect_binary_tree(levels: u32) -> (OrderedTree, Labels, Vec<LabelId>) {
    let num_nodes = (1usize << levels) - 1;
    let mut tree = OrderedTree::new();
    tree.add_nodes(num_nodes);
    for parent in 0..num_nodes / 2 {
        tree.add_edge(parent, 2 * parent + 1);
        tree.add_edge(parent, 2 * parent + 2);
    }
    let mut labels = Labels::new();
    let x = labels.intern("x");
    (tree, labels, vec![x; num_nodes])
}

/// Compress with the default greedy configuration.
pub fn compress(tree: &OrderedTree, node_labels: &[LabelId]) -> Compression {
    Compressor::new(CompressionConfig::default())
        .compress(tree.clone(), node_labels)
        .expect("compression succeeds")
}

/// The DFS shape of a labeled tree: label string and out-degree per node
/// in pre-order. Two trees are isomorphic (labels included) exactly when
/// their shapes agree.
pub fn dfs_shape(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
) -> Vec<(String, usize)> {
    let mut shape = Vec::new();
    if tree.num_nodes() == 0 {
        return shape;
    }
    let mut stack = vec![0usize];
    while let Some(node) = stack.pop() {
        shape.push((
            labels.resolve(node_labels[node]).to_string(),
            tree.out_degree(node),
        ));
        let children: Vec<_> = tree.children(node).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    shape
}

/// Assert that compress → decompress reproduces the tree up to
/// isomorphism, labels included.
pub fn assert_roundtrip(tree: &OrderedTree, labels: &Labels, node_labels: &[LabelId]) {
    let compressor = Compressor::default();
    let compressed = compressor
        .compress(tree.clone(), node_labels)
        .expect("compression succeeds");
    let (restored, restored_labels) = compressor
        .decompress(&compressed.dag)
        .expect("decompression succeeds");
    assert_eq!(
        dfs_shape(tree, labels, node_labels),
        dfs_shape(&restored, labels, &restored_labels),
        "roundtrip must preserve structure and labels"
    );
}
