//! End-to-end round trips through the full pipeline:
//! tree → top tree → DAG → top tree → tree.

mod common;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use topdag::random::RandomTreeGenerator;
use topdag::{
    CompressionConfig, Compressor, DagUnpacker, Labels, MergeType, TopTree,
};

use common::{
    assert_roundtrip, chain_tree, compress, dfs_shape, harness_tree, perfect_binary_tree,
    two_child_tree,
};

#[test]
fn two_child_tree_roundtrips() {
    let (tree, labels, node_labels) = two_child_tree();
    assert_roundtrip(&tree, &labels, &node_labels);

    // three leaves plus one cluster per edge
    let compressed = compress(&tree, &node_labels);
    assert_eq!(compressed.top_tree.len(), 3 + 2);
    // distinct labels: every cluster folds to its own DAG node
    assert_eq!(compressed.dag.num_nodes(), 5);
}

#[test]
fn two_equal_children_share_a_leaf() {
    let mut tree = topdag::OrderedTree::new();
    tree.add_nodes(3);
    tree.add_edge(0, 1);
    tree.add_edge(0, 2);
    let mut labels = Labels::new();
    let root = labels.intern("root");
    let a = labels.intern("a");
    let node_labels = vec![root, a, a];

    assert_roundtrip(&tree, &labels, &node_labels);
    let compressed = compress(&tree, &node_labels);
    // the two "a" leaves fold together: root leaf + a leaf + pair + root
    assert_eq!(compressed.dag.num_nodes(), 4);
}

#[test]
fn chain_roundtrips_with_vertical_merges_only() {
    let (tree, labels, node_labels) = chain_tree(5);
    assert_roundtrip(&tree, &labels, &node_labels);

    let compressed = compress(&tree, &node_labels);
    for cluster in &compressed.top_tree.clusters {
        if let Some(merge_type) = cluster.merge_type {
            assert!(matches!(
                merge_type,
                MergeType::VertNoBbn | MergeType::VertWithBbn
            ));
        }
    }
    // 4 edges halve as 4 -> 2 -> 1 -> 0
    assert_eq!(compressed.debug.num_edge_ratios, 3);
}

#[test]
fn harness_tree_dag_is_smaller_than_its_top_tree() {
    let (tree, labels, node_labels) = harness_tree();
    assert_roundtrip(&tree, &labels, &node_labels);

    let compressed = compress(&tree, &node_labels);
    // ten merges on eleven leaves
    assert_eq!(compressed.top_tree.len(), 21);
    assert!(
        compressed.dag.num_nodes() < compressed.top_tree.len(),
        "repeated chain labels must fold"
    );
}

#[test]
fn perfect_binary_tree_folds_to_logarithmic_dag() {
    let (tree, labels, node_labels) = perfect_binary_tree(4); // 15 nodes
    assert_roundtrip(&tree, &labels, &node_labels);

    let compressed = compress(&tree, &node_labels);
    // one shared leaf plus one pair/chain node per level
    assert!(compressed.dag.num_nodes() <= 7);
    assert_eq!(compressed.top_tree.len(), 15 + 14);
}

#[test]
fn single_node_tree_roundtrips() {
    let mut tree = topdag::OrderedTree::new();
    tree.add_node();
    let mut labels = Labels::new();
    let node_labels = vec![labels.intern("only")];
    assert_roundtrip(&tree, &labels, &node_labels);

    let compressed = compress(&tree, &node_labels);
    assert_eq!(compressed.top_tree.len(), 1);
    assert_eq!(compressed.dag.num_nodes(), 1);
    assert_eq!(compressed.dag.count_edges(), 0);
}

#[test]
fn top_tree_equals_its_dag_expansion() {
    for (tree, _, node_labels) in [two_child_tree(), harness_tree(), chain_tree(9)] {
        let compressed = compress(&tree, &node_labels);
        let mut recovered = TopTree::empty();
        DagUnpacker::new(&compressed.dag, &mut recovered)
            .unpack()
            .expect("unpacking succeeds");
        assert!(
            compressed.top_tree.is_equal(&recovered),
            "DAG expansion must reproduce the top tree"
        );
    }
}

#[test]
fn edge_ratios_exceed_one_in_every_round() {
    let (tree, _, node_labels) = harness_tree();
    let compressed = compress(&tree, &node_labels);
    assert!(compressed.debug.num_edge_ratios > 0);
    assert!(compressed.debug.min_edge_ratio > 1.0);
    assert!(compressed.debug.max_edge_ratio >= compressed.debug.min_edge_ratio);
}

#[test]
fn seeded_random_tree_achieves_the_reference_ratio() {
    let mut random = RandomTreeGenerator::new(ChaCha8Rng::seed_from_u64(12345678));
    let tree = random.generate_tree(1000);
    let mut labels = Labels::new();
    let node_labels = random.random_labels(tree.num_nodes(), 2, &mut labels);

    assert_roundtrip(&tree, &labels, &node_labels);
    let compressed = compress(&tree, &node_labels);
    assert!(compressed.debug.min_edge_ratio > 1.0);
    assert!(
        compressed.debug.avg_edge_ratio() >= 1.22,
        "average edge ratio {} below the reference threshold",
        compressed.debug.avg_edge_ratio()
    );
}

#[test]
fn repair_variant_roundtrips_and_stays_deterministic() {
    let mut random = RandomTreeGenerator::new(ChaCha8Rng::seed_from_u64(4242));
    let tree = random.generate_tree(300);
    let mut labels = Labels::new();
    let node_labels = random.random_labels(tree.num_nodes(), 3, &mut labels);

    let compressor = Compressor::new(CompressionConfig {
        use_repair: true,
        ..CompressionConfig::default()
    });
    let compressed = compressor
        .compress(tree.clone(), &node_labels)
        .expect("repair compression succeeds");
    let (restored, restored_labels) = compressor
        .decompress(&compressed.dag)
        .expect("decompression succeeds");
    assert_eq!(
        dfs_shape(&tree, &labels, &node_labels),
        dfs_shape(&restored, &labels, &restored_labels)
    );
}

#[test]
fn xml_documents_survive_the_whole_pipeline() {
    let source = "<catalog><book><title/><author/></book><book><title/><author/></book>\
                  <book><title/></book></catalog>";
    let mut labels = Labels::new();
    let (tree, node_labels) = topdag::xml::parse_str(source, &mut labels).unwrap();

    let compressor = Compressor::default();
    let compressed = compressor.compress(tree.clone(), &node_labels).unwrap();
    let (restored, restored_labels) = compressor.decompress(&compressed.dag).unwrap();

    let mut rendered = Vec::new();
    topdag::xml::write_tree(&restored, &labels, &restored_labels, &mut rendered).unwrap();
    let rendered = String::from_utf8(rendered).unwrap();

    let mut labels2 = Labels::new();
    let (reparsed, reparsed_labels) = topdag::xml::parse_str(&rendered, &mut labels2).unwrap();
    assert_eq!(
        dfs_shape(&tree, &labels, &node_labels),
        dfs_shape(&reparsed, &labels2, &reparsed_labels)
    );

    // the two identical <book> subtrees must share DAG structure
    assert!(compressed.dag.num_nodes() < compressed.top_tree.len());
}
