//! Output size estimation.
//!
//! Computes the entropy-coded size of a compressed DAG and the succinct
//! size of the plain tree it came from, in bits. The numbers drive the
//! ratio reporting of the CLI; no on-disk archive layout is derived from
//! them.

use crate::dag::BinaryDag;
use crate::huffman::{fixed_code_width, HuffmanBuilder};
use crate::labels::{LabelId, Labels};
use crate::tree::OrderedTree;

/// Estimated bits for a Top DAG: per node one leaf/inner marker, Huffman
/// codes for leaf labels and inner merge types, fixed-width child
/// references for inner nodes, plus both code tables and the raw label
/// strings.
pub fn dag_size_bits(dag: &BinaryDag, labels: &Labels) -> u64 {
    let mut label_codes: HuffmanBuilder<LabelId> = HuffmanBuilder::new();
    let mut merge_codes: HuffmanBuilder<u8> = HuffmanBuilder::new();
    let mut inner_nodes = 0u64;

    for node in dag.nodes.iter().skip(1) {
        match node.label {
            Some(label) => label_codes.add_item(&label),
            None => {
                let merge_type = node.merge_type.expect("inner DAG node without merge type");
                merge_codes.add_item(&(merge_type as u8));
                inner_nodes += 1;
            }
        }
    }
    label_codes.construct();
    merge_codes.construct();

    let markers = dag.num_nodes() as u64;
    let references = inner_nodes * 2 * u64::from(fixed_code_width(dag.len()));
    markers
        + references
        + label_codes.bits_needed()
        + label_codes.bits_for_table_labels()
        + merge_codes.bits_needed()
        + label_table_bits(labels)
}

/// Estimated bits for the uncompressed tree in succinct form: two
/// structure bits per node plus Huffman-coded labels and the label table.
pub fn succinct_tree_bits(tree: &OrderedTree, labels: &Labels, node_labels: &[LabelId]) -> u64 {
    let mut label_codes: HuffmanBuilder<LabelId> = HuffmanBuilder::new();
    for &label in node_labels {
        label_codes.add_item(&label);
    }
    label_codes.construct();

    2 * tree.num_nodes() as u64
        + label_codes.bits_needed()
        + label_codes.bits_for_table_labels()
        + label_table_bits(labels)
}

/// Raw UTF-8 bytes of every distinct label, as stored on disk.
fn label_table_bits(labels: &Labels) -> u64 {
    labels.iter().map(|name| 8 * name.len() as u64).sum()
}
