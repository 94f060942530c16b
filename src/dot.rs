//! DOT graph export for debugging and demos.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dag::BinaryDag;
use crate::labels::{LabelId, Labels};
use crate::toptree::MergeType;
use crate::tree::OrderedTree;

/// Write an ordered tree as a DOT digraph, one box per node.
pub fn write_tree_dot(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "digraph tree {{")?;
    writeln!(out, "\tnode [shape=box];")?;
    for node in 0..tree.num_nodes() {
        writeln!(
            out,
            "\tn{} [label=\"{} ({})\"];",
            node,
            labels.resolve(node_labels[node]),
            node
        )?;
        for child in tree.children(node) {
            writeln!(out, "\tn{node} -> n{child};")?;
        }
    }
    writeln!(out, "}}")
}

/// Write a binary DAG as a DOT digraph; the sentinel is omitted.
pub fn write_dag_dot(dag: &BinaryDag, labels: &Labels, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "digraph topdag {{")?;
    writeln!(out, "\tnode [shape=box];")?;
    for (id, node) in dag.nodes.iter().enumerate().skip(1) {
        let caption = match (node.label, node.merge_type) {
            (Some(label), _) => labels.resolve(label).to_string(),
            (None, Some(merge_type)) => merge_type_caption(merge_type).to_string(),
            (None, None) => String::from("?"),
        };
        writeln!(out, "\td{id} [label=\"{caption} ({id})\"];")?;
        if node.left != 0 {
            writeln!(out, "\td{} -> d{} [label=\"l\"];", id, node.left)?;
        }
        if node.right != 0 {
            writeln!(out, "\td{} -> d{} [label=\"r\"];", id, node.right)?;
        }
    }
    writeln!(out, "}}")
}

/// Write a tree DOT file to disk.
pub fn write_tree_dot_to_path(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
    path: impl AsRef<Path>,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_tree_dot(tree, labels, node_labels, &mut out)?;
    out.flush()
}

/// Write a DAG DOT file to disk.
pub fn write_dag_dot_to_path(
    dag: &BinaryDag,
    labels: &Labels,
    path: impl AsRef<Path>,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_dag_dot(dag, labels, &mut out)?;
    out.flush()
}

fn merge_type_caption(merge_type: MergeType) -> &'static str {
    match merge_type {
        MergeType::VertNoBbn => "V",
        MergeType::VertWithBbn => "V+",
        MergeType::HorzLeftBbn => "H<",
        MergeType::HorzRightBbn => "H>",
        MergeType::HorzNoBbn => "H",
    }
}
