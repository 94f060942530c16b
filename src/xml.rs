//! XML import and export.
//!
//! Only element structure is modeled: each element becomes one tree node
//! labeled with its tag name, in document order. Text, attributes,
//! comments and processing instructions are ignored, both when reading and
//! when writing.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::labels::{LabelId, Labels};
use crate::tree::{NodeId, OrderedTree};

/// Errors raised while reading an XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The document could not be read from disk.
    #[error("cannot read XML input: {0}")]
    Io(#[from] io::Error),
    /// The document is not well formed.
    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),
    /// A tag name is not valid UTF-8.
    #[error("tag name at element {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    /// The document contains no element at all.
    #[error("document has no root element")]
    NoRootElement,
    /// An element closed in the wrong place.
    #[error("unbalanced element nesting")]
    Unbalanced,
}

/// Parse an XML file into a tree, interning tag names into `labels`.
pub fn parse_file(
    path: impl AsRef<Path>,
    labels: &mut Labels,
) -> Result<(OrderedTree, Vec<LabelId>), XmlError> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, labels)
}

/// Parse an XML document into a tree plus its per-node label vector.
///
/// Nodes are allocated in document order, so node ids follow pre-order and
/// the root element becomes node 0.
pub fn parse_str(
    xml: &str,
    labels: &mut Labels,
) -> Result<(OrderedTree, Vec<LabelId>), XmlError> {
    let mut reader = Reader::from_str(xml);

    // Children are collected first and the edge array is built per parent
    // afterwards, keeping every run contiguous without relocations.
    let mut node_labels: Vec<LabelId> = Vec::new();
    let mut children: Vec<Vec<NodeId>> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut finished_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let node = new_element(
                    element.name().as_ref(),
                    labels,
                    &mut node_labels,
                    &mut children,
                    &stack,
                    finished_root,
                )?;
                stack.push(node);
            }
            Event::Empty(element) => {
                new_element(
                    element.name().as_ref(),
                    labels,
                    &mut node_labels,
                    &mut children,
                    &stack,
                    finished_root,
                )?;
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(XmlError::Unbalanced);
                }
                if stack.is_empty() {
                    finished_root = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Unbalanced);
    }
    if node_labels.is_empty() {
        return Err(XmlError::NoRootElement);
    }

    let mut tree = OrderedTree::with_capacity(node_labels.len());
    tree.add_nodes(node_labels.len());
    for (parent, kids) in children.iter().enumerate() {
        for &child in kids {
            tree.add_edge(parent, child);
        }
    }
    Ok((tree, node_labels))
}

fn new_element(
    name: &[u8],
    labels: &mut Labels,
    node_labels: &mut Vec<LabelId>,
    children: &mut Vec<Vec<NodeId>>,
    stack: &[NodeId],
    finished_root: bool,
) -> Result<NodeId, XmlError> {
    let node = node_labels.len();
    if stack.is_empty() && (node != 0 || finished_root) {
        // quick-xml reports documents with two roots as parse errors, but
        // bare fragments can get here.
        return Err(XmlError::Unbalanced);
    }
    let tag = std::str::from_utf8(name).map_err(|_| XmlError::InvalidUtf8(node))?;
    node_labels.push(labels.intern(tag));
    children.push(Vec::new());
    if let Some(&parent) = stack.last() {
        children[parent].push(node);
    }
    Ok(node)
}

/// Serialize a tree as indented XML, one element per node.
pub fn write_tree(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
    out: &mut impl Write,
) -> io::Result<()> {
    if tree.num_nodes() == 0 {
        return Ok(());
    }
    // Explicit stack of (node, depth, entered).
    let mut stack = vec![(0usize, 0usize, false)];
    while let Some((node, depth, entered)) = stack.pop() {
        let tag = labels.resolve(node_labels[node]);
        for _ in 0..depth {
            out.write_all(b"\t")?;
        }
        if entered {
            writeln!(out, "</{tag}>")?;
            continue;
        }
        writeln!(out, "<{tag}>")?;
        stack.push((node, depth, true));
        let children: Vec<_> = tree.children(node).collect();
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1, false));
        }
    }
    Ok(())
}

/// Serialize a tree as XML into a file.
pub fn write_tree_to_path(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
    path: impl AsRef<Path>,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_tree(tree, labels, node_labels, &mut out)?;
    out.flush()
}
