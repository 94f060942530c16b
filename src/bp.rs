//! Balanced-parenthesis tree codec.
//!
//! A pre-order traversal writes one bit per event: 1 entering a node, 0
//! leaving it. Labels travel in a separate byte stream, one length-prefixed
//! UTF-8 entry per node in pre-order. The two streams round-trip to a tree
//! isomorphic to the input.

use bitvec::prelude::*;
use thiserror::Error;

use crate::labels::{LabelId, Labels};
use crate::tree::OrderedTree;

/// Errors raised while decoding a balanced-parenthesis string.
#[derive(Debug, Error)]
pub enum BpError {
    /// A close bit appeared with no matching open bit.
    #[error("unbalanced parenthesis string at bit {0}")]
    Unbalanced(usize),
    /// The string closed the root before its end, or never closed it.
    #[error("parenthesis string does not describe a single tree")]
    NotATree,
    /// The label stream ended before every node got a label.
    #[error("label stream exhausted at node {0}")]
    TruncatedLabels(usize),
    /// A label entry is not valid UTF-8.
    #[error("label of node {0} is not valid UTF-8")]
    InvalidUtf8(usize),
}

/// Encode a tree into its parenthesis bit string and label byte stream.
pub fn from_tree(
    tree: &OrderedTree,
    labels: &Labels,
    node_labels: &[LabelId],
) -> (BitVec, Vec<u8>) {
    let mut bits = BitVec::with_capacity(2 * tree.num_nodes());
    let mut label_bytes = Vec::new();
    if tree.num_nodes() == 0 {
        return (bits, label_bytes);
    }

    // Explicit stack: entries are (node, entered).
    let mut stack = vec![(0usize, false)];
    while let Some((node, entered)) = stack.pop() {
        if entered {
            bits.push(false);
            continue;
        }
        bits.push(true);
        let name = labels.resolve(node_labels[node]);
        label_bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        label_bytes.extend_from_slice(name.as_bytes());

        stack.push((node, true));
        let children: Vec<_> = tree.children(node).collect();
        for child in children.into_iter().rev() {
            stack.push((child, false));
        }
    }
    (bits, label_bytes)
}

/// Decode the two streams back into a tree, a fresh label store and the
/// per-node label vector.
pub fn to_tree(
    bits: &BitSlice,
    label_bytes: &[u8],
) -> Result<(OrderedTree, Labels, Vec<LabelId>), BpError> {
    let mut tree = OrderedTree::new();
    let mut labels = Labels::new();
    let mut node_labels = Vec::new();

    let mut stack: Vec<usize> = Vec::new();
    let mut cursor = 0usize;
    let mut closed_root = false;

    for (position, bit) in bits.iter().by_vals().enumerate() {
        if bit {
            if closed_root {
                return Err(BpError::NotATree);
            }
            let node = tree.add_node();
            let name = next_label(label_bytes, &mut cursor, node)?;
            node_labels.push(labels.intern(&name));
            if let Some(&parent) = stack.last() {
                tree.add_edge(parent, node);
            } else if node != 0 {
                return Err(BpError::NotATree);
            }
            stack.push(node);
        } else {
            if stack.pop().is_none() {
                return Err(BpError::Unbalanced(position));
            }
            if stack.is_empty() {
                closed_root = true;
            }
        }
    }

    if !stack.is_empty() || tree.num_nodes() == 0 {
        return Err(BpError::NotATree);
    }
    Ok((tree, labels, node_labels))
}

fn next_label(bytes: &[u8], cursor: &mut usize, node: usize) -> Result<String, BpError> {
    let len_end = *cursor + 4;
    if len_end > bytes.len() {
        return Err(BpError::TruncatedLabels(node));
    }
    let len = u32::from_le_bytes(bytes[*cursor..len_end].try_into().expect("4-byte slice")) as usize;
    let end = len_end + len;
    if end > bytes.len() {
        return Err(BpError::TruncatedLabels(node));
    }
    let name = std::str::from_utf8(&bytes[len_end..end])
        .map_err(|_| BpError::InvalidUtf8(node))?
        .to_string();
    *cursor = end;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (OrderedTree, Labels, Vec<LabelId>) {
        let mut tree = OrderedTree::new();
        tree.add_nodes(5);
        tree.add_edge(0, 1);
        tree.add_edge(0, 2);
        tree.add_edge(2, 3);
        tree.add_edge(2, 4);
        let mut labels = Labels::new();
        let r = labels.intern("r");
        let a = labels.intern("a");
        let b = labels.intern("b");
        (tree, labels, vec![r, a, b, a, r])
    }

    #[test]
    fn emits_one_pair_per_node() {
        let (tree, labels, node_labels) = sample();
        let (bits, _) = from_tree(&tree, &labels, &node_labels);
        assert_eq!(bits.len(), 2 * tree.num_nodes());
        assert_eq!(bits.count_ones(), tree.num_nodes());
        // pre-order of the sample: ( ( ) ( ( ) ( ) ) )
        let rendered: String = bits
            .iter()
            .by_vals()
            .map(|bit| if bit { '(' } else { ')' })
            .collect();
        assert_eq!(rendered, "(()(()()))");
    }

    #[test]
    fn roundtrip_preserves_structure_and_labels() {
        let (tree, labels, node_labels) = sample();
        let (bits, label_bytes) = from_tree(&tree, &labels, &node_labels);
        let (rebuilt, rebuilt_store, rebuilt_labels) = to_tree(&bits, &label_bytes).unwrap();

        assert_eq!(rebuilt.num_nodes(), tree.num_nodes());
        assert_eq!(rebuilt.num_edges(), tree.num_edges());
        for node in 0..tree.num_nodes() {
            assert_eq!(
                rebuilt_store.resolve(rebuilt_labels[node]),
                labels.resolve(node_labels[node])
            );
            assert_eq!(
                rebuilt.children(node).collect::<Vec<_>>(),
                tree.children(node).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        let (tree, labels, node_labels) = sample();
        let (bits, label_bytes) = from_tree(&tree, &labels, &node_labels);

        let mut unbalanced = bits.clone();
        unbalanced.pop();
        assert!(to_tree(&unbalanced, &label_bytes).is_err());

        let mut truncated = label_bytes.clone();
        truncated.truncate(truncated.len() - 1);
        assert!(matches!(
            to_tree(&bits, &truncated),
            Err(BpError::TruncatedLabels(_))
        ));
    }
}
