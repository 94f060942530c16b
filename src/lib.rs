//! # Top DAG tree compression
//!
//! Compresses ordered, node-labeled trees (typically XML element trees)
//! into a *Top DAG*: a directed acyclic graph sharing identical repeated
//! substructures. The pipeline runs in two stages and both invert:
//!
//! 1. **Top tree construction**: the tree is contracted round by round
//!    (adjacent siblings merge horizontally, single-child chains merge
//!    vertically) until one node remains. Every merge becomes a binary
//!    cluster; the merge hierarchy is the top tree.
//! 2. **DAG folding**: structurally identical cluster subtrees are
//!    hash-consed into one shared DAG node each.
//!
//! The compressed form supports lossless unpacking and direct navigation
//! (parent, first child, next sibling) without decompression.
//!
//! ## Usage
//!
//! ```
//! use topdag::{Compressor, CompressionConfig, Labels};
//!
//! let mut labels = Labels::new();
//! let (tree, node_labels) =
//!     topdag::xml::parse_str("<r><a/><a/></r>", &mut labels).unwrap();
//!
//! let compressor = Compressor::new(CompressionConfig::default());
//! let compressed = compressor.compress(tree, &node_labels).unwrap();
//! let (restored, restored_labels) = compressor.decompress(&compressed.dag).unwrap();
//! assert_eq!(restored_labels.len(), node_labels.len());
//! assert_eq!(restored.num_nodes(), 3);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod bp;
pub mod dag;
pub mod dot;
pub mod estimation;
pub mod huffman;
pub mod labels;
pub mod random;
pub mod stats;
pub mod toptree;
pub mod tree;
pub mod util;
pub mod xml;

pub use dag::{BinaryDag, DagBuilder, DagNode, DagUnpacker, Navigator};
pub use labels::{LabelId, Labels};
pub use stats::{DebugInfo, StatWriter, Statistics};
pub use toptree::{
    Cluster, MergeType, RePairConstructor, TopTree, TopTreeConstructor, TopTreeUnpacker,
};
pub use tree::OrderedTree;

use thiserror::Error;
use util::Timer;

/// Configuration of one compression run.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Use the RePair-aware constructor instead of the greedy one.
    pub use_repair: bool,
    /// Minimum per-round edge ratio targeted by the RePair variant.
    pub min_ratio: f64,
    /// Print per-round progress to stderr.
    pub verbose: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            use_repair: false,
            min_ratio: 1.22,
            verbose: false,
        }
    }
}

/// Errors of the compression pipeline.
///
/// Navigation failures are not errors; the [`Navigator`] reports them as
/// `false` returns.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The input tree holds no node at all.
    #[error("cannot compress an empty tree")]
    EmptyTree,
    /// The per-node label vector does not cover the tree.
    #[error("tree has {nodes} nodes but {labels} labels")]
    LabelCountMismatch {
        /// Number of tree nodes.
        nodes: usize,
        /// Number of per-node labels supplied.
        labels: usize,
    },
    /// A constructor round failed to remove any edge; the input violates
    /// the ordered-tree invariants.
    #[error("constructor made no progress in round {round} ({edges} edges left)")]
    StalledRound {
        /// Index of the stalled round.
        round: usize,
        /// Live edges when the round stalled.
        edges: usize,
    },
    /// Unpacking was asked to expand an empty top tree.
    #[error("cannot unpack an empty top tree")]
    EmptyTopTree,
    /// Unpacking was asked to expand a DAG holding only the sentinel.
    #[error("cannot unpack an empty DAG")]
    EmptyDag,
}

/// Result of compressing one tree.
#[derive(Debug)]
pub struct Compression {
    /// The merge hierarchy the DAG was folded from.
    pub top_tree: TopTree,
    /// The shared form: the compressed artifact, together with the labels.
    pub dag: BinaryDag,
    /// Stage timings and per-round edge ratios.
    pub debug: DebugInfo,
}

/// Orchestrates the compression pipeline and its inverse.
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    /// Create a compressor with the given configuration.
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// Compress `tree`, consuming it destructively.
    ///
    /// `node_labels` maps every node id to its label. The returned
    /// [`Compression`] carries the DAG, the intermediate top tree and the
    /// collected [`DebugInfo`].
    pub fn compress(
        &self,
        mut tree: OrderedTree,
        node_labels: &[LabelId],
    ) -> Result<Compression, CompressionError> {
        if tree.num_nodes() == 0 {
            return Err(CompressionError::EmptyTree);
        }
        if tree.num_nodes() != node_labels.len() {
            return Err(CompressionError::LabelCountMismatch {
                nodes: tree.num_nodes(),
                labels: node_labels.len(),
            });
        }

        let mut debug = DebugInfo {
            height: tree.height(),
            avg_depth: tree.avg_depth(),
            ..DebugInfo::default()
        };

        let mut timer = Timer::new();
        let mut top_tree = TopTree::new(node_labels);
        if self.config.use_repair {
            RePairConstructor::new(&mut tree, &mut top_tree, self.config.min_ratio)
                .verbose(self.config.verbose)
                .construct(&mut debug)?;
        } else {
            TopTreeConstructor::new(&mut tree, &mut top_tree)
                .verbose(self.config.verbose)
                .construct(&mut debug)?;
        }
        debug.merge_duration = timer.get_and_reset();

        let mut dag = BinaryDag::with_capacity(top_tree.len() / 2);
        DagBuilder::new(&top_tree, &mut dag).build();
        debug.dag_duration = timer.elapsed_millis();
        debug.num_dag_nodes = dag.num_nodes();
        debug.num_dag_edges = dag.count_edges();

        Ok(Compression {
            top_tree,
            dag,
            debug,
        })
    }

    /// Rebuild the original tree and label vector from a DAG.
    pub fn decompress(
        &self,
        dag: &BinaryDag,
    ) -> Result<(OrderedTree, Vec<LabelId>), CompressionError> {
        let mut top_tree = TopTree::empty();
        DagUnpacker::new(dag, &mut top_tree).unpack()?;

        let mut tree = OrderedTree::new();
        let mut node_labels = Vec::new();
        TopTreeUnpacker::new(&top_tree, &mut tree, &mut node_labels).unpack()?;
        Ok((tree, node_labels))
    }
}
