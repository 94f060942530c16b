//! Run statistics: per-run debug info, multi-run aggregation, and
//! lock-protected file sinks.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

/// Measurements of one compression run.
///
/// Durations are in milliseconds; edge ratios accumulate one entry per
/// constructor round.
#[derive(Debug, Clone)]
pub struct DebugInfo {
    /// Time spent generating or parsing the input tree.
    pub generation_duration: f64,
    /// Time spent constructing the top tree.
    pub merge_duration: f64,
    /// Time spent folding the top tree into its DAG.
    pub dag_duration: f64,
    /// Smallest per-round edge ratio seen.
    pub min_edge_ratio: f64,
    /// Largest per-round edge ratio seen.
    pub max_edge_ratio: f64,
    /// Sum of all per-round edge ratios.
    pub edge_ratio_sum: f64,
    /// Number of ratios accumulated in [`edge_ratio_sum`].
    ///
    /// [`edge_ratio_sum`]: DebugInfo::edge_ratio_sum
    pub num_edge_ratios: usize,
    /// The individual per-round ratios, in round order.
    pub edge_ratios: Vec<f64>,
    /// Edges of the final DAG.
    pub num_dag_edges: usize,
    /// Non-sentinel nodes of the final DAG.
    pub num_dag_nodes: usize,
    /// Height of the input tree.
    pub height: usize,
    /// Average node depth of the input tree.
    pub avg_depth: f64,
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self {
            generation_duration: 0.0,
            merge_duration: 0.0,
            dag_duration: 0.0,
            min_edge_ratio: f64::INFINITY,
            max_edge_ratio: 0.0,
            edge_ratio_sum: 0.0,
            num_edge_ratios: 0,
            edge_ratios: Vec::new(),
            num_dag_edges: 0,
            num_dag_nodes: 0,
            height: 0,
            avg_depth: 0.0,
        }
    }
}

impl DebugInfo {
    /// Total time of the relevant pipeline stages.
    pub fn total_duration(&self) -> f64 {
        self.generation_duration + self.merge_duration + self.dag_duration
    }

    /// Record the edge ratio of one constructor round.
    pub fn add_edge_ratio(&mut self, ratio: f64) {
        self.edge_ratios.push(ratio);
        self.num_edge_ratios += 1;
        self.edge_ratio_sum += ratio;
        if ratio < self.min_edge_ratio {
            self.min_edge_ratio = ratio;
        }
        if ratio > self.max_edge_ratio {
            self.max_edge_ratio = ratio;
        }
    }

    /// Mean of the recorded edge ratios, 0 when none were recorded.
    pub fn avg_edge_ratio(&self) -> f64 {
        if self.num_edge_ratios == 0 {
            0.0
        } else {
            self.edge_ratio_sum / self.num_edge_ratios as f64
        }
    }

    /// Element-wise accumulation, for averaging over runs.
    pub fn add(&mut self, other: &DebugInfo) {
        self.generation_duration += other.generation_duration;
        self.merge_duration += other.merge_duration;
        self.dag_duration += other.dag_duration;
        self.edge_ratio_sum += other.edge_ratio_sum;
        self.num_edge_ratios += other.num_edge_ratios;
        self.edge_ratios.extend_from_slice(&other.edge_ratios);
        self.num_dag_edges += other.num_dag_edges;
        self.num_dag_nodes += other.num_dag_nodes;
        self.height += other.height;
        self.avg_depth += other.avg_depth;
    }

    /// Element-wise minimum in place.
    pub fn min(&mut self, other: &DebugInfo) {
        self.generation_duration = self.generation_duration.min(other.generation_duration);
        self.merge_duration = self.merge_duration.min(other.merge_duration);
        self.dag_duration = self.dag_duration.min(other.dag_duration);
        self.min_edge_ratio = self.min_edge_ratio.min(other.min_edge_ratio);
        self.num_dag_edges = self.num_dag_edges.min(other.num_dag_edges);
        self.num_dag_nodes = self.num_dag_nodes.min(other.num_dag_nodes);
        self.height = self.height.min(other.height);
        self.avg_depth = self.avg_depth.min(other.avg_depth);
    }

    /// Element-wise maximum in place.
    pub fn max(&mut self, other: &DebugInfo) {
        self.generation_duration = self.generation_duration.max(other.generation_duration);
        self.merge_duration = self.merge_duration.max(other.merge_duration);
        self.dag_duration = self.dag_duration.max(other.dag_duration);
        self.max_edge_ratio = self.max_edge_ratio.max(other.max_edge_ratio);
        self.num_dag_edges = self.num_dag_edges.max(other.num_dag_edges);
        self.num_dag_nodes = self.num_dag_nodes.max(other.num_dag_nodes);
        self.height = self.height.max(other.height);
        self.avg_depth = self.avg_depth.max(other.avg_depth);
    }

    /// Divide the accumulating fields for aggregation.
    pub fn divide(&mut self, factor: usize) {
        let factor = factor.max(1);
        self.generation_duration /= factor as f64;
        self.merge_duration /= factor as f64;
        self.dag_duration /= factor as f64;
        self.num_dag_edges /= factor;
        self.num_dag_nodes /= factor;
        self.height /= factor;
        self.avg_depth /= factor as f64;
    }

    /// Write one tab-separated row matching [`dump_header`].
    ///
    /// [`dump_header`]: DebugInfo::dump_header
    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.total_duration(),
            self.generation_duration,
            self.merge_duration,
            self.dag_duration,
            self.min_edge_ratio,
            self.max_edge_ratio,
            self.avg_edge_ratio(),
            self.num_dag_edges,
            self.num_dag_nodes,
            self.height,
            self.avg_depth
        )
    }

    /// Write the tab-separated header row.
    pub fn dump_header(out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "totalDuration\tgenerationDuration\tmergeDuration\tdagDuration\tminEdgeRatio\t\
             maxEdgeRatio\tavgEdgeRatio\tnumDagEdges\tnumDagNodes\theight\tavgDepth"
        )
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut row = Vec::new();
        self.dump(&mut row).map_err(|_| fmt::Error)?;
        f.write_str(String::from_utf8_lossy(&row).trim_end())
    }
}

/// Lock-protected line sink for statistics files.
///
/// The only component meant to be shared across threads. Writes are
/// silently dropped while no file is open, so collectors can stay
/// unconditional.
#[derive(Debug, Default)]
pub struct StatWriter {
    out: Mutex<Option<BufWriter<File>>>,
}

impl StatWriter {
    /// Create a writer with no open file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` for writing, replacing any previously open file.
    pub fn open(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = BufWriter::new(File::create(path)?);
        *self.out.lock() = Some(file);
        Ok(())
    }

    /// Flush and close the current file, if any.
    pub fn close(&self) {
        let mut guard = self.out.lock();
        if let Some(mut file) = guard.take() {
            let _ = file.flush();
        }
    }

    /// Write one line; dropped when no file is open.
    pub fn write_line(&self, line: impl fmt::Display) {
        let mut guard = self.out.lock();
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{line}");
        }
    }
}

impl Drop for StatWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Aggregator over many [`DebugInfo`] runs.
#[derive(Debug, Default)]
pub struct Statistics {
    /// Element-wise minimum over all runs.
    pub min: DebugInfo,
    /// Element-wise maximum over all runs.
    pub max: DebugInfo,
    /// Element-wise mean after [`compute`].
    ///
    /// [`compute`]: Statistics::compute
    pub avg: DebugInfo,
    num_runs: usize,
    edge_ratio_writer: StatWriter,
    debug_info_writer: StatWriter,
}

impl Statistics {
    /// Create an aggregator without file sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route per-round edge ratios into `path`, one per line.
    pub fn write_edge_ratios_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.edge_ratio_writer.open(path)
    }

    /// Route per-run debug rows into `path`, with a header.
    pub fn write_debug_info_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.debug_info_writer.open(path)?;
        let mut header = Vec::new();
        DebugInfo::dump_header(&mut header).expect("in-memory write");
        self.debug_info_writer
            .write_line(String::from_utf8_lossy(&header).trim_end());
        Ok(())
    }

    /// Fold one run into the aggregate.
    pub fn add_debug_info(&mut self, info: &DebugInfo) {
        if self.num_runs == 0 {
            self.min = info.clone();
            self.max = info.clone();
            self.avg = info.clone();
        } else {
            self.min.min(info);
            self.max.max(info);
            self.avg.add(info);
        }
        for &ratio in &info.edge_ratios {
            self.edge_ratio_writer.write_line(ratio);
        }
        self.debug_info_writer.write_line(info);
        self.num_runs += 1;
    }

    /// Number of runs folded in so far.
    pub fn num_runs(&self) -> usize {
        self.num_runs
    }

    /// Finalize the average; call once after the last run.
    pub fn compute(&mut self) {
        self.avg.divide(self.num_runs);
    }

    /// Human-readable aggregate summary.
    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Statistics over {} runs:", self.num_runs)?;
        writeln!(
            out,
            "Total duration p. tree: {:.2}ms (avg), {:.2}ms (min), {:.2}ms (max)",
            self.avg.total_duration(),
            self.min.total_duration(),
            self.max.total_duration()
        )?;
        writeln!(
            out,
            "Tree generation:        {:.2}ms (avg), {:.2}ms (min), {:.2}ms (max)",
            self.avg.generation_duration, self.min.generation_duration, self.max.generation_duration
        )?;
        writeln!(
            out,
            "Top tree construction:  {:.2}ms (avg), {:.2}ms (min), {:.2}ms (max)",
            self.avg.merge_duration, self.min.merge_duration, self.max.merge_duration
        )?;
        writeln!(
            out,
            "Top DAG compression:    {:.2}ms (avg), {:.2}ms (min), {:.2}ms (max)",
            self.avg.dag_duration, self.min.dag_duration, self.max.dag_duration
        )?;
        writeln!(
            out,
            "Edge comp. ratio: {:.6} (avg), {:.6} (min), {:.6} (max)",
            self.avg.avg_edge_ratio(),
            self.min.min_edge_ratio,
            self.max.max_edge_ratio
        )?;
        writeln!(
            out,
            "DAG edges: {} (avg), {} (min), {} (max)",
            self.avg.num_dag_edges, self.min.num_dag_edges, self.max.num_dag_edges
        )?;
        writeln!(
            out,
            "DAG nodes: {} (avg), {} (min), {} (max)",
            self.avg.num_dag_nodes, self.min.num_dag_nodes, self.max.num_dag_nodes
        )?;
        writeln!(
            out,
            "Tree height:    {} (avg), {} (min), {} (max)",
            self.avg.height, self.min.height, self.max.height
        )?;
        writeln!(
            out,
            "Avg node depth: {:.2} (avg), {:.2} (min), {:.2} (max)",
            self.avg.avg_depth, self.min.avg_depth, self.max.avg_depth
        )
    }
}
