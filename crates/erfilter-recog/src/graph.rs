//! Sequence graph solver
//!
//! Resolves a text-line candidate into its most plausible character
//! sequence. Every surviving member becomes a graph node; edges run from a
//! node to the next distinct character position, with one parallel edge per
//! duplicate detection at that position. Edge weights come from the
//! transition table, node weights from the recognizer's confidence.
//!
//! # Scoring
//!
//! Nodes are visited in member order. A node not yet reached by any edge
//! starts at `confidence * char_weight`; each edge `j -> k` with weight `w`
//! relaxes
//!
//! ```text
//! score[k] = max(score[k], score[j] + w * edge_weight + confidence[k] * char_weight)
//! ```
//!
//! The best-scoring node is traced back through its predecessors to give
//! the left-to-right path.

use crate::error::{RecogError, RecogResult};
use crate::group::{TextLine, is_overlapping};
use crate::ocr::{Recognition, Recognizer};
use crate::table::TransitionTable;
use erfilter_core::GrayImage;
use erfilter_region::Region;
use rayon::prelude::*;
use tracing::debug;

/// Options for sequence solving
#[derive(Debug, Clone)]
pub struct SequenceOptions {
    /// Members recognized with a lower confidence are dropped (default: 0.1)
    pub min_confidence: f64,
    /// Lines with fewer surviving members are not resolved (default: 3)
    pub min_members: usize,
    /// Weight of a node's confidence (default: 10)
    pub char_weight: f64,
    /// Weight of a transition (default: 50)
    pub edge_weight: f64,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            min_members: 3,
            char_weight: 10.0,
            edge_weight: 50.0,
        }
    }
}

impl SequenceOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence floor
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Set the minimum member count
    pub fn with_min_members(mut self, members: usize) -> Self {
        self.min_members = members;
        self
    }

    /// Set the node and edge weights
    pub fn with_weights(mut self, char_weight: f64, edge_weight: f64) -> Self {
        self.char_weight = char_weight;
        self.edge_weight = edge_weight;
        self
    }

    /// Validate options
    pub fn validate(&self) -> RecogResult<()> {
        if !(0.0..1.0).contains(&self.min_confidence) {
            return Err(RecogError::InvalidParameter(format!(
                "min_confidence must be in [0, 1), got {}",
                self.min_confidence
            )));
        }
        if self.min_members == 0 {
            return Err(RecogError::InvalidParameter(
                "min_members must be at least 1".to_string(),
            ));
        }
        if self.char_weight < 0.0 || self.edge_weight < 0.0 {
            return Err(RecogError::InvalidParameter(
                "weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One node of a sequence graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Pool index of the member
    pub member: usize,
    /// Recognized character
    pub label: Option<char>,
    /// Recognizer confidence
    pub confidence: f64,
    /// Outgoing `(node index, transition weight)` pairs
    pub edges: Vec<(usize, f64)>,
}

impl GraphNode {
    /// Node without outgoing edges
    pub fn new(member: usize, label: Option<char>, confidence: f64) -> Self {
        Self {
            member,
            label,
            confidence,
            edges: Vec::new(),
        }
    }
}

/// Best path through a sequence graph
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePath {
    /// Node indices, left to right
    pub nodes: Vec<usize>,
    /// Score of the last node
    pub score: f64,
}

/// Solver bound to one transition table
#[derive(Debug, Clone)]
pub struct SequenceSolver<'a> {
    table: &'a TransitionTable,
    options: SequenceOptions,
}

impl<'a> SequenceSolver<'a> {
    /// Create a solver over `table`
    pub fn new(table: &'a TransitionTable, options: SequenceOptions) -> Self {
        Self { table, options }
    }

    /// Solving options
    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Recognize every member of `line` on its own channel.
    ///
    /// The recognizer runs in parallel over the members; results are
    /// collected first and then written to each region's `label` and
    /// `confidence`.
    ///
    /// # Errors
    ///
    /// Returns an error if a member's channel index has no image in
    /// `channels` or its bound lies outside that image.
    pub fn recognize_members<R: Recognizer>(
        &self,
        line: &TextLine,
        pool: &mut [Region],
        channels: &[GrayImage],
        recognizer: &R,
    ) -> RecogResult<()> {
        let shared: &[Region] = pool;
        let results = line
            .members
            .par_iter()
            .map(|&m| {
                let region = &shared[m];
                let channel = channels.get(region.channel).ok_or_else(|| {
                    RecogError::InvalidParameter(format!(
                        "region {m} refers to channel {} of {}",
                        region.channel,
                        channels.len()
                    ))
                })?;
                let crop = channel.crop(&region.bound)?;
                Ok((m, recognizer.recognize(&crop, line.angle)))
            })
            .collect::<RecogResult<Vec<(usize, Recognition)>>>()?;

        for (m, recognition) in results {
            pool[m].label = Some(recognition.label);
            pool[m].confidence = recognition.confidence;
        }
        Ok(())
    }

    /// Drop members recognized with too low a confidence.
    ///
    /// Returns whether enough members remain to resolve the line.
    pub fn prune(&self, line: &mut TextLine, pool: &[Region]) -> bool {
        line.members
            .retain(|&m| pool[m].confidence >= self.options.min_confidence);
        line.members.len() >= self.options.min_members
    }

    /// Build the sequence graph of `line`.
    ///
    /// For each member `j`, later members overlapping `j` are skipped. The
    /// first member that does not overlap `j` gets an edge and becomes the
    /// comparison member; following members overlapping the comparison
    /// member get parallel edges and take its place. The first member
    /// overlapping neither ends the scan.
    pub fn build_graph<R: Recognizer>(
        &self,
        line: &TextLine,
        pool: &[Region],
        recognizer: &R,
    ) -> Vec<GraphNode> {
        let members = &line.members;
        let mut graph: Vec<GraphNode> = members
            .iter()
            .map(|&m| GraphNode::new(m, pool[m].label, pool[m].confidence))
            .collect();
        let index_of = |node: &GraphNode| node.label.and_then(|c| recognizer.label_index(c));

        for j in 0..members.len() {
            let from = index_of(&graph[j]);
            let mut comparison: Option<usize> = None;

            for k in j + 1..members.len() {
                if is_overlapping(&pool[members[j]], &pool[members[k]]) {
                    continue;
                }
                let extends = match comparison {
                    None => true,
                    Some(c) => is_overlapping(&pool[members[c]], &pool[members[k]]),
                };
                if !extends {
                    break;
                }

                comparison = Some(k);
                let weight = self.table.weight(from, index_of(&graph[k]));
                graph[j].edges.push((k, weight));
            }
        }

        graph
    }

    /// Best-scoring path through `graph`, `None` if no node scores above 0
    pub fn solve(&self, graph: &[GraphNode]) -> Option<SequencePath> {
        let cw = self.options.char_weight;
        let ew = self.options.edge_weight;
        let mut score = vec![0.0f64; graph.len()];
        let mut previous: Vec<Option<usize>> = vec![None; graph.len()];

        for (j, node) in graph.iter().enumerate() {
            if previous[j].is_none() {
                score[j] = node.confidence * cw;
            }
            for &(adj, weight) in &node.edges {
                let candidate = score[j] + weight * ew + graph[adj].confidence * cw;
                if candidate > score[adj] {
                    score[adj] = candidate;
                    previous[adj] = Some(j);
                }
            }
        }

        let mut best: Option<usize> = None;
        let mut max = 0.0;
        for (j, &s) in score.iter().enumerate() {
            if s > max {
                max = s;
                best = Some(j);
            }
        }

        let mut nodes = Vec::new();
        let mut cursor = best;
        while let Some(j) = cursor {
            nodes.push(j);
            cursor = previous[j];
        }
        nodes.reverse();

        best.map(|_| SequencePath { nodes, score: max })
    }

    /// Resolve one line: recognize, prune, build, solve.
    ///
    /// On success the line's members are replaced by the best path, its
    /// bound and baseline are refitted, its word is assembled from the path
    /// labels and handed to [`Recognizer::verify`]. Returns the final word,
    /// or `None` when the line has nothing to emit.
    pub fn resolve<R: Recognizer>(
        &self,
        line: &mut TextLine,
        pool: &mut [Region],
        channels: &[GrayImage],
        recognizer: &R,
    ) -> RecogResult<Option<String>> {
        self.options.validate()?;

        self.recognize_members(line, pool, channels, recognizer)?;
        if !self.prune(line, pool) {
            debug!(members = line.members.len(), "line dropped after pruning");
            return Ok(None);
        }

        let graph = self.build_graph(line, pool, recognizer);
        let Some(path) = self.solve(&graph) else {
            debug!(nodes = graph.len(), "no scoring path");
            return Ok(None);
        };

        line.members = path.nodes.iter().map(|&n| graph[n].member).collect();
        line.word = path.nodes.iter().filter_map(|&n| graph[n].label).collect();
        line.refit(pool);
        recognizer.verify(line, pool);

        debug!(
            nodes = graph.len(),
            path = path.nodes.len(),
            score = path.score,
            word = %line.word,
            "line resolved"
        );
        Ok(Some(line.word.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(confidences: &[f64], weights: &[f64]) -> Vec<GraphNode> {
        confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut node = GraphNode::new(i, None, c);
                if let Some(&w) = weights.get(i) {
                    node.edges.push((i + 1, w));
                }
                node
            })
            .collect()
    }

    #[test]
    fn test_solve_three_node_chain() {
        let table = TransitionTable::new(1);
        let solver = SequenceSolver::new(&table, SequenceOptions::default());
        let path = solver.solve(&chain(&[0.8, 0.2, 0.9], &[0.9, 0.1])).unwrap();
        assert_eq!(path.nodes, vec![0, 1, 2]);
        // 0.8*10 = 8; 8 + 0.9*50 + 0.2*10 = 55; 55 + 0.1*50 + 0.9*10 = 69
        assert!((path.score - 69.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_parallel_edges_pick_best() {
        let table = TransitionTable::new(1);
        let solver = SequenceSolver::new(&table, SequenceOptions::default());
        // Node 0 -> {1, 2} (duplicates at one position) -> 3
        let mut graph = vec![
            GraphNode::new(0, None, 0.5),
            GraphNode::new(1, None, 0.3),
            GraphNode::new(2, None, 0.9),
            GraphNode::new(3, None, 0.5),
        ];
        graph[0].edges = vec![(1, 0.5), (2, 0.5)];
        graph[1].edges = vec![(3, 0.5)];
        graph[2].edges = vec![(3, 0.5)];
        let path = solver.solve(&graph).unwrap();
        assert_eq!(path.nodes, vec![0, 2, 3]);
    }

    #[test]
    fn test_solve_nothing_positive() {
        let table = TransitionTable::new(1);
        let solver = SequenceSolver::new(&table, SequenceOptions::default());
        assert_eq!(solver.solve(&chain(&[0.0, 0.0], &[0.0])), None);
        assert_eq!(solver.solve(&[]), None);
    }

    #[test]
    fn test_validate() {
        assert!(SequenceOptions::new().with_min_confidence(1.0).validate().is_err());
        assert!(SequenceOptions::new().with_min_members(0).validate().is_err());
        assert!(SequenceOptions::new().with_weights(-1.0, 1.0).validate().is_err());
        assert!(SequenceOptions::new().validate().is_ok());
    }
}
