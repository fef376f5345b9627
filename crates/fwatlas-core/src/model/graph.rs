// ── Graph container and summaries ──

use crate::model::flow::FlowPath;
use crate::model::link::TopologyLink;
use crate::model::node::{NodeId, TopologyNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Non-fatal oddity observed while building a graph.
///
/// Warnings ride along on the graph instead of failing the build; a
/// half-torn-down Docker network should degrade the picture, not blank it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum InconsistencyWarning {
    /// A rule jumps to a chain that does not exist in its table.
    DanglingJumpTarget {
        table: String,
        chain: String,
        target: String,
    },
    /// A rule names an interface no interface snapshot covers.
    UnresolvedInterface {
        rule: NodeId,
        interface: String,
    },
}

/// The complete synthesized topology: one immutable build artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<TopologyLink>,
    pub flows: Vec<FlowPath>,
    pub warnings: Vec<InconsistencyWarning>,
    pub generated_at: DateTime<Utc>,
}

impl TopologyGraph {
    /// Empty graph stamped now. Valid output for empty host state.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            flows: Vec::new(),
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Set of all node ids present in the graph.
    pub fn node_ids(&self) -> HashSet<&NodeId> {
        self.nodes.iter().map(|node| &node.id).collect()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|node| &node.id == id)
    }
}

/// Summary counts over one graph.
///
/// Maps are ordered so serialized stats are stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyStats {
    pub total_nodes: usize,
    pub total_links: usize,
    pub total_flows: usize,
    /// Node tally per kind name (`interface`, `table`, `chain`, `rule`).
    pub node_kinds: BTreeMap<String, usize>,
    /// Rule tally per chain name.
    pub chain_kinds: BTreeMap<String, usize>,
    /// Interface tally per interface kind.
    pub interface_kinds: BTreeMap<String, usize>,
    /// Copied from the summarized graph, so consumers can correlate.
    pub generated_at: DateTime<Utc>,
}
