// ── Node identity and node types ──
//
// NodeId is the stable contract with consumers: derived purely from the
// entity's kind and natural key, so the same host state always yields
// the same ids across rebuilds.

use fwatlas_collect::{ChainPolicy, DockerKind, InterfaceKind};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── NodeId ──────────────────────────────────────────────────────────

/// Deterministic identifier of a topology node.
///
/// `interface_{name}`, `table_{table}`, `chain_{table}_{chain}`,
/// `rule_{table}_{chain}_{position}`. The chain and rule forms carry the
/// owning table so duplicate chain names across tables stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn interface(name: &str) -> Self {
        Self(format!("interface_{name}"))
    }

    pub fn table(table: &str) -> Self {
        Self(format!("table_{table}"))
    }

    pub fn chain(table: &str, chain: &str) -> Self {
        Self(format!("chain_{table}_{chain}"))
    }

    pub fn rule(table: &str, chain: &str, position: u32) -> Self {
        Self(format!("rule_{table}_{chain}_{position}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Position / layers ───────────────────────────────────────────────

/// Cosmetic layout coordinates. Deterministic per build, carried for
/// consumers that render without their own layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

const X_SPACING: i32 = 160;
const LAYER_SPACING: i32 = 140;

impl Position {
    /// Slot `index` within `layer`: evenly spaced along x, y fixed per layer.
    pub fn at(layer: u8, index: usize) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let x = (index as i32) * X_SPACING;
        Self { x, y: i32::from(layer) * LAYER_SPACING }
    }
}

// ── NodeKind ────────────────────────────────────────────────────────

/// Kind-specific payload of a node, as a closed tagged union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Interface {
        name: String,
        interface_kind: InterfaceKind,
        state: String,
        docker: Option<DockerKind>,
    },
    Table {
        name: String,
        chain_count: usize,
    },
    Chain {
        table: String,
        name: String,
        policy: Option<ChainPolicy>,
        rule_count: usize,
        packets: u64,
        bytes: u64,
    },
    Rule {
        table: String,
        chain: String,
        /// Serialized as `rule_number`: the node's own `position` field
        /// is the layout coordinate, and flattening must not collide.
        #[serde(rename = "rule_number")]
        position: u32,
        target: String,
        protocol: Option<String>,
        packets: u64,
        bytes: u64,
    },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Interface { .. } => "interface",
            Self::Table { .. } => "table",
            Self::Chain { .. } => "chain",
            Self::Rule { .. } => "rule",
        }
    }

    /// Topological depth: interfaces 0, tables 1, chains 2, rules 3.
    pub fn layer(&self) -> u8 {
        match self {
            Self::Interface { .. } => 0,
            Self::Table { .. } => 1,
            Self::Chain { .. } => 2,
            Self::Rule { .. } => 3,
        }
    }
}

// ── TopologyNode ────────────────────────────────────────────────────

/// One node of the topology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: NodeId,
    pub label: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub position: Position,
    pub layer: u8,
}

impl TopologyNode {
    pub fn new(id: NodeId, label: impl Into<String>, kind: NodeKind, index: usize) -> Self {
        let layer = kind.layer();
        Self {
            id,
            label: label.into(),
            position: Position::at(layer, index),
            layer,
            kind,
        }
    }
}
