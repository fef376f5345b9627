// ── Flow paths ──

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};

/// Traffic direction a flow path represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Input,
    Output,
    Forward,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Forward => "forward",
        }
    }

    /// Display color consumers render the flow with.
    pub fn color(self) -> &'static str {
        match self {
            Self::Input => "#4CAF50",
            Self::Output => "#2196F3",
            Self::Forward => "#FF9800",
        }
    }
}

/// One reconstructed end-to-end traversal: ingress interface, the rules
/// and chains the packet would visit, and optionally an egress interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPath {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: FlowKind,
    /// Ordered node ids forming a connected walk in the same graph.
    pub path: Vec<NodeId>,
    pub color: String,
}
