// ── Links ──

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};

/// Role of a link in the graph.
///
/// `InterfaceRule` / `RuleInterface` are traffic edges between layer 0
/// and the rule layer. `Input` / `Output` / `Forward` are structural
/// edges (containment and jumps) tagged with the direction role of the
/// chain that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    InterfaceRule,
    RuleInterface,
    Input,
    Output,
    Forward,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InterfaceRule => "interface_rule",
            Self::RuleInterface => "rule_interface",
            Self::Input => "input",
            Self::Output => "output",
            Self::Forward => "forward",
        }
    }
}

/// One directed edge of the topology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyLink {
    /// `link_{source}_to_{target}`.
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Jump link whose target chain does not exist in this graph.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dangling: bool,
}

impl TopologyLink {
    pub fn new(source: NodeId, target: NodeId, kind: LinkKind) -> Self {
        Self {
            id: format!("link_{source}_to_{target}"),
            source,
            target,
            kind,
            label: None,
            protocol: None,
            port: None,
            action: None,
            dangling: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_protocol(mut self, protocol: Option<String>) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: Option<String>) -> Self {
        self.port = port;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn dangling(mut self) -> Self {
        self.dangling = true;
        self
    }
}
