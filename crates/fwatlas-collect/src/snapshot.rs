// ── Snapshot types ──
//
// Plain-data views of host firewall and interface state as a collector
// observed it at one instant. Immutable once captured; the graph builder
// consumes these without ever touching the host.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Interfaces ──────────────────────────────────────────────────────

/// Broad classification of a network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    Physical,
    Virtual,
    Bridge,
}

impl InterfaceKind {
    /// Classify an interface by its kernel name.
    pub fn classify(name: &str) -> Self {
        if name == "docker0" || name.starts_with("br-") {
            Self::Bridge
        } else if name.starts_with("eth")
            || name.starts_with("en")
            || name.starts_with("wl")
            || name.starts_with("ww")
        {
            Self::Physical
        } else {
            Self::Virtual
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Virtual => "virtual",
            Self::Bridge => "bridge",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Docker-managed interface classification, derived from the kernel
/// naming conventions Docker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockerKind {
    /// The default `docker0`-style bridge (`docker<N>`).
    DefaultBridge,
    /// A user-defined network bridge (`br-<12 hex chars>`).
    UserBridge,
    /// A container-side veth peer (`veth<hex>`).
    Veth,
}

impl DockerKind {
    /// Classify an interface name, or `None` when Docker did not name it.
    pub fn classify(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("docker") {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Some(Self::DefaultBridge);
            }
        }
        if let Some(rest) = name.strip_prefix("br-") {
            if rest.len() == 12 && rest.bytes().all(is_lower_hex) {
                return Some(Self::UserBridge);
            }
        }
        if let Some(rest) = name.strip_prefix("veth") {
            if !rest.is_empty() && rest.bytes().all(is_lower_hex) {
                return Some(Self::Veth);
            }
        }
        None
    }
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// Traffic counters for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// Point-in-time view of one network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    pub name: String,
    pub kind: InterfaceKind,
    /// Operational state as the host rendered it (`UP`, `DOWN`, ...).
    pub state: String,
    pub mac: Option<String>,
    pub mtu: u32,
    pub is_up: bool,
    pub docker: Option<DockerKind>,
    /// Assigned addresses in CIDR notation.
    pub addresses: Vec<String>,
    pub counters: InterfaceCounters,
}

impl InterfaceSnapshot {
    /// Minimal snapshot with kind and Docker role classified from the name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: InterfaceKind::classify(&name),
            state: "UP".to_owned(),
            mac: None,
            mtu: 1500,
            is_up: true,
            docker: DockerKind::classify(&name),
            addresses: Vec::new(),
            counters: InterfaceCounters::default(),
            name,
        }
    }
}

// ── Tables, chains, rules ───────────────────────────────────────────

/// Default verdict of a built-in chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainPolicy {
    Accept,
    Drop,
}

impl ChainPolicy {
    /// Parse the policy token from a chain header, e.g. `ACCEPT` out of
    /// `Chain INPUT (policy ACCEPT 12 packets, 1024 bytes)`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ACCEPT" => Some(Self::Accept),
            "DROP" => Some(Self::Drop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Drop => "DROP",
        }
    }
}

impl fmt::Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disposition a rule applies on match.
///
/// Any target token that is not a known verdict or NAT action is treated
/// as a jump to the chain of that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleTarget {
    Accept,
    Drop,
    Reject,
    Log,
    Return,
    Masquerade,
    Dnat,
    Snat,
    Redirect,
    Jump(String),
}

impl RuleTarget {
    /// Parse the raw target token of a rule line.
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "ACCEPT" => Self::Accept,
            "DROP" => Self::Drop,
            "REJECT" => Self::Reject,
            "LOG" => Self::Log,
            "RETURN" => Self::Return,
            "MASQUERADE" => Self::Masquerade,
            "DNAT" => Self::Dnat,
            "SNAT" => Self::Snat,
            "REDIRECT" => Self::Redirect,
            _ => Self::Jump(token.to_owned()),
        }
    }

    /// Canonical tag for filtering and display grouping.
    pub fn tag(&self) -> &str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Drop => "DROP",
            Self::Reject => "REJECT",
            Self::Log => "LOG",
            Self::Return => "RETURN",
            Self::Masquerade => "MASQUERADE",
            Self::Dnat => "DNAT",
            Self::Snat => "SNAT",
            Self::Redirect => "REDIRECT",
            Self::Jump(_) => "JUMP",
        }
    }

    /// Verdicts that end packet evaluation outright.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accept | Self::Drop | Self::Reject)
    }

    /// Pure accounting actions that never alter the packet's fate.
    pub fn is_accounting(&self) -> bool {
        matches!(self, Self::Log)
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jump(chain) => f.write_str(chain),
            other => f.write_str(other.tag()),
        }
    }
}

/// One match-and-action entry within a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    /// 1-based evaluation position within the owning chain.
    pub position: u32,
    pub target: RuleTarget,
    pub protocol: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub source_port: Option<String>,
    pub destination_port: Option<String>,
    pub interface_in: Option<String>,
    pub interface_out: Option<String>,
    /// Full rule text as the host rendered it.
    pub rendering: String,
    pub packets: u64,
    pub bytes: u64,
}

impl RuleSnapshot {
    pub fn new(position: u32, target: RuleTarget) -> Self {
        Self {
            position,
            target,
            protocol: None,
            source: None,
            destination: None,
            source_port: None,
            destination_port: None,
            interface_in: None,
            interface_out: None,
            rendering: String::new(),
            packets: 0,
            bytes: 0,
        }
    }
}

/// One chain with its rules in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub name: String,
    /// Default verdict; `None` for user-defined chains.
    pub policy: Option<ChainPolicy>,
    pub packets: u64,
    pub bytes: u64,
    /// How many rules elsewhere jump to this chain.
    pub references: u32,
    pub rules: Vec<RuleSnapshot>,
}

impl ChainSnapshot {
    pub fn new(name: impl Into<String>, policy: Option<ChainPolicy>) -> Self {
        Self {
            name: name.into(),
            policy,
            packets: 0,
            bytes: 0,
            references: 0,
            rules: Vec::new(),
        }
    }
}

/// One firewall table with its chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub chains: Vec<ChainSnapshot>,
}

impl TableSnapshot {
    pub fn new(name: impl Into<String>, chains: Vec<ChainSnapshot>) -> Self {
        Self { name: name.into(), chains }
    }
}
