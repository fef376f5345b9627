//! Host state collection surface for fwatlas.
//!
//! Everything the topology engine knows about a host arrives through the
//! [`StateCollector`] trait as point-in-time snapshots: network interfaces
//! on one side, firewall tables with their chains and rules on the other.
//! Snapshots are plain immutable data; how they were obtained (shelling out
//! to iptables, netlink, a remote agent) is the collector's business.
//!
//! The crate also ships [`FixtureCollector`], an in-memory collector over
//! fixed snapshots, so downstream crates can test against deterministic
//! host state.

pub mod fixture;
pub mod snapshot;
pub mod units;

pub use fixture::FixtureCollector;
pub use snapshot::{
    ChainPolicy, ChainSnapshot, DockerKind, InterfaceCounters, InterfaceKind, InterfaceSnapshot,
    RuleSnapshot, RuleTarget, TableSnapshot,
};
pub use units::parse_scaled_count;

use async_trait::async_trait;
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────

/// Failure modes a collector can report.
///
/// Variants are cheap to clone so a single failure can be fanned out to
/// every caller waiting on the same read cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    /// The host refused the read (missing privileges, locked-down netns).
    #[error("host access denied: {0}")]
    AccessDenied(String),

    /// A tool the collector shells out to is missing or broken.
    #[error("{tool} unavailable: {reason}")]
    ToolingUnavailable { tool: String, reason: String },

    /// The read did not complete within the collector's own deadline.
    #[error("collector timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Raw output could not be parsed into snapshots.
    #[error("unparseable collector output: {0}")]
    Parse(String),
}

// ── StateCollector ──────────────────────────────────────────────────

/// Source of raw host state.
///
/// One read cycle is one `list_interfaces` call plus one `list_tables`
/// call; the engine issues both and never caches inside the collector.
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait StateCollector: Send + Sync {
    /// Snapshot every network interface visible on the host.
    async fn list_interfaces(&self) -> Result<Vec<InterfaceSnapshot>, CollectorError>;

    /// Snapshot every firewall table, with chains and rules in
    /// evaluation order.
    async fn list_tables(&self) -> Result<Vec<TableSnapshot>, CollectorError>;
}
