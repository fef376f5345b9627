//! Topology aggregation engine for fwatlas.
//!
//! Raw host snapshots (from `fwatlas-collect`) are synthesized into a
//! layered [`TopologyGraph`]: interface nodes at layer 0, firewall
//! tables, chains, and rules at layers 1..3, linked by containment,
//! jump, and traffic edges, with derived end-to-end [`FlowPath`]s.
//!
//! The pieces compose bottom-up:
//!
//! - [`builder`] turns snapshots into a graph, deterministically.
//! - [`view`] produces filtered/paginated copies of a graph.
//! - [`stats`] reduces a graph to summary counts.
//! - [`cache`] owns the single shared graph slot with coalesced,
//!   abandonment-safe rebuilds.
//! - [`service`] is the façade callers embed: query, refresh, stats,
//!   export, health.

pub mod builder;
pub mod cache;
pub mod error;
pub mod export;
pub mod model;
pub mod service;
pub mod stats;
pub mod view;

pub use cache::GraphCache;
pub use error::TopologyError;
pub use export::ExportFormat;
pub use model::{
    FlowKind, FlowPath, InconsistencyWarning, LinkKind, NodeId, NodeKind, Position, TopologyGraph,
    TopologyLink, TopologyNode, TopologyStats,
};
pub use service::{
    EngineSettings, HealthReport, HealthStatus, ResponseMeta, TopologyQuery, TopologyResponse,
    TopologyService,
};
pub use view::{GraphFilter, PageRequest};
