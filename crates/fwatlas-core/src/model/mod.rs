// ── Topology domain model ──
//
// Canonical graph representation the engine produces and every consumer
// (HTTP glue, exporters, dashboards) depends on. Graphs are immutable
// after build; views copy, never mutate.

pub mod flow;
pub mod graph;
pub mod link;
pub mod node;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use fwatlas_core::model::*` gives you everything.

pub use flow::{FlowKind, FlowPath};
pub use graph::{InconsistencyWarning, TopologyGraph, TopologyStats};
pub use link::{LinkKind, TopologyLink};
pub use node::{NodeId, NodeKind, Position, TopologyNode};
