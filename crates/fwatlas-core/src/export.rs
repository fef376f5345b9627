//! Graph export: pretty JSON or flat CSV.

use crate::error::TopologyError;
use crate::model::TopologyGraph;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported export encodings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Parse a caller-supplied format string; unknown values are a
    /// validation error, not a panic or a silent default.
    pub fn parse(raw: &str) -> Result<Self, TopologyError> {
        raw.parse()
            .map_err(|_| TopologyError::validation("format", format!("unsupported format {raw:?}, use json or csv")))
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

/// Encode `graph` in the requested format.
pub fn encode(graph: &TopologyGraph, format: ExportFormat) -> Result<Vec<u8>, TopologyError> {
    match format {
        ExportFormat::Json => {
            serde_json::to_vec_pretty(graph).map_err(|e| TopologyError::Export(e.to_string()))
        }
        ExportFormat::Csv => encode_csv(graph),
    }
}

/// Flat CSV: one row per node, then one per link, discriminated by the
/// first column.
fn encode_csv(graph: &TopologyGraph) -> Result<Vec<u8>, TopologyError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_export = |e: csv::Error| TopologyError::Export(e.to_string());

    writer
        .write_record([
            "record", "id", "label", "kind", "layer", "source", "target", "action",
        ])
        .map_err(to_export)?;

    for node in &graph.nodes {
        let layer = node.layer.to_string();
        writer
            .write_record([
                "node",
                node.id.as_str(),
                node.label.as_str(),
                node.kind.kind_name(),
                layer.as_str(),
                "",
                "",
                "",
            ])
            .map_err(to_export)?;
    }

    for link in &graph.links {
        writer
            .write_record([
                "link",
                link.id.as_str(),
                link.label.as_deref().unwrap_or(""),
                link.kind.as_str(),
                "",
                link.source.as_str(),
                link.target.as_str(),
                link.action.as_deref().unwrap_or(""),
            ])
            .map_err(to_export)?;
    }

    writer
        .into_inner()
        .map_err(|e| TopologyError::Export(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder;
    use fwatlas_collect::{
        ChainPolicy, ChainSnapshot, InterfaceSnapshot, RuleSnapshot, RuleTarget, TableSnapshot,
    };

    fn sample_graph() -> TopologyGraph {
        let mut chain = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        chain.rules.push(RuleSnapshot::new(1, RuleTarget::Accept));
        builder::build(
            &[InterfaceSnapshot::named("eth0")],
            &[TableSnapshot::new("filter", vec![chain])],
        )
    }

    #[test]
    fn format_parsing_is_case_insensitive_and_strict() {
        assert_eq!(ExportFormat::parse("json").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse("xml").unwrap_err().is_validation());
    }

    #[test]
    fn json_export_round_trips() {
        let graph = sample_graph();
        let bytes = encode(&graph, ExportFormat::Json).unwrap();
        let decoded: TopologyGraph = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, graph);
    }

    #[test]
    fn csv_export_lists_nodes_then_links() {
        let graph = sample_graph();
        let bytes = encode(&graph, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("record,id,label"));
        assert_eq!(lines.len(), 1 + graph.nodes.len() + graph.links.len());
        assert!(lines[1].starts_with("node,interface_eth0,"));
        assert!(lines.iter().any(|l| l.starts_with("link,")));
    }
}
