//! Summary statistics over a graph. Pure reduction, no caching.

use crate::model::{NodeKind, TopologyGraph, TopologyStats};
use std::collections::BTreeMap;

/// Tally nodes, links, and flows of `graph`.
///
/// Always reflects exactly the graph it is handed; summarizing a
/// filtered view counts the view, not the canonical build.
pub fn summarize(graph: &TopologyGraph) -> TopologyStats {
    let mut node_kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut chain_kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut interface_kinds: BTreeMap<String, usize> = BTreeMap::new();

    for node in &graph.nodes {
        *node_kinds.entry(node.kind.kind_name().to_owned()).or_default() += 1;
        match &node.kind {
            NodeKind::Rule { chain, .. } => {
                *chain_kinds.entry(chain.clone()).or_default() += 1;
            }
            NodeKind::Interface { interface_kind, .. } => {
                *interface_kinds.entry(interface_kind.as_str().to_owned()).or_default() += 1;
            }
            _ => {}
        }
    }

    TopologyStats {
        total_nodes: graph.nodes.len(),
        total_links: graph.links.len(),
        total_flows: graph.flows.len(),
        node_kinds,
        chain_kinds,
        interface_kinds,
        generated_at: graph.generated_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder;
    use fwatlas_collect::{
        ChainPolicy, ChainSnapshot, InterfaceSnapshot, RuleSnapshot, RuleTarget, TableSnapshot,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn tallies_match_the_graph() {
        let interfaces =
            vec![InterfaceSnapshot::named("eth0"), InterfaceSnapshot::named("docker0")];
        let mut input = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        input.rules.push(RuleSnapshot::new(1, RuleTarget::Accept));
        input.rules.push(RuleSnapshot::new(2, RuleTarget::Drop));
        let mut output = ChainSnapshot::new("OUTPUT", Some(ChainPolicy::Accept));
        output.rules.push(RuleSnapshot::new(1, RuleTarget::Accept));
        let graph =
            builder::build(&interfaces, &[TableSnapshot::new("filter", vec![input, output])]);

        let stats = summarize(&graph);
        assert_eq!(stats.total_nodes, graph.nodes.len());
        assert_eq!(stats.total_links, graph.links.len());
        assert_eq!(stats.total_flows, graph.flows.len());
        assert_eq!(stats.node_kinds["interface"], 2);
        assert_eq!(stats.node_kinds["table"], 1);
        assert_eq!(stats.node_kinds["chain"], 2);
        assert_eq!(stats.node_kinds["rule"], 3);
        assert_eq!(stats.chain_kinds["INPUT"], 2);
        assert_eq!(stats.chain_kinds["OUTPUT"], 1);
        assert_eq!(stats.interface_kinds["physical"], 1);
        assert_eq!(stats.interface_kinds["bridge"], 1);
        assert_eq!(stats.generated_at, graph.generated_at);
    }

    #[test]
    fn empty_graph_summarizes_to_zeros() {
        let stats = summarize(&TopologyGraph::empty());
        assert_eq!(stats.total_nodes, 0);
        assert!(stats.node_kinds.is_empty());
        assert!(stats.chain_kinds.is_empty());
    }
}
