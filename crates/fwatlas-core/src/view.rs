//! Filtered and paginated views over a built graph.
//!
//! A view is a fresh [`TopologyGraph`] copied out of the source; the
//! source is never mutated. After node selection, links and flow paths
//! missing an endpoint are dropped outright so the view itself still
//! satisfies every graph invariant.

use crate::error::TopologyError;
use crate::model::{NodeId, NodeKind, TopologyGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Filter / page requests ──────────────────────────────────────────

/// Node selection criteria. All present criteria must match (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFilter {
    /// Case-insensitive substring over rule protocols.
    pub protocol: Option<String>,
    /// Case-insensitive chain name equality; constrains rule and chain nodes.
    pub chain: Option<String>,
    /// Case-insensitive substring over interface names.
    pub interface: Option<String>,
    /// Case-insensitive equality on the rule target tag (`ACCEPT`, `JUMP`, ...).
    pub rule_kind: Option<String>,
}

impl GraphFilter {
    pub fn is_empty(&self) -> bool {
        self.protocol.is_none()
            && self.chain.is_none()
            && self.interface.is_none()
            && self.rule_kind.is_none()
    }
}

/// 1-based pagination over the rule layer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Reject non-positive values outright; never clamp.
    fn validate(self) -> Result<(usize, usize), TopologyError> {
        if self.page <= 0 {
            return Err(TopologyError::validation("page", "must be a positive integer"));
        }
        if self.page_size <= 0 {
            return Err(TopologyError::validation("page_size", "must be a positive integer"));
        }
        #[allow(clippy::cast_sign_loss)]
        Ok((self.page as usize, self.page_size as usize))
    }
}

// ── View construction ───────────────────────────────────────────────

/// Produce a filtered, optionally paginated copy of `graph`.
///
/// Pagination slices only the rule layer, sorted by (table, chain,
/// position); every non-rule node survives as context for the page.
/// The view keeps the source graph's `generated_at` so callers can tell
/// which build they are looking at.
pub fn apply(
    graph: &TopologyGraph,
    filter: &GraphFilter,
    page: Option<PageRequest>,
) -> Result<TopologyGraph, TopologyError> {
    let paging = page.map(PageRequest::validate).transpose()?;

    let mut nodes: Vec<_> =
        graph.nodes.iter().filter(|node| matches(filter, &node.kind)).cloned().collect();

    if let Some((page, page_size)) = paging {
        let mut rule_ids: Vec<(String, String, u32, NodeId)> = nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Rule { table, chain, position, .. } => {
                    Some((table.clone(), chain.clone(), *position, node.id.clone()))
                }
                _ => None,
            })
            .collect();
        rule_ids.sort();

        let start = (page - 1).saturating_mul(page_size);
        let keep: HashSet<NodeId> = rule_ids
            .into_iter()
            .skip(start)
            .take(page_size)
            .map(|(_, _, _, id)| id)
            .collect();
        nodes.retain(|node| !matches!(node.kind, NodeKind::Rule { .. }) || keep.contains(&node.id));
    }

    let surviving: HashSet<&NodeId> = nodes.iter().map(|node| &node.id).collect();

    let links = graph
        .links
        .iter()
        .filter(|link| {
            surviving.contains(&link.source)
                && (surviving.contains(&link.target) || link.dangling)
        })
        .cloned()
        .collect();

    let flows = graph
        .flows
        .iter()
        .filter(|flow| flow.path.iter().all(|id| surviving.contains(id)))
        .cloned()
        .collect();

    Ok(TopologyGraph {
        nodes,
        links,
        flows,
        warnings: graph.warnings.clone(),
        generated_at: graph.generated_at,
    })
}

fn matches(filter: &GraphFilter, kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Rule { chain, target, protocol, .. } => {
            if let Some(wanted) = &filter.protocol {
                let Some(protocol) = protocol else { return false };
                if !contains_ignore_case(protocol, wanted) {
                    return false;
                }
            }
            if let Some(wanted) = &filter.chain {
                if !chain.eq_ignore_ascii_case(wanted) {
                    return false;
                }
            }
            if let Some(wanted) = &filter.rule_kind {
                if !target.eq_ignore_ascii_case(wanted) {
                    return false;
                }
            }
            true
        }
        NodeKind::Chain { name, .. } => match &filter.chain {
            Some(wanted) => name.eq_ignore_ascii_case(wanted),
            None => true,
        },
        NodeKind::Interface { name, .. } => match &filter.interface {
            Some(wanted) => contains_ignore_case(name, wanted),
            None => true,
        },
        NodeKind::Table { .. } => true,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder;
    use fwatlas_collect::{
        ChainPolicy, ChainSnapshot, InterfaceSnapshot, RuleSnapshot, RuleTarget, TableSnapshot,
    };
    use pretty_assertions::assert_eq;

    fn rule(position: u32, target: RuleTarget, protocol: &str, iface_in: Option<&str>) -> RuleSnapshot {
        let mut rule = RuleSnapshot::new(position, target);
        rule.protocol = Some(protocol.to_owned());
        rule.interface_in = iface_in.map(str::to_owned);
        rule
    }

    fn sample_graph() -> TopologyGraph {
        let interfaces =
            vec![InterfaceSnapshot::named("eth0"), InterfaceSnapshot::named("docker0")];
        let mut input = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        input.rules.push(rule(1, RuleTarget::Accept, "tcp", Some("eth0")));
        input.rules.push(rule(2, RuleTarget::Drop, "udp", None));
        let mut forward = ChainSnapshot::new("FORWARD", Some(ChainPolicy::Drop));
        forward.rules.push(rule(1, RuleTarget::Accept, "tcp", None));
        let tables = vec![TableSnapshot::new("filter", vec![input, forward])];
        builder::build(&interfaces, &tables)
    }

    #[test]
    fn empty_filter_copies_the_graph() {
        let graph = sample_graph();
        let view = apply(&graph, &GraphFilter::default(), None).unwrap();
        assert_eq!(view.nodes, graph.nodes);
        assert_eq!(view.links, graph.links);
        assert_eq!(view.flows, graph.flows);
        assert_eq!(view.generated_at, graph.generated_at);
    }

    #[test]
    fn protocol_filter_constrains_rule_nodes_only() {
        let graph = sample_graph();
        let filter = GraphFilter { protocol: Some("TCP".to_owned()), ..GraphFilter::default() };
        let view = apply(&graph, &filter, None).unwrap();

        let rules: Vec<_> = view
            .nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Rule { protocol, .. } => protocol.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(rules, vec!["tcp".to_owned(), "tcp".to_owned()]);
        // Interfaces, tables, chains untouched.
        assert_eq!(view.nodes.iter().filter(|n| n.layer < 3).count(), 5);
    }

    #[test]
    fn chain_filter_keeps_matching_chain_and_its_rules() {
        let graph = sample_graph();
        let filter = GraphFilter { chain: Some("input".to_owned()), ..GraphFilter::default() };
        let view = apply(&graph, &filter, None).unwrap();

        assert!(view.nodes.iter().any(|n| n.id == NodeId::chain("filter", "INPUT")));
        assert!(!view.nodes.iter().any(|n| n.id == NodeId::chain("filter", "FORWARD")));
        assert!(!view.nodes.iter().any(|n| n.id == NodeId::rule("filter", "FORWARD", 1)));
    }

    #[test]
    fn dropped_endpoints_take_their_links_and_flows_with_them() {
        let graph = sample_graph();
        let filter =
            GraphFilter { interface: Some("docker".to_owned()), ..GraphFilter::default() };
        let view = apply(&graph, &filter, None).unwrap();

        // eth0 is gone, so its traffic link and the flow through it are gone.
        assert!(!view.nodes.iter().any(|n| n.id == NodeId::interface("eth0")));
        let eth0 = NodeId::interface("eth0");
        assert!(view.links.iter().all(|l| l.source != eth0 && l.target != eth0));
        assert!(view.flows.is_empty());

        // Exactness: every link whose endpoints both survive is retained.
        let surviving = view.node_ids();
        let expected: Vec<_> = graph
            .links
            .iter()
            .filter(|l| surviving.contains(&l.source) && surviving.contains(&l.target))
            .cloned()
            .collect();
        assert_eq!(view.links, expected);
    }

    #[test]
    fn filters_compose_with_and_semantics() {
        let graph = sample_graph();
        let filter = GraphFilter {
            protocol: Some("tcp".to_owned()),
            chain: Some("INPUT".to_owned()),
            ..GraphFilter::default()
        };
        let view = apply(&graph, &filter, None).unwrap();

        let rule_ids: Vec<_> =
            view.nodes.iter().filter(|n| n.layer == 3).map(|n| n.id.clone()).collect();
        assert_eq!(rule_ids, vec![NodeId::rule("filter", "INPUT", 1)]);
    }

    #[test]
    fn rule_kind_filter_matches_target_tags() {
        let graph = sample_graph();
        let filter = GraphFilter { rule_kind: Some("drop".to_owned()), ..GraphFilter::default() };
        let view = apply(&graph, &filter, None).unwrap();

        let rule_ids: Vec<_> =
            view.nodes.iter().filter(|n| n.layer == 3).map(|n| n.id.clone()).collect();
        assert_eq!(rule_ids, vec![NodeId::rule("filter", "INPUT", 2)]);
    }

    #[test]
    fn pagination_slices_only_the_rule_layer() {
        let graph = sample_graph();
        let view =
            apply(&graph, &GraphFilter::default(), Some(PageRequest { page: 1, page_size: 2 }))
                .unwrap();

        assert_eq!(view.nodes.iter().filter(|n| n.layer == 3).count(), 2);
        // Full parent context retained.
        assert_eq!(view.nodes.iter().filter(|n| n.layer < 3).count(), 5);
    }

    #[test]
    fn pages_are_disjoint_and_cover_all_rules() {
        let graph = sample_graph();
        let page = |n| {
            apply(&graph, &GraphFilter::default(), Some(PageRequest { page: n, page_size: 2 }))
                .unwrap()
        };
        let first: HashSet<NodeId> =
            page(1).nodes.iter().filter(|n| n.layer == 3).map(|n| n.id.clone()).collect();
        let second: HashSet<NodeId> =
            page(2).nodes.iter().filter(|n| n.layer == 3).map(|n| n.id.clone()).collect();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(first.is_disjoint(&second));

        let all: HashSet<NodeId> =
            graph.nodes.iter().filter(|n| n.layer == 3).map(|n| n.id.clone()).collect();
        let union: HashSet<NodeId> = first.union(&second).cloned().collect();
        assert_eq!(union, all);
    }

    #[test]
    fn page_beyond_the_end_is_empty_but_valid() {
        let graph = sample_graph();
        let view =
            apply(&graph, &GraphFilter::default(), Some(PageRequest { page: 9, page_size: 50 }))
                .unwrap();
        assert_eq!(view.nodes.iter().filter(|n| n.layer == 3).count(), 0);
        assert!(view.flows.is_empty());
    }

    #[test]
    fn non_positive_paging_is_rejected_not_clamped() {
        let graph = sample_graph();
        for (page, page_size) in [(0, 10), (-1, 10), (1, 0), (1, -5)] {
            let err = apply(&graph, &GraphFilter::default(), Some(PageRequest { page, page_size }))
                .unwrap_err();
            assert!(err.is_validation(), "expected validation error for ({page}, {page_size})");
        }
    }

    #[test]
    fn view_never_mutates_the_source() {
        let graph = sample_graph();
        let before = graph.clone();
        let filter = GraphFilter { chain: Some("INPUT".to_owned()), ..GraphFilter::default() };
        let _ = apply(&graph, &filter, Some(PageRequest { page: 1, page_size: 1 })).unwrap();
        assert_eq!(graph, before);
    }
}
