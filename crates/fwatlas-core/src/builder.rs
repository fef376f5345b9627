//! Graph builder: snapshots in, layered topology out.
//!
//! Pure and deterministic. The same snapshots always produce the same
//! node ids, layers, links, flows, and layout; only the generation
//! timestamp differs between builds.

use crate::model::{
    FlowKind, FlowPath, InconsistencyWarning, LinkKind, NodeId, NodeKind, TopologyGraph,
    TopologyLink, TopologyNode,
};
use chrono::Utc;
use fwatlas_collect::{ChainSnapshot, InterfaceSnapshot, RuleSnapshot, RuleTarget, TableSnapshot};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ── Chain roles ─────────────────────────────────────────────────────

/// Direction role of a chain, from built-in chain naming conventions.
/// Structural links and flows under a chain inherit its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainRole {
    Input,
    Output,
    Forward,
}

impl ChainRole {
    fn of(chain_name: &str) -> Self {
        match chain_name.to_ascii_uppercase().as_str() {
            "INPUT" => Self::Input,
            "OUTPUT" | "POSTROUTING" => Self::Output,
            // FORWARD, PREROUTING, and user-defined chains.
            _ => Self::Forward,
        }
    }

    fn link_kind(self) -> LinkKind {
        match self {
            Self::Input => LinkKind::Input,
            Self::Output => LinkKind::Output,
            Self::Forward => LinkKind::Forward,
        }
    }

    fn flow_kind(self) -> FlowKind {
        match self {
            Self::Input => FlowKind::Input,
            Self::Output => FlowKind::Output,
            Self::Forward => FlowKind::Forward,
        }
    }
}

// ── Build ───────────────────────────────────────────────────────────

/// Synthesize a topology graph from host snapshots.
///
/// Empty inputs yield an empty, valid graph. Inconsistencies in the
/// snapshots (dangling jumps, unknown interface names) are recorded as
/// warnings on the graph, never build failures.
pub fn build(interfaces: &[InterfaceSnapshot], tables: &[TableSnapshot]) -> TopologyGraph {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut warnings = Vec::new();

    // Layer 0: one node per interface, indexed left to right.
    let mut interface_ids: HashMap<&str, NodeId> = HashMap::new();
    for (index, iface) in interfaces.iter().enumerate() {
        let id = NodeId::interface(&iface.name);
        interface_ids.insert(iface.name.as_str(), id.clone());
        nodes.push(TopologyNode::new(
            id,
            iface.name.clone(),
            NodeKind::Interface {
                name: iface.name.clone(),
                interface_kind: iface.kind,
                state: iface.state.clone(),
                docker: iface.docker,
            },
            index,
        ));
    }

    // Layers 1..3: tables, chains, rules, with per-layer slot counters.
    let mut chain_slot = 0_usize;
    let mut rule_slot = 0_usize;
    for (table_slot, table) in tables.iter().enumerate() {
        let table_id = NodeId::table(&table.name);
        nodes.push(TopologyNode::new(
            table_id.clone(),
            table.name.clone(),
            NodeKind::Table { name: table.name.clone(), chain_count: table.chains.len() },
            table_slot,
        ));

        let chains_by_name: HashMap<&str, &ChainSnapshot> =
            table.chains.iter().map(|chain| (chain.name.as_str(), chain)).collect();

        for chain in &table.chains {
            let chain_id = NodeId::chain(&table.name, &chain.name);
            let role = ChainRole::of(&chain.name);
            nodes.push(TopologyNode::new(
                chain_id.clone(),
                chain.name.clone(),
                NodeKind::Chain {
                    table: table.name.clone(),
                    name: chain.name.clone(),
                    policy: chain.policy,
                    rule_count: chain.rules.len(),
                    packets: chain.packets,
                    bytes: chain.bytes,
                },
                chain_slot,
            ));
            chain_slot += 1;

            links.push(
                TopologyLink::new(table_id.clone(), chain_id.clone(), role.link_kind())
                    .with_label(chain.name.clone()),
            );

            for rule in &chain.rules {
                let rule_id = NodeId::rule(&table.name, &chain.name, rule.position);
                nodes.push(TopologyNode::new(
                    rule_id.clone(),
                    rule_label(rule),
                    NodeKind::Rule {
                        table: table.name.clone(),
                        chain: chain.name.clone(),
                        position: rule.position,
                        target: rule.target.tag().to_owned(),
                        protocol: rule.protocol.clone(),
                        packets: rule.packets,
                        bytes: rule.bytes,
                    },
                    rule_slot,
                ));
                rule_slot += 1;

                links.push(
                    TopologyLink::new(chain_id.clone(), rule_id.clone(), role.link_kind())
                        .with_protocol(rule.protocol.clone())
                        .with_action(rule.target.tag()),
                );

                if let RuleTarget::Jump(jump_target) = &rule.target {
                    let jump = TopologyLink::new(
                        rule_id.clone(),
                        NodeId::chain(&table.name, jump_target),
                        role.link_kind(),
                    )
                    .with_label(format!("jump {jump_target}"))
                    .with_action("JUMP");
                    if chains_by_name.contains_key(jump_target.as_str()) {
                        links.push(jump);
                    } else {
                        warnings.push(InconsistencyWarning::DanglingJumpTarget {
                            table: table.name.clone(),
                            chain: chain.name.clone(),
                            target: jump_target.clone(),
                        });
                        links.push(jump.dangling());
                    }
                }

                if let Some(ingress) = rule.interface_in.as_deref() {
                    if let Some(iface_id) = interface_ids.get(ingress) {
                        links.push(
                            TopologyLink::new(
                                iface_id.clone(),
                                rule_id.clone(),
                                LinkKind::InterfaceRule,
                            )
                            .with_label(format!("{ingress} -> {}", rule.target))
                            .with_protocol(rule.protocol.clone())
                            .with_port(rule.destination_port.clone())
                            .with_action(rule.target.tag()),
                        );
                    } else {
                        warnings.push(InconsistencyWarning::UnresolvedInterface {
                            rule: rule_id.clone(),
                            interface: ingress.to_owned(),
                        });
                    }
                }

                if let Some(egress) = rule.interface_out.as_deref() {
                    if let Some(iface_id) = interface_ids.get(egress) {
                        links.push(
                            TopologyLink::new(
                                rule_id.clone(),
                                iface_id.clone(),
                                LinkKind::RuleInterface,
                            )
                            .with_label(format!("{} -> {egress}", rule.target))
                            .with_protocol(rule.protocol.clone())
                            .with_action(rule.target.tag()),
                        );
                    } else {
                        warnings.push(InconsistencyWarning::UnresolvedInterface {
                            rule: rule_id,
                            interface: egress.to_owned(),
                        });
                    }
                }
            }
        }
    }

    let flows = derive_flows(tables, &interface_ids);

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        flows = flows.len(),
        warnings = warnings.len(),
        "topology graph assembled"
    );

    TopologyGraph { nodes, links, flows, warnings, generated_at: Utc::now() }
}

fn rule_label(rule: &RuleSnapshot) -> String {
    match &rule.protocol {
        Some(protocol) if protocol != "all" => format!("{} {protocol}", rule.target),
        _ => rule.target.to_string(),
    }
}

// ── Flow derivation ─────────────────────────────────────────────────

/// Reconstruct end-to-end traffic scenarios.
///
/// A flow starts at every rule that names an ingress interface and is
/// not pure accounting. Jumps are followed in rule-position order to
/// the first terminal-or-egress rule; a visited set cuts jump cycles.
fn derive_flows(tables: &[TableSnapshot], interface_ids: &HashMap<&str, NodeId>) -> Vec<FlowPath> {
    let mut flows = Vec::new();

    for table in tables {
        let chains_by_name: HashMap<&str, &ChainSnapshot> =
            table.chains.iter().map(|chain| (chain.name.as_str(), chain)).collect();

        for chain in &table.chains {
            let kind = ChainRole::of(&chain.name).flow_kind();
            for rule in &chain.rules {
                let Some(ingress) = rule.interface_in.as_deref() else {
                    continue;
                };
                if rule.target.is_accounting() {
                    continue;
                }
                let Some(ingress_id) = interface_ids.get(ingress) else {
                    continue;
                };

                let path = walk(table, chain, rule, ingress_id, &chains_by_name, interface_ids);
                flows.push(FlowPath {
                    id: format!(
                        "flow_{}_{}_{}_{}",
                        kind.as_str(),
                        table.name,
                        chain.name,
                        rule.position
                    ),
                    name: format!("{} via {ingress}", direction_name(kind)),
                    description: format!(
                        "{} traffic entering {ingress}, evaluated from {} {} rule {}",
                        direction_name(kind),
                        table.name,
                        chain.name,
                        rule.position
                    ),
                    kind,
                    path,
                    color: kind.color().to_owned(),
                });
            }
        }
    }

    flows
}

fn walk(
    table: &TableSnapshot,
    start_chain: &ChainSnapshot,
    start_rule: &RuleSnapshot,
    ingress_id: &NodeId,
    chains_by_name: &HashMap<&str, &ChainSnapshot>,
    interface_ids: &HashMap<&str, NodeId>,
) -> Vec<NodeId> {
    let mut path = vec![
        ingress_id.clone(),
        NodeId::rule(&table.name, &start_chain.name, start_rule.position),
    ];
    let mut visited: HashSet<&str> = HashSet::from([start_chain.name.as_str()]);
    let mut current = start_rule;

    loop {
        match &current.target {
            RuleTarget::Jump(next_name) => {
                let Some(next_chain) = chains_by_name.get(next_name.as_str()) else {
                    break;
                };
                if !visited.insert(next_chain.name.as_str()) {
                    break;
                }
                path.push(NodeId::chain(&table.name, &next_chain.name));
                let Some(next_rule) = next_chain
                    .rules
                    .iter()
                    .find(|rule| rule.target.is_terminal() || rule.interface_out.is_some())
                else {
                    break;
                };
                path.push(NodeId::rule(&table.name, &next_chain.name, next_rule.position));
                current = next_rule;
            }
            _ => {
                if let Some(egress) = current.interface_out.as_deref() {
                    if interface_ids.contains_key(egress) {
                        path.push(NodeId::interface(egress));
                    }
                }
                break;
            }
        }
    }

    path
}

fn direction_name(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::Input => "Inbound",
        FlowKind::Output => "Outbound",
        FlowKind::Forward => "Forwarded",
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fwatlas_collect::{ChainPolicy, RuleTarget};
    use pretty_assertions::assert_eq;

    fn ssh_accept_rule() -> RuleSnapshot {
        let mut rule = RuleSnapshot::new(1, RuleTarget::Accept);
        rule.protocol = Some("tcp".to_owned());
        rule.interface_in = Some("eth0".to_owned());
        rule.destination_port = Some("22".to_owned());
        rule
    }

    fn sample_state() -> (Vec<InterfaceSnapshot>, Vec<TableSnapshot>) {
        let interfaces = vec![
            InterfaceSnapshot::named("eth0"),
            InterfaceSnapshot::named("eth1"),
            InterfaceSnapshot::named("docker0"),
        ];
        let mut chain = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        chain.rules.push(ssh_accept_rule());
        let tables = vec![TableSnapshot::new("filter", vec![chain])];
        (interfaces, tables)
    }

    #[test]
    fn ssh_example_produces_the_expected_graph() {
        let (interfaces, tables) = sample_state();
        let graph = build(&interfaces, &tables);

        let interface_nodes =
            graph.nodes.iter().filter(|n| n.kind.kind_name() == "interface").count();
        assert_eq!(interface_nodes, 3);
        assert_eq!(graph.nodes.iter().filter(|n| n.kind.kind_name() == "table").count(), 1);
        assert_eq!(graph.nodes.iter().filter(|n| n.kind.kind_name() == "chain").count(), 1);
        assert_eq!(graph.nodes.iter().filter(|n| n.kind.kind_name() == "rule").count(), 1);

        let rule_id = NodeId::rule("filter", "INPUT", 1);
        let chain_id = NodeId::chain("filter", "INPUT");
        assert!(
            graph.links.iter().any(|l| l.source == chain_id && l.target == rule_id),
            "chain to rule link missing"
        );
        assert!(
            graph.links.iter().any(|l| l.source == NodeId::interface("eth0")
                && l.target == rule_id
                && l.kind == LinkKind::InterfaceRule),
            "eth0 to rule link missing"
        );
        assert!(
            graph
                .links
                .iter()
                .any(|l| l.source == NodeId::table("filter") && l.target == chain_id),
            "table to chain link missing"
        );

        assert_eq!(graph.flows.len(), 1);
        let flow = &graph.flows[0];
        assert_eq!(flow.kind, FlowKind::Input);
        assert_eq!(flow.path, vec![NodeId::interface("eth0"), rule_id]);
        assert_eq!(flow.color, "#4CAF50");
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn empty_inputs_yield_an_empty_valid_graph() {
        let graph = build(&[], &[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
        assert!(graph.flows.is_empty());
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn every_link_endpoint_resolves_unless_marked_dangling() {
        let (interfaces, tables) = sample_state();
        let graph = build(&interfaces, &tables);
        let ids = graph.node_ids();
        for link in &graph.links {
            assert!(ids.contains(&link.source), "unknown source {}", link.source);
            if !link.dangling {
                assert!(ids.contains(&link.target), "unknown target {}", link.target);
            }
        }
        for flow in &graph.flows {
            for id in &flow.path {
                assert!(ids.contains(id), "flow references unknown node {id}");
            }
        }
    }

    #[test]
    fn dangling_jump_is_kept_and_marked() {
        let mut chain = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        chain.rules.push(RuleSnapshot::new(1, RuleTarget::Jump("GHOST".to_owned())));
        let graph = build(&[], &[TableSnapshot::new("filter", vec![chain])]);

        let jump = graph
            .links
            .iter()
            .find(|l| l.target == NodeId::chain("filter", "GHOST"))
            .unwrap();
        assert!(jump.dangling);
        assert!(matches!(
            graph.warnings.as_slice(),
            [InconsistencyWarning::DanglingJumpTarget { target, .. }] if target == "GHOST"
        ));
    }

    #[test]
    fn resolved_jump_links_rule_to_target_chain() {
        let mut input = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        input.rules.push(RuleSnapshot::new(1, RuleTarget::Jump("CUSTOM".to_owned())));
        let mut custom = ChainSnapshot::new("CUSTOM", None);
        custom.rules.push(RuleSnapshot::new(1, RuleTarget::Drop));
        let graph = build(&[], &[TableSnapshot::new("filter", vec![input, custom])]);

        let jump = graph
            .links
            .iter()
            .find(|l| l.source == NodeId::rule("filter", "INPUT", 1)
                && l.target == NodeId::chain("filter", "CUSTOM"))
            .unwrap();
        assert!(!jump.dangling);
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn unresolved_interface_skips_link_and_warns() {
        let mut chain = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        let mut rule = RuleSnapshot::new(1, RuleTarget::Accept);
        rule.interface_in = Some("eth9".to_owned());
        chain.rules.push(rule);
        let graph = build(&[], &[TableSnapshot::new("filter", vec![chain])]);

        assert!(!graph.links.iter().any(|l| l.kind == LinkKind::InterfaceRule));
        assert!(matches!(
            graph.warnings.as_slice(),
            [InconsistencyWarning::UnresolvedInterface { interface, .. }] if interface == "eth9"
        ));
        // No flow either: the ingress interface does not exist.
        assert!(graph.flows.is_empty());
    }

    #[test]
    fn duplicate_chain_names_across_tables_stay_distinct() {
        let filter = TableSnapshot::new(
            "filter",
            vec![ChainSnapshot::new("OUTPUT", Some(ChainPolicy::Accept))],
        );
        let nat = TableSnapshot::new(
            "nat",
            vec![ChainSnapshot::new("OUTPUT", Some(ChainPolicy::Accept))],
        );
        let graph = build(&[], &[filter, nat]);

        let chain_ids: Vec<_> =
            graph.nodes.iter().filter(|n| n.layer == 2).map(|n| n.id.clone()).collect();
        assert_eq!(
            chain_ids,
            vec![NodeId::chain("filter", "OUTPUT"), NodeId::chain("nat", "OUTPUT")]
        );
    }

    #[test]
    fn jump_cycles_are_cut() {
        let mut a = ChainSnapshot::new("A", None);
        a.rules.push(RuleSnapshot::new(1, RuleTarget::Jump("B".to_owned())));
        let mut a_entry = a.rules[0].clone();
        a_entry.interface_in = Some("eth0".to_owned());
        a.rules[0] = a_entry;
        let mut b = ChainSnapshot::new("B", None);
        let mut back = RuleSnapshot::new(1, RuleTarget::Jump("A".to_owned()));
        back.interface_out = Some("eth1".to_owned());
        b.rules.push(back);
        let graph = build(
            &[InterfaceSnapshot::named("eth0")],
            &[TableSnapshot::new("filter", vec![a, b])],
        );

        assert_eq!(graph.flows.len(), 1);
        // Walk stops when B would jump back into A.
        assert_eq!(
            graph.flows[0].path,
            vec![
                NodeId::interface("eth0"),
                NodeId::rule("filter", "A", 1),
                NodeId::chain("filter", "B"),
                NodeId::rule("filter", "B", 1),
            ]
        );
    }

    #[test]
    fn log_rules_do_not_start_flows() {
        let mut chain = ChainSnapshot::new("INPUT", Some(ChainPolicy::Accept));
        let mut rule = RuleSnapshot::new(1, RuleTarget::Log);
        rule.interface_in = Some("eth0".to_owned());
        chain.rules.push(rule);
        let graph = build(
            &[InterfaceSnapshot::named("eth0")],
            &[TableSnapshot::new("filter", vec![chain])],
        );
        assert!(graph.flows.is_empty());
    }

    #[test]
    fn builds_are_idempotent_apart_from_the_timestamp() {
        let (interfaces, tables) = sample_state();
        let first = build(&interfaces, &tables);
        let second = build(&interfaces, &tables);

        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.links, second.links);
        assert_eq!(first.flows, second.flows);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn forward_flow_reaches_the_egress_interface() {
        let mut chain = ChainSnapshot::new("FORWARD", Some(ChainPolicy::Drop));
        let mut rule = RuleSnapshot::new(1, RuleTarget::Accept);
        rule.interface_in = Some("eth0".to_owned());
        rule.interface_out = Some("eth1".to_owned());
        chain.rules.push(rule);
        let graph = build(
            &[InterfaceSnapshot::named("eth0"), InterfaceSnapshot::named("eth1")],
            &[TableSnapshot::new("filter", vec![chain])],
        );

        assert_eq!(graph.flows.len(), 1);
        let flow = &graph.flows[0];
        assert_eq!(flow.kind, FlowKind::Forward);
        assert_eq!(
            flow.path,
            vec![
                NodeId::interface("eth0"),
                NodeId::rule("filter", "FORWARD", 1),
                NodeId::interface("eth1"),
            ]
        );
        assert_eq!(flow.color, "#FF9800");
    }
}
