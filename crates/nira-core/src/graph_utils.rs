//! Topology graph helpers: summary statistics and DOT export.

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;

use crate::topology::Topology;

/// Summary statistics over the full topology graph (all nodes, every arc
/// as an undirected edge).
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub arc_count: usize,
    pub connected_components: usize,
    pub attackable_nodes: usize,
    pub attackable_arcs: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes ({} attackable), {} arcs ({} attackable), {} component(s)",
            self.node_count,
            self.attackable_nodes,
            self.arc_count,
            self.attackable_arcs,
            self.connected_components
        )
    }
}

/// Build the undirected petgraph view of the topology. Node weights are
/// node table rows, edge weights arc table rows.
pub fn to_graph(topology: &Topology) -> UnGraph<usize, usize> {
    let mut graph = UnGraph::new_undirected();
    let indices: Vec<_> = (0..topology.node_count()).map(|row| graph.add_node(row)).collect();
    for (row, arc) in topology.arcs().iter().enumerate() {
        let (Some(start), Some(end)) =
            (topology.node_row(&arc.start), topology.node_row(&arc.end))
        else {
            continue;
        };
        graph.add_edge(indices[start], indices[end], row);
    }
    graph
}

/// Calculates node/arc counts and connected components for load-time
/// reporting.
pub fn graph_stats(topology: &Topology) -> GraphStats {
    let graph = to_graph(topology);
    GraphStats {
        node_count: topology.node_count(),
        arc_count: topology.arc_count(),
        connected_components: connected_components(&graph),
        attackable_nodes: topology.nodes().iter().filter(|n| n.attackable).count(),
        attackable_arcs: topology.arcs().iter().filter(|a| a.attackable).count(),
    }
}

/// Render the topology as a Graphviz DOT digraph so external tools can
/// draw it. Interdicted arcs are drawn dashed.
pub fn render_dot(topology: &Topology) -> String {
    let mut buffer = String::new();
    buffer.push_str("digraph nira_topology {\n");
    for (row, node) in topology.nodes().iter().enumerate() {
        let shape = if node.attackable { "ellipse" } else { "box" };
        buffer.push_str(&format!(
            "  n{} [label=\"{}\" shape={}];\n",
            row,
            sanitize_label(&node.key),
            shape
        ));
    }
    for arc in topology.arcs() {
        let (Some(start), Some(end)) =
            (topology.node_row(&arc.start), topology.node_row(&arc.end))
        else {
            continue;
        };
        if arc.xbar {
            buffer.push_str(&format!("  n{start} -> n{end} [style=dashed];\n"));
        } else {
            buffer.push_str(&format!("  n{start} -> n{end};\n"));
        }
    }
    buffer.push_str("}\n");
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ArcInput, NodeInput, Topology};

    #[test]
    fn test_render_dot() {
        let topology = Topology::from_tables(
            vec![
                NodeInput {
                    key: "a".into(),
                    attackable: true,
                    vulnerability: 1,
                    consequence: 1,
                    threat: Some(1),
                    supply_demand: None,
                },
                NodeInput {
                    key: "b".into(),
                    attackable: false,
                    vulnerability: 1,
                    consequence: 1,
                    threat: Some(1),
                    supply_demand: None,
                },
            ],
            vec![ArcInput {
                start: "a".into(),
                end: "b".into(),
                attackable: true,
                vulnerability: 1,
                consequence: 1,
                threat: Some(1),
                capacity: Some(-1.0),
                cost: None,
            }],
            false,
        )
        .unwrap();
        let dot = render_dot(&topology);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("shape=box"));

        let stats = graph_stats(&topology);
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.arc_count, 1);
        assert_eq!(stats.connected_components, 1);
        assert_eq!(stats.attackable_nodes, 1);
    }
}
