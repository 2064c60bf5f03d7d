//! Centrality metrics over the attackable subgraph.
//!
//! The attacker only ever selects assets flagged `attackable`, so every
//! metric here is computed on the undirected subgraph induced by attackable
//! nodes and normalized by the post-filter maximum (at least one surviving
//! asset scores 1.0). Rows outside the subgraph get 0.0, and a degenerate
//! subgraph (empty, a single node, or a flat metric) yields all zeros,
//! which callers must tolerate.
//!
//! petgraph carries the topology graph itself, but has no edge betweenness
//! or articulation-point routines, so Brandes' accumulation and the
//! Hopcroft-Tarjan lowpoint search are implemented directly on the
//! subgraph adjacency.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::topology::Topology;

/// Undirected adjacency view of the attackable subgraph.
struct Subgraph {
    /// Node table rows included, in table order.
    rows: Vec<usize>,
    /// Node table row -> local index.
    index: HashMap<usize, usize>,
    /// Deduplicated adjacency by local index.
    adj: Vec<Vec<usize>>,
}

fn attackable_subgraph(topology: &Topology) -> Subgraph {
    let rows: Vec<usize> = topology
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.attackable)
        .map(|(row, _)| row)
        .collect();
    let index: HashMap<usize, usize> = rows
        .iter()
        .enumerate()
        .map(|(local, &row)| (row, local))
        .collect();

    let mut adj = vec![Vec::new(); rows.len()];
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for arc in topology.arcs() {
        let (Some(start_row), Some(end_row)) =
            (topology.node_row(&arc.start), topology.node_row(&arc.end))
        else {
            continue;
        };
        let (Some(&u), Some(&v)) = (index.get(&start_row), index.get(&end_row)) else {
            continue;
        };
        if u == v {
            continue;
        }
        let key = (u.min(v), u.max(v));
        if seen.insert(key) {
            adj[u].push(v);
            adj[v].push(u);
        }
    }
    Subgraph { rows, index, adj }
}

/// Degree centrality per node table row, normalized to a maximum of 1.0
/// over the attackable subgraph.
pub fn node_degree_centrality(topology: &Topology) -> Vec<f64> {
    let mut result = vec![0.0; topology.node_count()];
    let sub = attackable_subgraph(topology);
    if sub.rows.len() <= 1 {
        return result;
    }
    let max_degree = sub.adj.iter().map(Vec::len).max().unwrap_or(0);
    if max_degree == 0 {
        return result;
    }
    for (local, &row) in sub.rows.iter().enumerate() {
        result[row] = sub.adj[local].len() as f64 / max_degree as f64;
    }
    result
}

/// Edge betweenness centrality per arc table row, normalized to a maximum
/// of 1.0 over the attackable subgraph. Arcs with an endpoint outside the
/// subgraph score 0.0; parallel and reverse arcs share their undirected
/// edge's value.
pub fn arc_betweenness_centrality(topology: &Topology) -> Vec<f64> {
    let mut result = vec![0.0; topology.arc_count()];
    let sub = attackable_subgraph(topology);
    if sub.rows.len() <= 1 {
        return result;
    }

    let edge_values = brandes_edge_betweenness(&sub.adj);
    let max = edge_values.values().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return result;
    }

    for (arc_row, arc) in topology.arcs().iter().enumerate() {
        let (Some(start_row), Some(end_row)) =
            (topology.node_row(&arc.start), topology.node_row(&arc.end))
        else {
            continue;
        };
        let (Some(&u), Some(&v)) = (sub.index.get(&start_row), sub.index.get(&end_row)) else {
            continue;
        };
        let key = (u.min(v), u.max(v));
        if let Some(value) = edge_values.get(&key) {
            result[arc_row] = value / max;
        }
    }
    result
}

/// Brandes' betweenness accumulation for undirected, unweighted graphs,
/// keyed by ordered local index pairs. Each unordered pair of endpoints is
/// visited from both sides, so the raw sums are halved.
fn brandes_edge_betweenness(adj: &[Vec<usize>]) -> HashMap<(usize, usize), f64> {
    let n = adj.len();
    let mut betweenness: HashMap<(usize, usize), f64> = HashMap::new();

    for source in 0..n {
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![usize::MAX; n];
        sigma[source] = 1.0;
        dist[source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for &v in &adj[u] {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    queue.push_back(v);
                }
                if dist[v] == dist[u] + 1 {
                    sigma[v] += sigma[u];
                    preds[v].push(u);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        for &w in order.iter().rev() {
            for &v in &preds[w] {
                let credit = sigma[v] / sigma[w] * (1.0 + delta[w]);
                let key = (v.min(w), v.max(w));
                *betweenness.entry(key).or_insert(0.0) += credit;
                delta[v] += credit;
            }
        }
    }

    for value in betweenness.values_mut() {
        *value /= 2.0;
    }
    betweenness
}

/// Articulation points of the attackable subgraph, as node keys in table
/// order.
pub fn articulation_points(topology: &Topology) -> Vec<String> {
    let sub = attackable_subgraph(topology);
    let n = sub.adj.len();
    let mut disc = vec![0_usize; n];
    let mut low = vec![0_usize; n];
    let mut is_articulation = vec![false; n];
    let mut time = 0_usize;

    fn lowpoint_dfs(
        u: usize,
        parent: Option<usize>,
        time: &mut usize,
        adj: &[Vec<usize>],
        disc: &mut [usize],
        low: &mut [usize],
        is_articulation: &mut [bool],
    ) {
        *time += 1;
        disc[u] = *time;
        low[u] = *time;
        let mut children = 0;
        for &v in &adj[u] {
            if disc[v] == 0 {
                children += 1;
                lowpoint_dfs(v, Some(u), time, adj, disc, low, is_articulation);
                low[u] = low[u].min(low[v]);
                if parent.is_some() && low[v] >= disc[u] {
                    is_articulation[u] = true;
                }
            } else if Some(v) != parent {
                low[u] = low[u].min(disc[v]);
            }
        }
        if parent.is_none() && children > 1 {
            is_articulation[u] = true;
        }
    }

    for start in 0..n {
        if disc[start] == 0 {
            lowpoint_dfs(
                start,
                None,
                &mut time,
                &sub.adj,
                &mut disc,
                &mut low,
                &mut is_articulation,
            );
        }
    }

    sub.rows
        .iter()
        .enumerate()
        .filter(|(local, _)| is_articulation[*local])
        .map(|(_, &row)| topology.nodes()[row].key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ArcInput, NodeInput, Topology};

    fn node(key: &str, attackable: bool) -> NodeInput {
        NodeInput {
            key: key.to_string(),
            attackable,
            vulnerability: 1,
            consequence: 1,
            threat: Some(1),
            supply_demand: None,
        }
    }

    fn arc(start: &str, end: &str) -> ArcInput {
        ArcInput {
            start: start.to_string(),
            end: end.to_string(),
            attackable: true,
            vulnerability: 1,
            consequence: 1,
            threat: Some(1),
            capacity: Some(-1.0),
            cost: None,
        }
    }

    fn path4() -> Topology {
        Topology::from_tables(
            vec![node("a", true), node("b", true), node("c", true), node("d", true)],
            vec![arc("a", "b"), arc("b", "c"), arc("c", "d")],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_degree_centrality_path() {
        let topology = path4();
        let centrality = node_degree_centrality(&topology);
        assert_eq!(centrality, vec![0.5, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_degree_centrality_skips_non_attackable() {
        let topology = Topology::from_tables(
            vec![node("a", true), node("b", false), node("c", true)],
            vec![arc("a", "b"), arc("b", "c"), arc("a", "c")],
            false,
        )
        .unwrap();
        let centrality = node_degree_centrality(&topology);
        // Only the a-c edge survives the induced subgraph.
        assert_eq!(centrality, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_degenerate_subgraph_is_all_zeros() {
        let topology = Topology::from_tables(
            vec![node("a", false), node("b", false)],
            vec![arc("a", "b")],
            false,
        )
        .unwrap();
        assert_eq!(node_degree_centrality(&topology), vec![0.0, 0.0]);
        assert_eq!(arc_betweenness_centrality(&topology), vec![0.0]);
        assert!(articulation_points(&topology).is_empty());
    }

    #[test]
    fn test_edge_betweenness_path() {
        let topology = path4();
        let centrality = arc_betweenness_centrality(&topology);
        // Pair counts over a-b-c-d: ab carries 3 shortest paths, bc 4, cd 3.
        assert!((centrality[0] - 0.75).abs() < 1e-9);
        assert!((centrality[1] - 1.0).abs() < 1e-9);
        assert!((centrality[2] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_articulation_points_path() {
        let topology = path4();
        assert_eq!(articulation_points(&topology), vec!["b", "c"]);
    }

    #[test]
    fn test_articulation_points_cycle_has_none() {
        let topology = Topology::from_tables(
            vec![node("a", true), node("b", true), node("c", true)],
            vec![arc("a", "b"), arc("b", "c"), arc("c", "a")],
            false,
        )
        .unwrap();
        assert!(articulation_points(&topology).is_empty());
    }
}
