//! Network topology model.
//!
//! A [`Topology`] owns two asset tables in input row order: nodes and
//! directed arcs. Every asset carries the ordinal threat/vulnerability/
//! consequence triple with `risk = T * V * C` re-derived on every score
//! mutation, so the stored risk is never stale. Arcs additionally carry an
//! optional flow capacity (`None` = uncapacitated), an optional routing
//! cost, and the transient interdiction indicator `xbar`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::centrality;
use crate::error::{NiraError, NiraResult};
use crate::score::{
    clamp_score, risk_product, AssetClass, RankAttribute, ScoreKind, RISK_MAX, THREAT_MAX,
};

/// One row of the nodes table as supplied by a loader.
///
/// Scores are raw integers here; they are clamped to the 1-5 scale when the
/// topology is constructed. `threat` is optional and derived from degree
/// centrality when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInput {
    pub key: String,
    pub attackable: bool,
    pub vulnerability: i64,
    pub consequence: i64,
    pub threat: Option<i64>,
    pub supply_demand: Option<f64>,
}

/// One row of the arcs table as supplied by a loader.
///
/// `capacity: None` means the column was absent and the capacity is derived
/// as `RISK_MAX - risk`; a negative value is the uncapacitated sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcInput {
    pub start: String,
    pub end: String,
    pub attackable: bool,
    pub vulnerability: i64,
    pub consequence: i64,
    pub threat: Option<i64>,
    pub capacity: Option<f64>,
    pub cost: Option<f64>,
}

/// A node asset with derived risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAsset {
    pub key: String,
    pub attackable: bool,
    pub threat: u8,
    pub vulnerability: u8,
    pub consequence: u8,
    pub risk: u32,
    /// Negative = supply, positive = demand, `None` = transshipment only.
    pub supply_demand: Option<f64>,
}

/// A directed arc asset with derived risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcAsset {
    pub start: String,
    pub end: String,
    pub attackable: bool,
    pub threat: u8,
    pub vulnerability: u8,
    pub consequence: u8,
    pub risk: u32,
    /// `None` = uncapacitated (file sentinel -1).
    pub capacity: Option<f64>,
    /// Routing cost for shortest-path interdiction.
    pub cost: Option<f64>,
    /// Interdiction indicator written by the most recent solve.
    pub xbar: bool,
}

impl ArcAsset {
    /// Display label in the `(start, end)` style of the console reports.
    pub fn label(&self) -> String {
        format!("({}, {})", self.start, self.end)
    }
}

/// In-memory network topology with node and arc attribute tables.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<NodeAsset>,
    arcs: Vec<ArcAsset>,
    node_rows: HashMap<String, usize>,
    arc_rows: HashMap<(String, String), usize>,
    /// Re-derive arc capacity from risk on every arc score mutation.
    calc_cap: bool,
}

impl Topology {
    /// Build a topology from its two tables.
    ///
    /// Validates endpoint references and key uniqueness, clamps all scores,
    /// derives missing threat columns from centrality over the attackable
    /// subgraph, computes risk, and fills missing capacities as
    /// `RISK_MAX - risk`.
    pub fn from_tables(
        nodes: Vec<NodeInput>,
        arcs: Vec<ArcInput>,
        calc_cap: bool,
    ) -> NiraResult<Self> {
        let mut node_rows = HashMap::with_capacity(nodes.len());
        let mut node_assets = Vec::with_capacity(nodes.len());
        let mut missing_node_threat: Vec<usize> = Vec::new();
        let mut missing_arc_threat: Vec<usize> = Vec::new();
        for (row, input) in nodes.into_iter().enumerate() {
            if node_rows.insert(input.key.clone(), row).is_some() {
                return Err(NiraError::Validation(format!(
                    "duplicate node key '{}'",
                    input.key
                )));
            }
            if input.threat.is_none() {
                missing_node_threat.push(row);
            }
            let threat = clamp_score(input.threat.unwrap_or(1));
            let vulnerability = clamp_score(input.vulnerability);
            let consequence = clamp_score(input.consequence);
            node_assets.push(NodeAsset {
                key: input.key,
                attackable: input.attackable,
                threat,
                vulnerability,
                consequence,
                risk: risk_product(threat, vulnerability, consequence),
                supply_demand: input.supply_demand,
            });
        }

        let mut arc_rows = HashMap::with_capacity(arcs.len());
        let mut arc_assets = Vec::with_capacity(arcs.len());
        let mut missing_capacity: Vec<usize> = Vec::new();
        for (row, input) in arcs.into_iter().enumerate() {
            for endpoint in [&input.start, &input.end] {
                if !node_rows.contains_key(endpoint) {
                    return Err(NiraError::Topology(format!(
                        "arc ({}, {}) references unknown node '{}'",
                        input.start, input.end, endpoint
                    )));
                }
            }
            let key = (input.start.clone(), input.end.clone());
            if arc_rows.insert(key, row).is_some() {
                return Err(NiraError::Validation(format!(
                    "duplicate arc ({}, {})",
                    input.start, input.end
                )));
            }
            if input.threat.is_none() {
                missing_arc_threat.push(row);
            }
            let threat = clamp_score(input.threat.unwrap_or(1));
            let vulnerability = clamp_score(input.vulnerability);
            let consequence = clamp_score(input.consequence);
            let risk = risk_product(threat, vulnerability, consequence);
            if input.capacity.is_none() {
                missing_capacity.push(row);
            }
            let capacity = match input.capacity {
                Some(value) if value < 0.0 => None,
                other => other,
            };
            arc_assets.push(ArcAsset {
                start: input.start,
                end: input.end,
                attackable: input.attackable,
                threat,
                vulnerability,
                consequence,
                risk,
                capacity,
                cost: input.cost,
                xbar: false,
            });
        }

        let mut topology = Self {
            nodes: node_assets,
            arcs: arc_assets,
            node_rows,
            arc_rows,
            calc_cap,
        };
        topology.derive_missing_threat(&missing_node_threat, &missing_arc_threat);
        // Capacity derives from risk, so fill it only once threat is final.
        for row in missing_capacity {
            let risk = topology.arcs[row].risk;
            topology.arcs[row].capacity = Some((RISK_MAX - risk.min(RISK_MAX)) as f64);
        }
        Ok(topology)
    }

    fn derive_missing_threat(&mut self, node_rows: &[usize], arc_rows: &[usize]) {
        if !node_rows.is_empty() {
            let centrality = self.node_degree_centrality();
            for &row in node_rows {
                let scaled = (centrality[row] * THREAT_MAX as f64).round() as i64;
                self.nodes[row].threat = clamp_score(scaled);
            }
            self.recompute_node_risk();
        }
        if !arc_rows.is_empty() {
            let centrality = self.arc_betweenness_centrality();
            for &row in arc_rows {
                let scaled = (centrality[row] * THREAT_MAX as f64).round() as i64;
                self.arcs[row].threat = clamp_score(scaled);
            }
            self.recompute_arc_risk();
        }
    }

    pub fn nodes(&self) -> &[NodeAsset] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[ArcAsset] {
        &self.arcs
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn calc_cap(&self) -> bool {
        self.calc_cap
    }

    /// Row index for a node key.
    pub fn node_row(&self, key: &str) -> Option<usize> {
        self.node_rows.get(key).copied()
    }

    /// Row index for an arc key.
    pub fn arc_row(&self, start: &str, end: &str) -> Option<usize> {
        self.arc_rows.get(&(start.to_string(), end.to_string())).copied()
    }

    /// Display label for a row of the given table.
    pub fn asset_label(&self, class: AssetClass, row: usize) -> String {
        match class {
            AssetClass::Nodes => self.nodes[row].key.clone(),
            AssetClass::Arcs => self.arcs[row].label(),
        }
    }

    fn score_of(&self, class: AssetClass, row: usize, kind: ScoreKind) -> u8 {
        match (class, kind) {
            (AssetClass::Nodes, ScoreKind::Threat) => self.nodes[row].threat,
            (AssetClass::Nodes, ScoreKind::Vulnerability) => self.nodes[row].vulnerability,
            (AssetClass::Nodes, ScoreKind::Consequence) => self.nodes[row].consequence,
            (AssetClass::Arcs, ScoreKind::Threat) => self.arcs[row].threat,
            (AssetClass::Arcs, ScoreKind::Vulnerability) => self.arcs[row].vulnerability,
            (AssetClass::Arcs, ScoreKind::Consequence) => self.arcs[row].consequence,
        }
    }

    /// Current score column for one table.
    pub fn scores(&self, class: AssetClass, kind: ScoreKind) -> Vec<u8> {
        let len = self.len_of(class);
        (0..len).map(|row| self.score_of(class, row, kind)).collect()
    }

    /// Current risk column for one table.
    pub fn risks(&self, class: AssetClass) -> Vec<u32> {
        match class {
            AssetClass::Nodes => self.nodes.iter().map(|n| n.risk).collect(),
            AssetClass::Arcs => self.arcs.iter().map(|a| a.risk).collect(),
        }
    }

    /// Sum of risk over one table.
    pub fn risk_sum(&self, class: AssetClass) -> u32 {
        match class {
            AssetClass::Nodes => self.nodes.iter().map(|n| n.risk).sum(),
            AssetClass::Arcs => self.arcs.iter().map(|a| a.risk).sum(),
        }
    }

    /// Largest arc risk, used to size the interdiction big-M penalty.
    pub fn max_arc_risk(&self) -> u32 {
        self.arcs.iter().map(|a| a.risk).max().unwrap_or(0)
    }

    fn len_of(&self, class: AssetClass) -> usize {
        match class {
            AssetClass::Nodes => self.nodes.len(),
            AssetClass::Arcs => self.arcs.len(),
        }
    }

    /// Overwrite a whole score column. Values are clamped to the 1-5 scale
    /// and risk (and capacity, when enabled) is re-derived on the same call.
    pub fn set_scores(
        &mut self,
        class: AssetClass,
        kind: ScoreKind,
        values: &[i64],
    ) -> NiraResult<()> {
        let len = self.len_of(class);
        if values.len() != len {
            return Err(NiraError::Validation(format!(
                "{} {} column has {} rows, got {} values",
                class,
                kind,
                len,
                values.len()
            )));
        }
        for (row, &value) in values.iter().enumerate() {
            self.assign_score(class, row, kind, clamp_score(value));
        }
        self.finish_mutation(class);
        Ok(())
    }

    /// Overwrite one score cell, clamping and re-deriving like
    /// [`Topology::set_scores`].
    pub fn set_score_at(
        &mut self,
        class: AssetClass,
        row: usize,
        kind: ScoreKind,
        value: i64,
    ) -> NiraResult<()> {
        if row >= self.len_of(class) {
            return Err(NiraError::Validation(format!(
                "row {} out of range for {} table",
                row, class
            )));
        }
        self.assign_score(class, row, kind, clamp_score(value));
        self.finish_mutation(class);
        Ok(())
    }

    fn assign_score(&mut self, class: AssetClass, row: usize, kind: ScoreKind, value: u8) {
        match (class, kind) {
            (AssetClass::Nodes, ScoreKind::Threat) => self.nodes[row].threat = value,
            (AssetClass::Nodes, ScoreKind::Vulnerability) => {
                self.nodes[row].vulnerability = value
            }
            (AssetClass::Nodes, ScoreKind::Consequence) => self.nodes[row].consequence = value,
            (AssetClass::Arcs, ScoreKind::Threat) => self.arcs[row].threat = value,
            (AssetClass::Arcs, ScoreKind::Vulnerability) => self.arcs[row].vulnerability = value,
            (AssetClass::Arcs, ScoreKind::Consequence) => self.arcs[row].consequence = value,
        }
    }

    fn finish_mutation(&mut self, class: AssetClass) {
        match class {
            AssetClass::Nodes => self.recompute_node_risk(),
            AssetClass::Arcs => {
                self.recompute_arc_risk();
                if self.calc_cap {
                    self.recompute_arc_capacity();
                }
            }
        }
    }

    fn recompute_node_risk(&mut self) {
        for node in &mut self.nodes {
            node.risk = risk_product(node.threat, node.vulnerability, node.consequence);
        }
    }

    fn recompute_arc_risk(&mut self) {
        for arc in &mut self.arcs {
            arc.risk = risk_product(arc.threat, arc.vulnerability, arc.consequence);
        }
    }

    fn recompute_arc_capacity(&mut self) {
        for arc in &mut self.arcs {
            arc.capacity = Some((RISK_MAX - arc.risk.min(RISK_MAX)) as f64);
        }
    }

    /// Reset every interdiction indicator.
    pub fn clear_xbar(&mut self) {
        for arc in &mut self.arcs {
            arc.xbar = false;
        }
    }

    /// Stamp the interdiction indicators from a solved plan; the slice is
    /// aligned with arc table row order.
    pub fn set_xbar(&mut self, flags: &[bool]) -> NiraResult<()> {
        if flags.len() != self.arcs.len() {
            return Err(NiraError::Validation(format!(
                "xbar column has {} rows, got {} values",
                self.arcs.len(),
                flags.len()
            )));
        }
        for (arc, &flag) in self.arcs.iter_mut().zip(flags) {
            arc.xbar = flag;
        }
        Ok(())
    }

    /// Number of currently interdicted arcs.
    pub fn xbar_count(&self) -> usize {
        self.arcs.iter().filter(|a| a.xbar).count()
    }

    /// Select the most critical attackable row of a table.
    ///
    /// For [`RankAttribute::Threat`] the attack-desirability rule applies:
    /// lowest threat, then largest vulnerability, then largest risk. For
    /// every other attribute: largest value, then largest risk. Ties break
    /// by table order. Returns `None` when the table has no attackable row.
    pub fn find_critical_row(
        &self,
        class: AssetClass,
        attribute: RankAttribute,
    ) -> Option<(usize, u32)> {
        let len = self.len_of(class);
        let mut best: Option<usize> = None;
        for row in 0..len {
            let attackable = match class {
                AssetClass::Nodes => self.nodes[row].attackable,
                AssetClass::Arcs => self.arcs[row].attackable,
            };
            if !attackable {
                continue;
            }
            best = Some(match best {
                None => row,
                Some(current) => {
                    if self.outranks(class, attribute, row, current) {
                        row
                    } else {
                        current
                    }
                }
            });
        }
        best.map(|row| (row, self.rank_value(class, row, attribute)))
    }

    fn rank_value(&self, class: AssetClass, row: usize, attribute: RankAttribute) -> u32 {
        match attribute {
            RankAttribute::Threat => self.score_of(class, row, ScoreKind::Threat) as u32,
            RankAttribute::Vulnerability => {
                self.score_of(class, row, ScoreKind::Vulnerability) as u32
            }
            RankAttribute::Consequence => self.score_of(class, row, ScoreKind::Consequence) as u32,
            RankAttribute::Risk => match class {
                AssetClass::Nodes => self.nodes[row].risk,
                AssetClass::Arcs => self.arcs[row].risk,
            },
        }
    }

    fn outranks(
        &self,
        class: AssetClass,
        attribute: RankAttribute,
        candidate: usize,
        incumbent: usize,
    ) -> bool {
        let risk = |row| self.rank_value(class, row, RankAttribute::Risk);
        match attribute {
            RankAttribute::Threat => {
                // Attack desirability: low threat first, then exploitable
                // vulnerability, then standing risk.
                let t = |row| self.score_of(class, row, ScoreKind::Threat);
                let v = |row| self.score_of(class, row, ScoreKind::Vulnerability);
                (t(candidate), v(incumbent), risk(incumbent))
                    < (t(incumbent), v(candidate), risk(candidate))
            }
            _ => {
                let value = |row| self.rank_value(class, row, attribute);
                (value(incumbent), risk(incumbent)) < (value(candidate), risk(candidate))
            }
        }
    }

    /// Normalized degree centrality per node table row.
    ///
    /// Computed over the subgraph induced by attackable nodes and divided by
    /// the post-filter maximum, so at least one attackable node scores 1.0.
    /// Rows outside the subgraph are zero; a degenerate subgraph yields all
    /// zeros.
    pub fn node_degree_centrality(&self) -> Vec<f64> {
        centrality::node_degree_centrality(self)
    }

    /// Normalized edge betweenness centrality per arc table row, over the
    /// same attackable subgraph and with the same normalization as
    /// [`Topology::node_degree_centrality`].
    pub fn arc_betweenness_centrality(&self) -> Vec<f64> {
        centrality::arc_betweenness_centrality(self)
    }

    /// Articulation points of the attackable subgraph, in node table order.
    pub fn articulation_points(&self) -> Vec<String> {
        centrality::articulation_points(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, attackable: bool, v: i64, c: i64, t: Option<i64>) -> NodeInput {
        NodeInput {
            key: key.to_string(),
            attackable,
            vulnerability: v,
            consequence: c,
            threat: t,
            supply_demand: None,
        }
    }

    fn arc(start: &str, end: &str, attackable: bool, v: i64, c: i64, t: Option<i64>) -> ArcInput {
        ArcInput {
            start: start.to_string(),
            end: end.to_string(),
            attackable,
            vulnerability: v,
            consequence: c,
            threat: t,
            capacity: None,
            cost: None,
        }
    }

    fn triangle() -> Topology {
        Topology::from_tables(
            vec![
                node("n1", true, 2, 3, Some(1)),
                node("n2", true, 4, 2, Some(3)),
                node("n3", true, 5, 5, Some(2)),
            ],
            vec![
                arc("n1", "n2", true, 2, 2, Some(2)),
                arc("n2", "n3", true, 3, 4, Some(1)),
                arc("n1", "n3", false, 1, 1, Some(1)),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_risk_is_triple_product() {
        let topology = triangle();
        assert_eq!(topology.nodes()[0].risk, 6);
        assert_eq!(topology.nodes()[1].risk, 24);
        assert_eq!(topology.nodes()[2].risk, 50);
        assert_eq!(topology.arcs()[0].risk, 8);
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let err = Topology::from_tables(
            vec![node("n1", true, 1, 1, Some(1))],
            vec![arc("n1", "nx", true, 1, 1, Some(1))],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, NiraError::Topology(_)));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let err = Topology::from_tables(
            vec![node("n1", true, 1, 1, Some(1)), node("n1", true, 1, 1, Some(1))],
            vec![],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, NiraError::Validation(_)));
    }

    #[test]
    fn test_set_scores_clamps_and_rederives() {
        let mut topology = triangle();
        topology
            .set_scores(AssetClass::Nodes, ScoreKind::Threat, &[9, 0, 4])
            .unwrap();
        let threats: Vec<u8> = topology.nodes().iter().map(|n| n.threat).collect();
        assert_eq!(threats, vec![5, 1, 4]);
        assert_eq!(topology.nodes()[0].risk, 30);
        assert_eq!(topology.nodes()[1].risk, 8);
    }

    #[test]
    fn test_set_scores_length_mismatch() {
        let mut topology = triangle();
        let err = topology
            .set_scores(AssetClass::Nodes, ScoreKind::Threat, &[1, 2])
            .unwrap_err();
        assert!(matches!(err, NiraError::Validation(_)));
    }

    #[test]
    fn test_capacity_fill_and_recompute() {
        let mut inputs = vec![arc("n1", "n2", true, 2, 2, Some(2))];
        inputs[0].capacity = None;
        let mut topology = Topology::from_tables(
            vec![node("n1", true, 1, 1, Some(1)), node("n2", true, 1, 1, Some(1))],
            inputs,
            true,
        )
        .unwrap();
        // risk 8 -> capacity 117
        assert_eq!(topology.arcs()[0].capacity, Some(117.0));
        topology
            .set_score_at(AssetClass::Arcs, 0, ScoreKind::Threat, 5)
            .unwrap();
        assert_eq!(topology.arcs()[0].risk, 20);
        assert_eq!(topology.arcs()[0].capacity, Some(105.0));
    }

    #[test]
    fn test_negative_capacity_is_uncapacitated() {
        let mut input = arc("n1", "n2", true, 1, 1, Some(1));
        input.capacity = Some(-1.0);
        let topology = Topology::from_tables(
            vec![node("n1", true, 1, 1, Some(1)), node("n2", true, 1, 1, Some(1))],
            vec![input],
            false,
        )
        .unwrap();
        assert_eq!(topology.arcs()[0].capacity, None);
    }

    #[test]
    fn test_critical_asset_attack_desirability() {
        let topology = triangle();
        // Threat rule: lowest threat first -> n1 (T=1).
        let (row, value) = topology
            .find_critical_row(AssetClass::Nodes, RankAttribute::Threat)
            .unwrap();
        assert_eq!(topology.nodes()[row].key, "n1");
        assert_eq!(value, 1);
        // Risk rule: largest risk -> n3.
        let (row, value) = topology
            .find_critical_row(AssetClass::Nodes, RankAttribute::Risk)
            .unwrap();
        assert_eq!(topology.nodes()[row].key, "n3");
        assert_eq!(value, 50);
    }

    #[test]
    fn test_critical_asset_skips_non_attackable() {
        let topology = Topology::from_tables(
            vec![
                node("n1", false, 5, 5, Some(5)),
                node("n2", true, 1, 1, Some(1)),
                node("n3", true, 1, 1, Some(1)),
            ],
            vec![arc("n1", "n2", true, 1, 1, Some(1)), arc("n2", "n3", true, 1, 1, Some(1))],
            false,
        )
        .unwrap();
        let (row, _) = topology
            .find_critical_row(AssetClass::Nodes, RankAttribute::Risk)
            .unwrap();
        assert_ne!(topology.nodes()[row].key, "n1");
    }

    #[test]
    fn test_critical_asset_none_when_nothing_attackable() {
        let topology = Topology::from_tables(
            vec![node("n1", false, 1, 1, Some(1)), node("n2", false, 1, 1, Some(1))],
            vec![arc("n1", "n2", false, 1, 1, Some(1))],
            false,
        )
        .unwrap();
        assert!(topology
            .find_critical_row(AssetClass::Nodes, RankAttribute::Risk)
            .is_none());
    }

    #[test]
    fn test_threat_derived_from_centrality() {
        // Star: hub n1 touches every leaf, so hub centrality is 1.0 -> T=5;
        // leaves are 1/3 of the hub -> round(5/3) = 2.
        let topology = Topology::from_tables(
            vec![
                node("n1", true, 1, 1, None),
                node("n2", true, 1, 1, None),
                node("n3", true, 1, 1, None),
                node("n4", true, 1, 1, None),
            ],
            vec![
                arc("n1", "n2", true, 1, 1, Some(1)),
                arc("n1", "n3", true, 1, 1, Some(1)),
                arc("n1", "n4", true, 1, 1, Some(1)),
            ],
            false,
        )
        .unwrap();
        assert_eq!(topology.nodes()[0].threat, 5);
        assert_eq!(topology.nodes()[1].threat, 2);
        assert_eq!(topology.nodes()[0].risk, 5);
    }

    #[test]
    fn test_assets_serialize() {
        let topology = triangle();
        let json = serde_json::to_string(&topology.nodes()[0]).unwrap();
        assert!(json.contains("\"key\":\"n1\""));
        assert!(json.contains("\"risk\":6"));
        let back: NodeAsset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topology.nodes()[0]);
    }

    #[test]
    fn test_xbar_stamp_and_clear() {
        let mut topology = triangle();
        topology.set_xbar(&[true, false, false]).unwrap();
        assert_eq!(topology.xbar_count(), 1);
        assert!(topology.arcs()[0].xbar);
        topology.clear_xbar();
        assert_eq!(topology.xbar_count(), 0);
    }
}
