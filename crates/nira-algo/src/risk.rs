//! Risk model over a topology: score setters, risk vectors, and the
//! assessment/critical-asset console reports.
//!
//! The risk method follows Lewis, T. G. (2019), *Critical Infrastructure
//! Protection in Homeland Security: Defending a Networked Nation* (3rd
//! edn.): ordinal threat, vulnerability, and consequence scores with risk
//! as their product, threat derived from network centrality when not
//! supplied.

use nira_core::{AssetClass, NiraResult, RankAttribute, ScoreKind, Topology};

use crate::report::RULE;

/// Mutable risk view over a topology.
///
/// The underlying [`Topology`] already derives missing threat columns and
/// keeps risk consistent on every write; this wrapper adds the per-score
/// setters and read paths the greedy models and the CLI work through.
pub struct RiskModel<'t> {
    topology: &'t mut Topology,
}

impl<'t> RiskModel<'t> {
    pub fn new(topology: &'t mut Topology) -> Self {
        Self { topology }
    }

    pub fn topology(&self) -> &Topology {
        self.topology
    }

    /// Overwrite the threat column of one table. The input length must
    /// match the table; values are clamped to the 1-5 scale and risk is
    /// recomputed on the same call.
    pub fn set_threat(&mut self, class: AssetClass, values: &[i64]) -> NiraResult<()> {
        self.topology.set_scores(class, ScoreKind::Threat, values)
    }

    /// Overwrite the vulnerability column of one table.
    pub fn set_vulnerability(&mut self, class: AssetClass, values: &[i64]) -> NiraResult<()> {
        self.topology
            .set_scores(class, ScoreKind::Vulnerability, values)
    }

    /// Overwrite the consequence column of one table.
    pub fn set_consequence(&mut self, class: AssetClass, values: &[i64]) -> NiraResult<()> {
        self.topology
            .set_scores(class, ScoreKind::Consequence, values)
    }

    /// Freshly consistent risk vector for one table.
    pub fn get_risk(&self, class: AssetClass) -> Vec<u32> {
        self.topology.risks(class)
    }
}

/// Per-asset `T V C R` listing for both tables, in the layout of the
/// original console output (arcs additionally show capacity `Q`).
pub fn risk_assessment_report(topology: &Topology) -> String {
    let mut out = String::new();
    out.push_str("Network Topology:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str("Node\t\tT\tV\tC\tR\n");
    out.push_str(RULE);
    out.push('\n');
    for node in topology.nodes() {
        out.push_str(&format!(
            "{:<12}\t{}\t{}\t{}\t{}\n",
            node.key, node.threat, node.vulnerability, node.consequence, node.risk
        ));
    }
    out.push_str(RULE);
    out.push('\n');

    out.push_str(RULE);
    out.push('\n');
    out.push_str("Arc\t\tT\tV\tC\tR\tQ\n");
    out.push_str(RULE);
    out.push('\n');
    for arc in topology.arcs() {
        let capacity = match arc.capacity {
            Some(value) => format!("{value:.0}"),
            None => "-1".to_string(),
        };
        out.push_str(&format!(
            "{:<12}\t{}\t{}\t{}\t{}\t{}\n",
            arc.label(),
            arc.threat,
            arc.vulnerability,
            arc.consequence,
            arc.risk,
            capacity
        ));
    }
    out.push_str(RULE);
    out.push('\n');
    out.push_str("T = Threat (1-5)\n");
    out.push_str("V = Vulnerability (1-5)\n");
    out.push_str("C = Consequence (1-5)\n");
    out.push_str("R = Risk (T x V x C)\n");
    out.push_str("Q = Capacity\n");
    out
}

fn critical_line(topology: &Topology, class: AssetClass, attribute: RankAttribute) -> String {
    match topology.find_critical_row(class, attribute) {
        Some((row, value)) => {
            format!("{:<12}\t{}", topology.asset_label(class, row), value)
        }
        None => "n/a".to_string(),
    }
}

/// Critical-asset listing: the most critical attackable node and arc per
/// attribute, plus the articulation points of the attackable subgraph.
pub fn critical_assets_report(topology: &Topology) -> String {
    let mut out = String::new();
    out.push_str("\nCritical Assets:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str("                                 Index\t\tValue\n");
    out.push_str(RULE);
    out.push('\n');

    let rows = [
        ("Node with largest threat:        ", RankAttribute::Threat),
        ("Node with largest vulnerability: ", RankAttribute::Vulnerability),
        ("Node with largest consequence:   ", RankAttribute::Consequence),
        ("Node with largest risk:          ", RankAttribute::Risk),
    ];
    for (label, attribute) in rows {
        out.push_str(label);
        out.push_str(&critical_line(topology, AssetClass::Nodes, attribute));
        out.push('\n');
    }
    out.push('\n');

    let rows = [
        ("Arc with largest threat:         ", RankAttribute::Threat),
        ("Arc with largest vulnerability:  ", RankAttribute::Vulnerability),
        ("Arc with largest consequence:    ", RankAttribute::Consequence),
        ("Arc with largest risk:           ", RankAttribute::Risk),
    ];
    for (label, attribute) in rows {
        out.push_str(label);
        out.push_str(&critical_line(topology, AssetClass::Arcs, attribute));
        out.push('\n');
    }

    let articulation = topology.articulation_points();
    if articulation.is_empty() {
        out.push_str("\nArticulation points: none\n");
    } else {
        out.push_str(&format!(
            "\nArticulation points: {}\n",
            articulation.join(", ")
        ));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}
