//! Greedy attacker: threat maximization under a move budget.

use serde::Serialize;

use nira_core::{AssetClass, NiraResult, ScoreKind, Topology, THREAT_INC, THREAT_MAX};

use crate::report::{banner, RULE};

/// One recorded greedy move: the selected asset, the mutated score before
/// and after, and the table's risk total after the move.
#[derive(Debug, Clone, Serialize)]
pub struct GreedyStep {
    pub label: String,
    pub before: u8,
    pub after: u8,
    pub risk_sum: u32,
}

/// Greedy threat-maximizing attacker.
///
/// Each iteration tentatively raises every attackable row's threat by one
/// (capped at [`THREAT_MAX`]) and commits only the row with the largest
/// *relative* risk increase `(r_new - r_old) / r_old`. The relative gain
/// keeps the attacker from always piling onto the asset that already holds
/// the most mass, which spreads attacks across a heterogeneous topology.
#[derive(Debug, Clone)]
pub struct Attacker {
    budget: usize,
}

impl Attacker {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Run `budget` greedy threat increments on one asset table, mutating
    /// the topology in place. Returns one step record per committed move.
    pub fn maximise_threat(
        &self,
        topology: &mut Topology,
        class: AssetClass,
    ) -> NiraResult<Vec<GreedyStep>> {
        let mut steps = Vec::with_capacity(self.budget);
        for _ in 0..self.budget {
            let Some(row) = self.select_row(topology, class) else {
                // Nothing attackable: no move to record.
                break;
            };
            // Snapshot before touching the table; the setter below clamps
            // and re-derives risk.
            let before = topology.scores(class, ScoreKind::Threat)[row];
            topology.set_score_at(
                class,
                row,
                ScoreKind::Threat,
                before as i64 + THREAT_INC as i64,
            )?;
            let after = topology.scores(class, ScoreKind::Threat)[row];
            steps.push(GreedyStep {
                label: topology.asset_label(class, row),
                before,
                after,
                risk_sum: topology.risk_sum(class),
            });
        }
        Ok(steps)
    }

    fn select_row(&self, topology: &Topology, class: AssetClass) -> Option<usize> {
        let threats = topology.scores(class, ScoreKind::Threat);
        let vulns = topology.scores(class, ScoreKind::Vulnerability);
        let cons = topology.scores(class, ScoreKind::Consequence);
        let risks = topology.risks(class);
        let attackable: Vec<bool> = match class {
            AssetClass::Nodes => topology.nodes().iter().map(|n| n.attackable).collect(),
            AssetClass::Arcs => topology.arcs().iter().map(|a| a.attackable).collect(),
        };

        let mut best: Option<(usize, f64)> = None;
        for row in 0..risks.len() {
            if !attackable[row] {
                continue;
            }
            let r_old = risks[row];
            let delta = if r_old == 0 {
                // Degenerate zero-risk row: no relative gain to measure.
                0.0
            } else {
                let t_new = (threats[row] + THREAT_INC).min(THREAT_MAX);
                let r_new = t_new as u32 * vulns[row] as u32 * cons[row] as u32;
                (r_new - r_old) as f64 / r_old as f64
            };
            match best {
                Some((_, incumbent)) if delta <= incumbent => {}
                _ => best = Some((row, delta)),
            }
        }
        best.map(|(row, _)| row)
    }
}

/// Console report for a threat-mode run over one asset class.
pub fn threat_report(class: AssetClass, steps: &[GreedyStep]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&banner("Attacker: Threat Mode"));
    out.push('\n');
    let target = match class {
        AssetClass::Nodes => "Node",
        AssetClass::Arcs => "Arc",
    };
    out.push_str(&format!(
        "Maximise Threat by Exploiting {target} Vulnerabilities:\n"
    ));
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("#\t{target}\t\tT(before)\tT(after)\tR_sum\n"));
    out.push_str(RULE);
    out.push('\n');
    for (it, step) in steps.iter().enumerate() {
        out.push_str(&format!(
            "{}\t{:<12}\t{}\t\t{}\t\t{}\n",
            it, step.label, step.before, step.after, step.risk_sum
        ));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nira_core::{ArcInput, NodeInput};

    fn node(key: &str, t: i64, v: i64, c: i64) -> NodeInput {
        NodeInput {
            key: key.to_string(),
            attackable: true,
            vulnerability: v,
            consequence: c,
            threat: Some(t),
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

    #[test]
    fn test_relative_gain_selection() {
        // b has the larger absolute gain (+20 vs +6) but a the larger
        // relative one (6/6 = 1.0 vs 20/80 = 0.25).
        let mut topology = Topology::from_tables(
            vec![node("a", 1, 2, 3), node("b", 4, 4, 5)],
            vec![arc("a", "b")],
            false,
        )
        .unwrap();
        let steps = Attacker::new(1)
            .maximise_threat(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].label, "a");
        assert_eq!(steps[0].before, 1);
        assert_eq!(steps[0].after, 2);
        assert_eq!(steps[0].risk_sum, 12 + 80);
    }

    #[test]
    fn test_threat_caps_at_max() {
        let mut topology = Topology::from_tables(
            vec![node("a", 5, 5, 5)],
            vec![],
            false,
        )
        .unwrap();
        let steps = Attacker::new(3)
            .maximise_threat(&mut topology, AssetClass::Nodes)
            .unwrap();
        // One action per budget step even though the cap is already hit.
        assert_eq!(steps.len(), 3);
        for step in &steps {
            assert_eq!(step.before, 5);
            assert_eq!(step.after, 5);
        }
        assert_eq!(topology.nodes()[0].threat, THREAT_MAX);
    }

    #[test]
    fn test_threat_is_non_decreasing_on_selected_rows() {
        let mut topology = Topology::from_tables(
            vec![node("a", 2, 3, 3), node("b", 3, 2, 4)],
            vec![arc("a", "b")],
            false,
        )
        .unwrap();
        let steps = Attacker::new(4)
            .maximise_threat(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert_eq!(steps.len(), 4);
        for step in &steps {
            assert!(step.after >= step.before);
        }
    }

    #[test]
    fn test_no_attackable_rows_records_nothing() {
        let mut topology = Topology::from_tables(
            vec![NodeInput {
                key: "a".into(),
                attackable: false,
                vulnerability: 1,
                consequence: 1,
                threat: Some(1),
                supply_demand: None,
            }],
            vec![],
            false,
        )
        .unwrap();
        let steps = Attacker::new(2)
            .maximise_threat(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_report_layout() {
        let steps = vec![GreedyStep {
            label: "(a, b)".into(),
            before: 2,
            after: 3,
            risk_sum: 42,
        }];
        let text = threat_report(AssetClass::Arcs, &steps);
        assert!(text.contains("Attacker: Threat Mode"));
        assert!(text.contains("T(before)"));
        assert!(text.contains("(a, b)"));
    }
}
