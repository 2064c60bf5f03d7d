//! Greedy defender: vulnerability and consequence reduction under a move
//! budget.

use nira_core::{AssetClass, NiraResult, RankAttribute, ScoreKind, Topology, CONS_INC, VULN_INC};

use crate::attacker::GreedyStep;
use crate::report::{banner, RULE};

/// Defender operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefendMode {
    /// Preparedness: reduce vulnerability.
    Prepare,
    /// Mitigation: reduce consequence.
    Mitigate,
}

/// Greedy defender.
///
/// Each iteration selects the most critical attackable asset for the
/// targeted attribute (largest value, then largest risk, table order on
/// ties) and lowers that attribute by one, floored at the scale minimum.
#[derive(Debug, Clone)]
pub struct Defender {
    budget: usize,
}

impl Defender {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Run `budget` vulnerability reductions on one asset table.
    pub fn minimise_vulnerability(
        &self,
        topology: &mut Topology,
        class: AssetClass,
    ) -> NiraResult<Vec<GreedyStep>> {
        self.reduce(topology, class, ScoreKind::Vulnerability, VULN_INC)
    }

    /// Run `budget` consequence reductions on one asset table.
    pub fn minimise_consequence(
        &self,
        topology: &mut Topology,
        class: AssetClass,
    ) -> NiraResult<Vec<GreedyStep>> {
        self.reduce(topology, class, ScoreKind::Consequence, CONS_INC)
    }

    fn reduce(
        &self,
        topology: &mut Topology,
        class: AssetClass,
        kind: ScoreKind,
        decrement: u8,
    ) -> NiraResult<Vec<GreedyStep>> {
        let mut steps = Vec::with_capacity(self.budget);
        for _ in 0..self.budget {
            let Some((row, value)) = topology.find_critical_row(class, RankAttribute::from(kind))
            else {
                break;
            };
            let before = value as u8;
            // The setter floors the score at the scale minimum.
            topology.set_score_at(class, row, kind, before as i64 - decrement as i64)?;
            let after = topology.scores(class, kind)[row];
            steps.push(GreedyStep {
                label: topology.asset_label(class, row),
                before,
                after,
                risk_sum: topology.risk_sum(class),
            });
        }
        Ok(steps)
    }
}

/// Console report for a defender run over one asset class.
pub fn defence_report(mode: DefendMode, class: AssetClass, steps: &[GreedyStep]) -> String {
    let (title, action, symbol) = match mode {
        DefendMode::Prepare => ("Defender: Preparedness Mode", "Vulnerability Reduction", "V"),
        DefendMode::Mitigate => ("Defender: Mitigation Mode", "Consequence Mitigation", "C"),
    };
    let target = match class {
        AssetClass::Nodes => "Node",
        AssetClass::Arcs => "Arc",
    };
    let mut out = String::new();
    out.push('\n');
    out.push_str(&banner(title));
    out.push('\n');
    out.push_str(&format!("{target} {action}:\n"));
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "#\t{target}\t\t{symbol}(before)\t{symbol}(after)\tR_sum\n"
    ));
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
    use nira_core::{ArcInput, NodeInput, VULN_MIN};

    fn node(key: &str, attackable: bool, t: i64, v: i64, c: i64) -> NodeInput {
        NodeInput {
            key: key.to_string(),
            attackable,
            vulnerability: v,
            consequence: c,
            threat: Some(t),
            supply_demand: None,
        }
    }

    fn arc(start: &str, end: &str, v: i64, c: i64) -> ArcInput {
        ArcInput {
            start: start.to_string(),
            end: end.to_string(),
            attackable: true,
            vulnerability: v,
            consequence: c,
            threat: Some(1),
            capacity: Some(-1.0),
            cost: None,
        }
    }

    #[test]
    fn test_reduces_most_vulnerable_first() {
        let mut topology = Topology::from_tables(
            vec![node("a", true, 2, 5, 2), node("b", true, 2, 3, 2)],
            vec![],
            false,
        )
        .unwrap();
        let steps = Defender::new(1)
            .minimise_vulnerability(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert_eq!(steps[0].label, "a");
        assert_eq!(steps[0].before, 5);
        assert_eq!(steps[0].after, 4);
        assert_eq!(topology.nodes()[0].vulnerability, 4);
    }

    #[test]
    fn test_floors_at_minimum() {
        let mut topology = Topology::from_tables(
            vec![node("a", true, 1, 1, 1)],
            vec![],
            false,
        )
        .unwrap();
        let steps = Defender::new(3)
            .minimise_vulnerability(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(topology.nodes()[0].vulnerability, VULN_MIN);
        for step in &steps {
            assert!(step.after <= step.before);
        }
    }

    #[test]
    fn test_consequence_mode_on_arcs() {
        let mut topology = Topology::from_tables(
            vec![node("a", true, 1, 1, 1), node("b", true, 1, 1, 1)],
            vec![arc("a", "b", 2, 4), arc("b", "a", 2, 3)],
            false,
        )
        .unwrap();
        let steps = Defender::new(2)
            .minimise_consequence(&mut topology, AssetClass::Arcs)
            .unwrap();
        assert_eq!(steps[0].label, "(a, b)");
        assert_eq!(steps[0].before, 4);
        // Risk totals must be non-increasing as consequences fall.
        assert!(steps[1].risk_sum <= steps[0].risk_sum);
    }

    #[test]
    fn test_skips_non_attackable() {
        let mut topology = Topology::from_tables(
            vec![node("a", false, 1, 5, 5), node("b", true, 1, 2, 2)],
            vec![],
            false,
        )
        .unwrap();
        let steps = Defender::new(1)
            .minimise_vulnerability(&mut topology, AssetClass::Nodes)
            .unwrap();
        assert_eq!(steps[0].label, "b");
        // The non-attackable row keeps its score.
        assert_eq!(topology.nodes()[0].vulnerability, 5);
    }

    #[test]
    fn test_report_layout() {
        let steps = vec![GreedyStep {
            label: "a".into(),
            before: 4,
            after: 3,
            risk_sum: 10,
        }];
        let text = defence_report(DefendMode::Prepare, AssetClass::Nodes, &steps);
        assert!(text.contains("Defender: Preparedness Mode"));
        assert!(text.contains("V(before)"));
        let text = defence_report(DefendMode::Mitigate, AssetClass::Nodes, &steps);
        assert!(text.contains("Defender: Mitigation Mode"));
        assert!(text.contains("C(before)"));
    }
}
