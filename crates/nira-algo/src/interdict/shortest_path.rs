//! Bilevel shortest-path interdiction.
//!
//! Follower: route one unit from the supply node to the demand node at
//! minimum total arc `cost` (a unit-flow LP with conservation and
//! `y >= 0`, no capacities). Leader: disable up to `K` attackable arcs to
//! make that path as expensive as possible.
//!
//! The dual has only node potentials:
//!
//! ```text
//! max  rho_sink - rho_source
//! s.t. rho_j - rho_i <= cost_ij + M * x_ij * attackable_ij
//!      sum x_ij <= K,  x binary on attackable arcs
//! ```
//!
//! Interdicting an arc inflates its effective cost by `M`, lengthening
//! every path through it.

use good_lp::{constraint, variable, variables, Expression, Variable};
use tracing::debug;

use nira_core::{NiraError, NiraResult, Topology};

use super::{
    solve_and_extract, DualResult, InterdictionModel, NetworkData, PrimalResult, Sense,
    SolverBackend,
};

pub struct ShortestPathInterdict<'t> {
    topology: &'t mut Topology,
    attacks: usize,
    backend: SolverBackend,
    verbose: bool,
}

impl<'t> ShortestPathInterdict<'t> {
    pub fn new(
        topology: &'t mut Topology,
        attacks: usize,
        backend: SolverBackend,
        verbose: bool,
    ) -> Self {
        Self {
            topology,
            attacks,
            backend,
            verbose,
        }
    }

    fn arc_costs(data: &NetworkData) -> NiraResult<Vec<f64>> {
        data.arcs
            .iter()
            .map(|arc| {
                arc.cost.ok_or_else(|| {
                    NiraError::Validation(format!(
                        "arc {} has no cost; shortest-path interdiction requires a \
                         cost on every arc",
                        arc.label
                    ))
                })
            })
            .collect()
    }

    fn solve_dual(
        &self,
        data: &NetworkData,
        costs: &[f64],
        source: usize,
        sink: usize,
    ) -> NiraResult<(f64, Vec<bool>)> {
        let mut vars = variables!();
        let rho: Vec<Variable> = (0..data.node_count()).map(|_| vars.add(variable())).collect();
        let x: Vec<Option<Variable>> = data
            .arcs
            .iter()
            .map(|arc| arc.attackable.then(|| vars.add(variable().binary())))
            .collect();

        let objective = rho[sink] - rho[source];

        let mut constraints = Vec::new();
        for (k, arc) in data.arcs.iter().enumerate() {
            let mut expr = rho[arc.end] - rho[arc.start];
            if let Some(xv) = x[k] {
                expr -= data.big_m * xv;
            }
            constraints.push(constraint!(expr <= costs[k]));
        }

        let x_list: Vec<Variable> = x.iter().flatten().copied().collect();
        if !x_list.is_empty() {
            let mut budget = Expression::from(0.0);
            for xv in &x_list {
                budget += *xv;
            }
            constraints.push(constraint!(budget <= self.attacks as f64));
        }

        if self.verbose {
            debug!(
                nodes = data.node_count(),
                arcs = data.arcs.len(),
                attacks = self.attacks,
                "solving shortest-path interdiction dual"
            );
        }

        let mut wanted = vec![rho[sink], rho[source]];
        wanted.extend(x_list.iter().copied());
        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Maximise,
            objective,
            constraints,
            &wanted,
        )?;
        let dual_objective = values[0] - values[1];
        let x_vals = &values[2..];

        let mut flags = vec![false; data.arcs.len()];
        let mut slot = 0;
        for (k, arc) in data.arcs.iter().enumerate() {
            if arc.attackable {
                flags[k] = x_vals[slot] > 0.5;
                slot += 1;
            }
        }
        Ok((dual_objective, flags))
    }

    fn solve_primal(
        &self,
        data: &NetworkData,
        costs: &[f64],
        source: usize,
        sink: usize,
        flags: &[bool],
    ) -> NiraResult<PrimalResult> {
        let mut vars = variables!();
        let y: Vec<Variable> = data
            .arcs
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let mut objective = Expression::from(0.0);
        for (k, &flag) in flags.iter().enumerate() {
            let penalty = if flag { data.big_m } else { 0.0 };
            objective += (costs[k] + penalty) * y[k];
        }

        let mut net: Vec<Expression> = (0..data.node_count())
            .map(|_| Expression::from(0.0))
            .collect();
        for (k, arc) in data.arcs.iter().enumerate() {
            net[arc.end] += y[k];
            net[arc.start] -= y[k];
        }

        let mut constraints = Vec::new();
        for (n, expr) in net.into_iter().enumerate() {
            // Unit flow: the source emits one unit, the sink absorbs it.
            let balance = if n == source {
                -1.0
            } else if n == sink {
                1.0
            } else {
                0.0
            };
            constraints.push(constraint!(expr == balance));
        }

        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Minimise,
            objective,
            constraints,
            &y,
        )?;

        let mut objective_value = 0.0;
        for (k, &flag) in flags.iter().enumerate() {
            let penalty = if flag { data.big_m } else { 0.0 };
            objective_value += (costs[k] + penalty) * values[k];
        }

        Ok(PrimalResult {
            objective: objective_value,
            flows: data
                .arcs
                .iter()
                .zip(&values)
                .map(|(arc, &flow)| (arc.label.clone(), flow))
                .collect(),
            unsat_supply: Vec::new(),
            unsat_demand: Vec::new(),
        })
    }
}

impl InterdictionModel for ShortestPathInterdict<'_> {
    fn set_attacks(&mut self, attacks: usize) {
        self.attacks = attacks;
    }

    fn attacks(&self) -> usize {
        self.attacks
    }

    fn solve(&mut self) -> NiraResult<(PrimalResult, DualResult)> {
        let data = NetworkData::from_topology(self.topology);
        let costs = Self::arc_costs(&data)?;
        let (source, sink) = data.source_sink()?;

        let (dual_objective, flags) = self.solve_dual(&data, &costs, source, sink)?;
        self.topology.set_xbar(&flags)?;

        let interdicted = data
            .arcs
            .iter()
            .zip(&flags)
            .filter(|(_, &flag)| flag)
            .map(|(arc, _)| arc.label.clone())
            .collect();

        let stamped: Vec<bool> = self.topology.arcs().iter().map(|a| a.xbar).collect();
        let primal = self.solve_primal(&data, &costs, source, sink, &stamped)?;
        Ok((
            primal,
            DualResult {
                objective: dual_objective,
                interdicted,
            },
        ))
    }

    fn objective_label(&self) -> &'static str {
        "Path cost"
    }
}
