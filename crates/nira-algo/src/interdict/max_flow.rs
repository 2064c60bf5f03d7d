//! Bilevel max-flow interdiction.
//!
//! Follower: classical max-flow LP from the supply node to the demand node
//! over arc capacities, closed by an artificial uncapacitated sink->source
//! arc carrying the flow value. Leader: disable up to `K` attackable arcs
//! to minimize that value.
//!
//! The dual has a free potential `rho` per node and a capacity dual
//! `pi >= 0` per capacitated arc:
//!
//! ```text
//! min  sum capacity_ij * pi_ij
//! s.t. rho_j - rho_i + pi_ij + M * x_ij * attackable_ij >= 0
//!      rho_source - rho_sink >= 1              (artificial arc)
//!      sum x_ij <= K,  x binary on attackable arcs
//! ```
//!
//! With `x = 0` this is the min-cut LP; setting `x_ij = 1` releases the
//! arc from the cut, so the MIP picks the `K` arcs whose removal leaves
//! the cheapest residual cut.

use good_lp::{constraint, variable, variables, Expression, Variable};
use tracing::debug;

use nira_core::{NiraResult, Topology};

use super::{
    solve_and_extract, DualResult, InterdictionModel, NetworkData, PrimalResult, Sense,
    SolverBackend,
};

pub struct MaxFlowInterdict<'t> {
    topology: &'t mut Topology,
    attacks: usize,
    backend: SolverBackend,
    verbose: bool,
}

impl<'t> MaxFlowInterdict<'t> {
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

    fn solve_dual(&mut self, data: &NetworkData, source: usize, sink: usize) -> NiraResult<(f64, Vec<bool>)> {
        let mut vars = variables!();
        let rho: Vec<Variable> = (0..data.node_count()).map(|_| vars.add(variable())).collect();
        let mut pi: Vec<Option<Variable>> = Vec::with_capacity(data.arcs.len());
        let mut x: Vec<Option<Variable>> = Vec::with_capacity(data.arcs.len());
        for arc in &data.arcs {
            pi.push(arc.capacity.map(|_| vars.add(variable().min(0.0))));
            x.push(arc.attackable.then(|| vars.add(variable().binary())));
        }

        let mut objective = Expression::from(0.0);
        for (k, arc) in data.arcs.iter().enumerate() {
            if let (Some(capacity), Some(p)) = (arc.capacity, pi[k]) {
                objective += capacity * p;
            }
        }

        let mut constraints = Vec::new();
        for (k, arc) in data.arcs.iter().enumerate() {
            let mut expr = rho[arc.end] - rho[arc.start];
            if let Some(p) = pi[k] {
                expr += p;
            }
            if let Some(xv) = x[k] {
                expr += data.big_m * xv;
            }
            constraints.push(constraint!(expr >= 0.0));
        }
        constraints.push(constraint!(rho[source] - rho[sink] >= 1.0));

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
                "solving max-flow interdiction dual"
            );
        }

        let pi_list: Vec<Variable> = pi.iter().flatten().copied().collect();
        let wanted: Vec<Variable> = pi_list.iter().chain(x_list.iter()).copied().collect();
        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Minimise,
            objective,
            constraints,
            &wanted,
        )?;
        let (pi_vals, x_vals) = values.split_at(pi_list.len());

        let mut dual_objective = 0.0;
        let mut slot = 0;
        for arc in &data.arcs {
            if let Some(capacity) = arc.capacity {
                dual_objective += capacity * pi_vals[slot];
                slot += 1;
            }
        }

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
        source: usize,
        sink: usize,
        flags: &[bool],
    ) -> NiraResult<PrimalResult> {
        let mut vars = variables!();
        let y: Vec<Variable> = data
            .arcs
            .iter()
            .map(|arc| match arc.capacity {
                Some(capacity) => vars.add(variable().min(0.0).max(capacity)),
                None => vars.add(variable().min(0.0)),
            })
            .collect();
        let total = vars.add(variable().min(0.0));

        // Routing across an interdicted arc costs M per unit, which always
        // outweighs the unit reward on the artificial arc.
        let mut objective = Expression::from(total);
        for (k, &flag) in flags.iter().enumerate() {
            if flag {
                objective -= data.big_m * y[k];
            }
        }

        let mut net: Vec<Expression> = (0..data.node_count())
            .map(|_| Expression::from(0.0))
            .collect();
        for (k, arc) in data.arcs.iter().enumerate() {
            net[arc.end] += y[k];
            net[arc.start] -= y[k];
        }
        net[source] += total;
        net[sink] -= total;

        let mut constraints = Vec::new();
        for expr in net {
            constraints.push(constraint!(expr == 0.0));
        }

        let mut wanted = y.clone();
        wanted.push(total);
        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Maximise,
            objective,
            constraints,
            &wanted,
        )?;
        let (y_vals, total_val) = values.split_at(y.len());

        let mut objective_value = total_val[0];
        for (k, &flag) in flags.iter().enumerate() {
            if flag {
                objective_value -= data.big_m * y_vals[k];
            }
        }

        Ok(PrimalResult {
            objective: objective_value,
            flows: data
                .arcs
                .iter()
                .zip(y_vals)
                .map(|(arc, &flow)| (arc.label.clone(), flow))
                .collect(),
            unsat_supply: Vec::new(),
            unsat_demand: Vec::new(),
        })
    }
}

impl InterdictionModel for MaxFlowInterdict<'_> {
    fn set_attacks(&mut self, attacks: usize) {
        self.attacks = attacks;
    }

    fn attacks(&self) -> usize {
        self.attacks
    }

    fn solve(&mut self) -> NiraResult<(PrimalResult, DualResult)> {
        let data = NetworkData::from_topology(self.topology);
        let (source, sink) = data.source_sink()?;

        let (dual_objective, flags) = self.solve_dual(&data, source, sink)?;
        self.topology.set_xbar(&flags)?;

        let interdicted = data
            .arcs
            .iter()
            .zip(&flags)
            .filter(|(_, &flag)| flag)
            .map(|(arc, _)| arc.label.clone())
            .collect();

        let stamped: Vec<bool> = self.topology.arcs().iter().map(|a| a.xbar).collect();
        let primal = self.solve_primal(&data, source, sink, &stamped)?;
        Ok((
            primal,
            DualResult {
                objective: dual_objective,
                interdicted,
            },
        ))
    }

    fn objective_label(&self) -> &'static str {
        "Total flow"
    }
}
