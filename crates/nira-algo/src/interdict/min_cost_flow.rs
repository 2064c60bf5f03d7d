//! Bilevel min-cost-flow interdiction.
//!
//! Follower: satisfy every node's supply/demand at minimum routing cost,
//! where the per-unit cost of an arc is its `risk` score. Imbalance is
//! absorbed by slack variables `UnsatSupply` (at supply nodes) and
//! `UnsatDemand` (at demand nodes), each penalized by `nCmax` so slack is
//! used only when routing is impossible. Leader: disable up to `K`
//! attackable arcs to make the routing as expensive as possible.
//!
//! The dual has a free potential `rho` per node and a capacity dual
//! `pi <= 0` per capacitated arc:
//!
//! ```text
//! max  sum capacity_ij * pi_ij + sum supply_demand_n * rho_n
//! s.t. rho_j - rho_i + pi_ij * [capacitated] <= risk_ij + M * x_ij * attackable_ij
//!      -rho_n <= nCmax   at supply nodes
//!       rho_n <= nCmax   at demand nodes
//!      sum x_ij <= K,  x binary on attackable arcs
//! ```

use good_lp::{constraint, variable, variables, Expression, Variable};
use tracing::debug;

use nira_core::{NiraResult, Topology};

use super::{
    solve_and_extract, DualResult, InterdictionModel, NetworkData, PrimalResult, Sense,
    SolverBackend,
};

pub struct MinCostFlowInterdict<'t> {
    topology: &'t mut Topology,
    attacks: usize,
    backend: SolverBackend,
    verbose: bool,
}

impl<'t> MinCostFlowInterdict<'t> {
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

    fn solve_dual(&self, data: &NetworkData) -> NiraResult<(f64, Vec<bool>)> {
        let mut vars = variables!();
        let rho: Vec<Variable> = (0..data.node_count()).map(|_| vars.add(variable())).collect();
        let mut pi: Vec<Option<Variable>> = Vec::with_capacity(data.arcs.len());
        let mut x: Vec<Option<Variable>> = Vec::with_capacity(data.arcs.len());
        for arc in &data.arcs {
            pi.push(arc.capacity.map(|_| vars.add(variable().max(0.0))));
            x.push(arc.attackable.then(|| vars.add(variable().binary())));
        }

        let mut objective = Expression::from(0.0);
        for (k, arc) in data.arcs.iter().enumerate() {
            if let (Some(capacity), Some(p)) = (arc.capacity, pi[k]) {
                objective += capacity * p;
            }
        }
        for n in 0..data.node_count() {
            let imbalance = data.supply_demand[n];
            if imbalance != 0.0 {
                objective += imbalance * rho[n];
            }
        }

        let mut constraints = Vec::new();
        for (k, arc) in data.arcs.iter().enumerate() {
            let mut expr = rho[arc.end] - rho[arc.start];
            if let Some(p) = pi[k] {
                expr += p;
            }
            if let Some(xv) = x[k] {
                expr -= data.big_m * xv;
            }
            constraints.push(constraint!(expr <= arc.risk));
        }
        for n in data.supply_rows() {
            constraints.push(constraint!(rho[n] >= -data.n_cmax));
        }
        for n in data.demand_rows() {
            constraints.push(constraint!(rho[n] <= data.n_cmax));
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
                "solving min-cost-flow interdiction dual"
            );
        }

        let pi_list: Vec<Variable> = pi.iter().flatten().copied().collect();
        let wanted: Vec<Variable> = rho
            .iter()
            .chain(pi_list.iter())
            .chain(x_list.iter())
            .copied()
            .collect();
        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Maximise,
            objective,
            constraints,
            &wanted,
        )?;
        let (rho_vals, rest) = values.split_at(rho.len());
        let (pi_vals, x_vals) = rest.split_at(pi_list.len());

        let mut dual_objective = 0.0;
        let mut slot = 0;
        for arc in &data.arcs {
            if let Some(capacity) = arc.capacity {
                dual_objective += capacity * pi_vals[slot];
                slot += 1;
            }
        }
        for n in 0..data.node_count() {
            dual_objective += data.supply_demand[n] * rho_vals[n];
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

    fn solve_primal(&self, data: &NetworkData, flags: &[bool]) -> NiraResult<PrimalResult> {
        let supply_rows = data.supply_rows();
        let demand_rows = data.demand_rows();

        let mut vars = variables!();
        let y: Vec<Variable> = data
            .arcs
            .iter()
            .map(|arc| match arc.capacity {
                Some(capacity) => vars.add(variable().min(0.0).max(capacity)),
                None => vars.add(variable().min(0.0)),
            })
            .collect();
        let unsat_supply: Vec<Variable> = supply_rows
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();
        let unsat_demand: Vec<Variable> = demand_rows
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let mut objective = Expression::from(0.0);
        for (k, arc) in data.arcs.iter().enumerate() {
            let penalty = if flags[k] { data.big_m } else { 0.0 };
            objective += (arc.risk + penalty) * y[k];
        }
        for &slack in unsat_supply.iter().chain(unsat_demand.iter()) {
            objective += data.n_cmax * slack;
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
            let mut rhs = Expression::from(data.supply_demand[n]);
            if let Some(slot) = supply_rows.iter().position(|&row| row == n) {
                rhs += unsat_supply[slot];
            }
            if let Some(slot) = demand_rows.iter().position(|&row| row == n) {
                rhs -= unsat_demand[slot];
            }
            constraints.push(constraint!(expr == rhs));
        }

        let wanted: Vec<Variable> = y
            .iter()
            .chain(unsat_supply.iter())
            .chain(unsat_demand.iter())
            .copied()
            .collect();
        let values = solve_and_extract(
            self.backend,
            vars,
            Sense::Minimise,
            objective,
            constraints,
            &wanted,
        )?;
        let (y_vals, slack_vals) = values.split_at(y.len());
        let (supply_vals, demand_vals) = slack_vals.split_at(unsat_supply.len());

        let mut objective_value = 0.0;
        for (k, arc) in data.arcs.iter().enumerate() {
            let penalty = if flags[k] { data.big_m } else { 0.0 };
            objective_value += (arc.risk + penalty) * y_vals[k];
        }
        for &slack in supply_vals.iter().chain(demand_vals.iter()) {
            objective_value += data.n_cmax * slack;
        }

        Ok(PrimalResult {
            objective: objective_value,
            flows: data
                .arcs
                .iter()
                .zip(y_vals)
                .map(|(arc, &flow)| (arc.label.clone(), flow))
                .collect(),
            unsat_supply: supply_rows
                .iter()
                .zip(supply_vals)
                .map(|(&row, &value)| (data.node_keys[row].clone(), value))
                .collect(),
            unsat_demand: demand_rows
                .iter()
                .zip(demand_vals)
                .map(|(&row, &value)| (data.node_keys[row].clone(), value))
                .collect(),
        })
    }
}

impl InterdictionModel for MinCostFlowInterdict<'_> {
    fn set_attacks(&mut self, attacks: usize) {
        self.attacks = attacks;
    }

    fn attacks(&self) -> usize {
        self.attacks
    }

    fn solve(&mut self) -> NiraResult<(PrimalResult, DualResult)> {
        let data = NetworkData::from_topology(self.topology);

        let (dual_objective, flags) = self.solve_dual(&data)?;
        self.topology.set_xbar(&flags)?;

        let interdicted = data
            .arcs
            .iter()
            .zip(&flags)
            .filter(|(_, &flag)| flag)
            .map(|(arc, _)| arc.label.clone())
            .collect();

        let stamped: Vec<bool> = self.topology.arcs().iter().map(|a| a.xbar).collect();
        let primal = self.solve_primal(&data, &stamped)?;
        Ok((
            primal,
            DualResult {
                objective: dual_objective,
                interdicted,
            },
        ))
    }

    fn objective_label(&self) -> &'static str {
        "Total cost"
    }
}
