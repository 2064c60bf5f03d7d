//! Network interdiction solvers.
//!
//! Each model is a bilevel game: a follower routes flow over the network
//! by solving a continuous LP, and a leader disables up to `K` attackable
//! arcs to worsen the follower's optimum. The standard reduction applies:
//! the follower LP is dualized, the interdiction indicator enters the dual
//! linearly through a big-M penalty, and the resulting single-level MIP is
//! solved directly. Its `x` solution is stamped onto every arc's `xbar`
//! and the penalized primal LP is re-solved so the reported flows are the
//! ones the follower would actually pick under that interdiction.
//!
//! The big-M is `2 * nCmax + 1` with `nCmax = |nodes| * max(arc risk)`,
//! large enough that a single interdicted arc dominates any uninterdicted
//! routing.

mod max_flow;
mod min_cost_flow;
mod shortest_path;

pub use max_flow::MaxFlowInterdict;
pub use min_cost_flow::MinCostFlowInterdict;
pub use shortest_path::ShortestPathInterdict;

use std::str::FromStr;

use serde::Serialize;

#[cfg(feature = "solver-coin_cbc")]
use good_lp::solvers::coin_cbc::coin_cbc as coin_cbc_solver;
use good_lp::solvers::highs::highs as highs_solver;
use good_lp::{Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};
use tracing::warn;

use nira_core::{NiraError, NiraResult, Topology};

use crate::report::{banner, RULE};

/// Which interdiction model to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterdictKind {
    MaxFlow,
    MinCostFlow,
    ShortestPath,
}

impl InterdictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterdictKind::MaxFlow => "max-flow",
            InterdictKind::MinCostFlow => "min-cost-flow",
            InterdictKind::ShortestPath => "shortest-path",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            InterdictKind::MaxFlow => "Max Flow Interdiction",
            InterdictKind::MinCostFlow => "Min-Cost-Flow Interdiction",
            InterdictKind::ShortestPath => "Shortest Path Interdiction",
        }
    }
}

/// MIP backend used for both the dual MIP and the primal re-solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolverBackend {
    #[default]
    Highs,
    #[cfg(feature = "solver-coin_cbc")]
    CoinCbc,
}

const AVAILABLE_BACKENDS: &[&str] = &[
    "highs",
    #[cfg(feature = "solver-coin_cbc")]
    "coin_cbc",
];

impl SolverBackend {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverBackend::Highs => "highs",
            #[cfg(feature = "solver-coin_cbc")]
            SolverBackend::CoinCbc => "coin_cbc",
        }
    }
}

impl FromStr for SolverBackend {
    type Err = NiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "highs" => Ok(SolverBackend::Highs),
            "cbc" | "coin_cbc" => {
                #[cfg(feature = "solver-coin_cbc")]
                {
                    Ok(SolverBackend::CoinCbc)
                }
                #[cfg(not(feature = "solver-coin_cbc"))]
                {
                    Err(unknown_backend(&normalized))
                }
            }
            other => Err(unknown_backend(other)),
        }
    }
}

fn unknown_backend(label: &str) -> NiraError {
    NiraError::Config(format!(
        "unknown solver '{}'; supported values: {}",
        label,
        SolverBackend::available().join(", ")
    ))
}

/// Objective sense for [`solve_and_extract`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Sense {
    Minimise,
    Maximise,
}

/// Solve one LP/MIP on the chosen backend and return the values of the
/// requested variables, in order. Infeasible/unbounded/errored solves
/// surface as [`NiraError::Solver`]; callers in the attack sweep decide
/// whether to continue.
pub(crate) fn solve_and_extract(
    backend: SolverBackend,
    vars: ProblemVariables,
    sense: Sense,
    objective: Expression,
    constraints: Vec<Constraint>,
    wanted: &[Variable],
) -> NiraResult<Vec<f64>> {
    let unsolved = match sense {
        Sense::Minimise => vars.minimise(objective),
        Sense::Maximise => vars.maximise(objective),
    };
    match backend {
        SolverBackend::Highs => {
            let mut model = unsolved.using(highs_solver);
            for constraint in constraints {
                model = model.with(constraint);
            }
            let solution = model
                .solve()
                .map_err(|err| NiraError::Solver(format!("highs: {err:?}")))?;
            Ok(wanted.iter().map(|&var| solution.value(var)).collect())
        }
        #[cfg(feature = "solver-coin_cbc")]
        SolverBackend::CoinCbc => {
            let mut model = unsolved.using(coin_cbc_solver);
            for constraint in constraints {
                model = model.with(constraint);
            }
            let solution = model
                .solve()
                .map_err(|err| NiraError::Solver(format!("coin_cbc: {err:?}")))?;
            Ok(wanted.iter().map(|&var| solution.value(var)).collect())
        }
    }
}

/// Flattened arc row used by the solver formulations.
#[derive(Debug, Clone)]
pub(crate) struct ArcData {
    pub start: usize,
    pub end: usize,
    pub risk: f64,
    pub capacity: Option<f64>,
    pub cost: Option<f64>,
    pub attackable: bool,
    pub label: String,
}

/// Topology snapshot shared by the three formulations.
#[derive(Debug, Clone)]
pub(crate) struct NetworkData {
    pub node_keys: Vec<String>,
    pub supply_demand: Vec<f64>,
    pub arcs: Vec<ArcData>,
    pub n_cmax: f64,
    pub big_m: f64,
}

impl NetworkData {
    pub fn from_topology(topology: &Topology) -> Self {
        let node_keys: Vec<String> =
            topology.nodes().iter().map(|n| n.key.clone()).collect();
        let supply_demand: Vec<f64> = topology
            .nodes()
            .iter()
            .map(|n| n.supply_demand.unwrap_or(0.0))
            .collect();
        let arcs: Vec<ArcData> = topology
            .arcs()
            .iter()
            .map(|arc| ArcData {
                // Endpoints were validated when the topology was built.
                start: topology.node_row(&arc.start).unwrap_or(0),
                end: topology.node_row(&arc.end).unwrap_or(0),
                risk: arc.risk as f64,
                capacity: arc.capacity,
                cost: arc.cost,
                attackable: arc.attackable,
                label: arc.label(),
            })
            .collect();
        let n_cmax = topology.node_count() as f64 * topology.max_arc_risk() as f64;
        Self {
            node_keys,
            supply_demand,
            arcs,
            n_cmax,
            big_m: 2.0 * n_cmax + 1.0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_keys.len()
    }

    /// Rows with negative supply/demand (supply nodes).
    pub fn supply_rows(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&n| self.supply_demand[n] < 0.0)
            .collect()
    }

    /// Rows with positive supply/demand (demand nodes).
    pub fn demand_rows(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&n| self.supply_demand[n] > 0.0)
            .collect()
    }

    /// The unique source (supply) and sink (demand) nodes required by the
    /// max-flow and shortest-path models.
    pub fn source_sink(&self) -> NiraResult<(usize, usize)> {
        let sources = self.supply_rows();
        let sinks = self.demand_rows();
        if sources.len() != 1 || sinks.len() != 1 {
            return Err(NiraError::Validation(format!(
                "expected exactly one supply node (supply_demand < 0) and one \
                 demand node (> 0), found {} and {}",
                sources.len(),
                sinks.len()
            )));
        }
        Ok((sources[0], sinks[0]))
    }
}

/// Follower-side outcome after the primal re-solve against the stamped
/// interdiction.
#[derive(Debug, Clone, Serialize)]
pub struct PrimalResult {
    pub objective: f64,
    /// Flow per arc, in table order.
    pub flows: Vec<(String, f64)>,
    /// Unshipped supply per supply node.
    pub unsat_supply: Vec<(String, f64)>,
    /// Unmet demand per demand node.
    pub unsat_demand: Vec<(String, f64)>,
}

/// Leader-side outcome of the dual MIP.
#[derive(Debug, Clone, Serialize)]
pub struct DualResult {
    pub objective: f64,
    /// Labels of the interdicted arcs.
    pub interdicted: Vec<String>,
}

/// Common surface of the three interdiction models.
pub trait InterdictionModel {
    /// Change the leader's budget without rebuilding the model.
    fn set_attacks(&mut self, attacks: usize);
    /// The leader's current budget.
    fn attacks(&self) -> usize;
    /// Solve the dual MIP, stamp `xbar`, and re-solve the primal.
    fn solve(&mut self) -> NiraResult<(PrimalResult, DualResult)>;
    /// Name of the follower objective in reports ("Total flow", ...).
    fn objective_label(&self) -> &'static str;

    /// Console block for a solve's results at the current budget.
    fn report(&self, primal: &PrimalResult, dual: &DualResult) -> String {
        solve_report(self.attacks(), primal, dual, self.objective_label())
    }
}

/// Console block for one solved attack budget, in the layout of the
/// original reports.
pub fn solve_report(
    attacks: usize,
    primal: &PrimalResult,
    dual: &DualResult,
    objective_label: &str,
) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("Number of attacks: {attacks}\n"));
    out.push_str(RULE);
    out.push('\n');
    for (it, label) in dual.interdicted.iter().enumerate() {
        out.push_str(&format!("Interdicted arc {}: {}\n", it + 1, label));
    }
    for (key, value) in &primal.unsat_supply {
        if *value > 0.0 {
            out.push_str(&format!("Remaining supply on node {key}: {value:.2}\n"));
        }
    }
    for (key, value) in &primal.unsat_demand {
        if *value > 0.0 {
            out.push_str(&format!("Remaining demand on node {key}: {value:.2}\n"));
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out.push_str("Arc\t\tFlow\n");
    out.push_str(RULE);
    out.push('\n');
    for (label, flow) in &primal.flows {
        out.push_str(&format!("{label:<12}\t{flow:.2}\n"));
    }
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "{}: {:.2} (primal), {:.2} (dual)\n",
        objective_label, primal.objective, dual.objective
    ));
    out
}

/// Run one interdiction model for every budget `k = 0..=attacks` and
/// collect the console report.
///
/// A failed or non-optimal solve at one budget logs a warning and the
/// sweep continues with the next; an intermediate infeasibility must not
/// abort the whole run.
pub fn interdiction_sweep(
    topology: &mut Topology,
    kind: InterdictKind,
    attacks: usize,
    backend: SolverBackend,
    verbose: bool,
) -> String {
    let mut out = banner(kind.title());
    let mut model: Box<dyn InterdictionModel + '_> = match kind {
        InterdictKind::MaxFlow => {
            Box::new(MaxFlowInterdict::new(topology, 0, backend, verbose))
        }
        InterdictKind::MinCostFlow => {
            Box::new(MinCostFlowInterdict::new(topology, 0, backend, verbose))
        }
        InterdictKind::ShortestPath => {
            Box::new(ShortestPathInterdict::new(topology, 0, backend, verbose))
        }
    };
    for k in 0..=attacks {
        model.set_attacks(k);
        match model.solve() {
            Ok((primal, dual)) => {
                out.push('\n');
                out.push_str(&model.report(&primal, &dual));
            }
            Err(err) => {
                warn!(attacks = k, error = %err, "interdiction solve failed; continuing sweep");
                out.push('\n');
                out.push_str(&format!("Number of attacks: {k}: solve failed ({err})\n"));
            }
        }
    }
    out
}
