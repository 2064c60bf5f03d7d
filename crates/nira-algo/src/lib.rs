//! # nira-algo: Risk Analysis and Interdiction Algorithms
//!
//! The analysis layer over [`nira_core::Topology`]:
//!
//! - [`risk`] - the risk model, score setters, and console reports
//! - [`attacker`] - greedy threat maximization under a move budget
//! - [`defender`] - greedy vulnerability/consequence reduction
//! - [`stackelberg`] - the alternating defender/attacker game
//! - [`interdict`] - the three bilevel interdiction models (max-flow,
//!   min-cost-flow, shortest-path), reduced to single-level MIPs via LP
//!   duality and solved with `good_lp` on HiGHS (or CBC with the
//!   `solver-coin_cbc` feature)
//!
//! Greedy components mutate the topology in place between iterations;
//! interdiction models treat it as read-only except for stamping the
//! solved `xbar` indicator onto each arc. Everything is single-threaded:
//! iteration `k + 1` always observes iteration `k`'s writes, and a dual
//! solve fully stamps `xbar` before the primal re-solve begins.

pub mod attacker;
pub mod defender;
pub mod interdict;
mod report;
pub mod risk;
pub mod stackelberg;

pub use attacker::{threat_report, Attacker, GreedyStep};
pub use defender::{defence_report, DefendMode, Defender};
pub use interdict::{
    interdiction_sweep, solve_report, DualResult, InterdictKind, InterdictionModel,
    MaxFlowInterdict, MinCostFlowInterdict, PrimalResult, ShortestPathInterdict, SolverBackend,
};
pub use risk::{critical_assets_report, risk_assessment_report, RiskModel};
pub use stackelberg::{stackelberg, stackelberg_report, StackelbergRound};
