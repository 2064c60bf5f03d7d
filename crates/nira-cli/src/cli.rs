//! Command-line surface of the `nira` binary.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use nira_algo::InterdictKind;

#[derive(Parser, Debug)]
#[command(
    name = "nira",
    version,
    about = "Network Infrastructure Risk Analysis",
    long_about = "Assesses risk on an infrastructure network and computes optimal \
                  attacker/defender strategies against it: per-asset risk scores, \
                  greedy attacker/defender/Stackelberg trajectories, and optimal \
                  network interdiction plans."
)]
pub struct Cli {
    /// Topology dataset directory (nodes.csv + arcs.csv)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Write the updated topology to this dataset directory
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Write a Graphviz DOT rendering of the topology to this path
    #[arg(short, long)]
    pub dot: Option<PathBuf>,

    /// Type of simulation run
    #[arg(short, long, value_enum, default_value_t = RunMode::CriticalAsset)]
    pub run: RunMode,

    /// Greedy move budget
    #[arg(short, long, default_value_t = 1)]
    pub budget: usize,

    /// Interdiction budget K; the solver is run for 0, 1, ..., K attacks
    #[arg(short = 'k', long, default_value_t = 0)]
    pub attacks: usize,

    /// Network interdiction problem
    #[arg(short, long, value_enum, default_value_t = InterdictArg::MinCostFlow)]
    pub interdict: InterdictArg,

    /// MIP solver backend
    #[arg(short = 'o', long, default_value = "highs")]
    pub solver: String,

    /// Maximum number of Stackelberg outer iterations
    #[arg(short = 'n', long = "max-iter", alias = "max_iter", default_value_t = 10)]
    pub max_iter: usize,

    /// Verbose output (debug logging and solver chatter)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Simulation run modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Report the critical assets of the loaded topology
    #[value(alias = "critical_asset")]
    CriticalAsset,
    /// Defender preparedness: reduce vulnerabilities
    Prepare,
    /// Defender mitigation: reduce consequences
    Mitigate,
    /// Attacker threat maximization
    Threat,
    /// Alternating defender/attacker game
    Stackelberg,
    /// Network interdiction sweep
    Interdict,
}

/// Interdiction model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterdictArg {
    MaxFlow,
    MinCostFlow,
    ShortestPath,
}

impl From<InterdictArg> for InterdictKind {
    fn from(arg: InterdictArg) -> Self {
        match arg {
            InterdictArg::MaxFlow => InterdictKind::MaxFlow,
            InterdictArg::MinCostFlow => InterdictKind::MinCostFlow,
            InterdictArg::ShortestPath => InterdictKind::ShortestPath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["nira", "--file", "data"]);
        assert_eq!(cli.run, RunMode::CriticalAsset);
        assert_eq!(cli.budget, 1);
        assert_eq!(cli.attacks, 0);
        assert_eq!(cli.interdict, InterdictArg::MinCostFlow);
        assert_eq!(cli.solver, "highs");
        assert_eq!(cli.max_iter, 10);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_mode_parsing() {
        let cli = Cli::parse_from(["nira", "--file", "data", "--run", "stackelberg"]);
        assert_eq!(cli.run, RunMode::Stackelberg);
        // The underscore spelling from the original tooling still parses.
        let cli = Cli::parse_from(["nira", "--file", "data", "--run", "critical_asset"]);
        assert_eq!(cli.run, RunMode::CriticalAsset);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["nira", "--file", "data", "--run", "nonsense"]).is_err());
    }

    #[test]
    fn test_interdict_flags() {
        let cli = Cli::parse_from([
            "nira",
            "--file",
            "data",
            "--run",
            "interdict",
            "--interdict",
            "max-flow",
            "--attacks",
            "2",
        ]);
        assert_eq!(cli.run, RunMode::Interdict);
        assert_eq!(cli.interdict, InterdictArg::MaxFlow);
        assert_eq!(cli.attacks, 2);
    }
}
