//! # nira-io: Dataset Loading and Saving
//!
//! Reads and writes topology datasets: a directory with a `nodes.csv` and
//! an `arcs.csv` table. Loading validates the schema (missing required
//! columns, non-numeric scores, and dangling arc endpoints are fatal) and
//! hands the parsed tables to [`nira_core::Topology::from_tables`], which
//! derives missing threat and capacity columns. Saving writes every
//! derived column back, so `load -> save -> load` round-trips exactly.

pub mod dataset;

pub use dataset::{load_dir, save_dir, ARCS_FILE, NODES_FILE};
