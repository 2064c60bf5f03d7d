//! # nira-core: Network Risk Modeling Core
//!
//! Provides the topology model and scoring primitives for network risk
//! assessment and interdiction analysis.
//!
//! ## Design Philosophy
//!
//! A network is two attribute tables kept in input row order:
//! - **Nodes**: keyed assets with an ordinal threat/vulnerability/consequence
//!   triple and an optional supply/demand value
//! - **Arcs**: directed edges keyed by `(start, end)` with the same score
//!   triple plus optional capacity and routing cost and the transient
//!   interdiction indicator `xbar`
//!
//! Risk is always `T * V * C` and is re-derived on the same call that
//! mutates any score, so a stored risk value is never stale. Scores are
//! clamped to the 1-5 scale on every write.
//!
//! ## Quick Start
//!
//! ```rust
//! use nira_core::{AssetClass, NodeInput, ArcInput, RankAttribute, Topology};
//!
//! let topology = Topology::from_tables(
//!     vec![
//!         NodeInput {
//!             key: "plant".into(),
//!             attackable: true,
//!             vulnerability: 4,
//!             consequence: 5,
//!             threat: Some(2),
//!             supply_demand: Some(-10.0),
//!         },
//!         NodeInput {
//!             key: "city".into(),
//!             attackable: true,
//!             vulnerability: 2,
//!             consequence: 3,
//!             threat: Some(1),
//!             supply_demand: Some(10.0),
//!         },
//!     ],
//!     vec![ArcInput {
//!         start: "plant".into(),
//!         end: "city".into(),
//!         attackable: true,
//!         vulnerability: 3,
//!         consequence: 3,
//!         threat: Some(1),
//!         capacity: Some(10.0),
//!         cost: Some(1.0),
//!     }],
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(topology.nodes()[0].risk, 40);
//! let (row, _) = topology
//!     .find_critical_row(AssetClass::Nodes, RankAttribute::Risk)
//!     .unwrap();
//! assert_eq!(topology.nodes()[row].key, "plant");
//! ```
//!
//! ## Modules
//!
//! - [`topology`] - the asset tables and their mutators
//! - [`score`] - ordinal score scales and clamping
//! - [`centrality`] - metrics over the attackable subgraph
//! - [`graph_utils`] - DOT export
//! - [`error`] - the workspace-wide error type

pub mod centrality;
pub mod error;
pub mod graph_utils;
pub mod score;
pub mod topology;

pub use error::{NiraError, NiraResult};
pub use graph_utils::{graph_stats, render_dot, GraphStats};
pub use score::{
    clamp_score, risk_product, AssetClass, RankAttribute, ScoreKind, CONS_INC, CONS_MAX, CONS_MIN,
    RISK_INC, RISK_MAX, RISK_MIN, THREAT_INC, THREAT_MAX, THREAT_MIN, VULN_INC, VULN_MAX, VULN_MIN,
};
pub use topology::{ArcAsset, ArcInput, NodeAsset, NodeInput, Topology};
