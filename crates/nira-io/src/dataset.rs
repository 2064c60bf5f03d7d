//! CSV dataset reader/writer.
//!
//! A dataset is a directory holding the two topology tables as
//! `nodes.csv` and `arcs.csv`. Required node columns: `node`, `attackable`,
//! `vulnerability`, `consequence`; required arc columns: `start_node`,
//! `end_node`, `attackable`, `vulnerability`, `consequence`. The remaining
//! columns are optional on load and always written on save, so a saved
//! dataset loads back to an identical topology.

use std::path::Path;

use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};

use nira_core::{ArcInput, NiraError, NiraResult, NodeInput, Topology};

pub const NODES_FILE: &str = "nodes.csv";
pub const ARCS_FILE: &str = "arcs.csv";

/// Uncapacitated sentinel used in the capacity column.
const UNCAPACITATED: f64 = -1.0;

#[derive(Debug, Deserialize)]
struct NodeRecord {
    node: String,
    attackable: i64,
    vulnerability: i64,
    consequence: i64,
    #[serde(default)]
    threat: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    risk: Option<i64>,
    #[serde(default)]
    supply_demand: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ArcRecord {
    start_node: String,
    end_node: String,
    attackable: i64,
    vulnerability: i64,
    consequence: i64,
    #[serde(default)]
    threat: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    risk: Option<i64>,
    #[serde(default)]
    capacity: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    xbar: Option<i64>,
}

#[derive(Debug, Serialize)]
struct NodeRow<'a> {
    node: &'a str,
    attackable: u8,
    threat: u8,
    vulnerability: u8,
    consequence: u8,
    risk: u32,
    supply_demand: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ArcRow<'a> {
    start_node: &'a str,
    end_node: &'a str,
    attackable: u8,
    threat: u8,
    vulnerability: u8,
    consequence: u8,
    risk: u32,
    capacity: f64,
    cost: Option<f64>,
    xbar: u8,
}

fn parse_flag(value: i64, table: &str, row: usize) -> NiraResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(NiraError::Parse(format!(
            "{table} row {row}: attackable must be 0 or 1, got {other}"
        ))),
    }
}

/// Load a topology from a dataset directory.
///
/// `calc_cap` enables capacity re-derivation on later score mutations
/// (every run mode except min-cost-flow interdiction).
pub fn load_dir(dir: &Path, calc_cap: bool) -> NiraResult<Topology> {
    let nodes_path = dir.join(NODES_FILE);
    let arcs_path = dir.join(ARCS_FILE);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(&nodes_path)
        .map_err(|err| NiraError::Parse(format!("opening {}: {err}", nodes_path.display())))?;
    let mut nodes = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: NodeRecord = result
            .map_err(|err| NiraError::Parse(format!("{NODES_FILE} row {}: {err}", row + 1)))?;
        nodes.push(NodeInput {
            attackable: parse_flag(record.attackable, NODES_FILE, row + 1)?,
            key: record.node,
            vulnerability: record.vulnerability,
            consequence: record.consequence,
            threat: record.threat,
            supply_demand: record.supply_demand,
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(&arcs_path)
        .map_err(|err| NiraError::Parse(format!("opening {}: {err}", arcs_path.display())))?;
    let mut arcs = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: ArcRecord = result
            .map_err(|err| NiraError::Parse(format!("{ARCS_FILE} row {}: {err}", row + 1)))?;
        arcs.push(ArcInput {
            attackable: parse_flag(record.attackable, ARCS_FILE, row + 1)?,
            start: record.start_node,
            end: record.end_node,
            vulnerability: record.vulnerability,
            consequence: record.consequence,
            threat: record.threat,
            capacity: record.capacity,
            cost: record.cost,
        });
    }

    Topology::from_tables(nodes, arcs, calc_cap)
}

/// Write a topology back to a dataset directory, including every derived
/// column (`threat`, `risk`, `capacity`, `xbar`).
pub fn save_dir(topology: &Topology, dir: &Path) -> NiraResult<()> {
    std::fs::create_dir_all(dir)?;

    let nodes_path = dir.join(NODES_FILE);
    let mut writer = Writer::from_path(&nodes_path)
        .map_err(|err| NiraError::Parse(format!("creating {}: {err}", nodes_path.display())))?;
    for node in topology.nodes() {
        writer
            .serialize(NodeRow {
                node: &node.key,
                attackable: node.attackable as u8,
                threat: node.threat,
                vulnerability: node.vulnerability,
                consequence: node.consequence,
                risk: node.risk,
                supply_demand: node.supply_demand,
            })
            .map_err(|err| NiraError::Parse(format!("writing {NODES_FILE}: {err}")))?;
    }
    writer
        .flush()
        .map_err(|err| NiraError::Parse(format!("writing {NODES_FILE}: {err}")))?;

    let arcs_path = dir.join(ARCS_FILE);
    let mut writer = Writer::from_path(&arcs_path)
        .map_err(|err| NiraError::Parse(format!("creating {}: {err}", arcs_path.display())))?;
    for arc in topology.arcs() {
        writer
            .serialize(ArcRow {
                start_node: &arc.start,
                end_node: &arc.end,
                attackable: arc.attackable as u8,
                threat: arc.threat,
                vulnerability: arc.vulnerability,
                consequence: arc.consequence,
                risk: arc.risk,
                capacity: arc.capacity.unwrap_or(UNCAPACITATED),
                cost: arc.cost,
                xbar: arc.xbar as u8,
            })
            .map_err(|err| NiraError::Parse(format!("writing {ARCS_FILE}: {err}")))?;
    }
    writer
        .flush()
        .map_err(|err| NiraError::Parse(format!("writing {ARCS_FILE}: {err}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dataset(dir: &Path, nodes: &str, arcs: &str) {
        fs::write(dir.join(NODES_FILE), nodes).unwrap();
        fs::write(dir.join(ARCS_FILE), arcs).unwrap();
    }

    #[test]
    fn test_load_minimal_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability,consequence\n\
             a,1,2,3\n\
             b,1,4,5\n",
            "start_node,end_node,attackable,vulnerability,consequence\n\
             a,b,1,2,2\n",
        );
        let topology = load_dir(dir.path(), false).unwrap();
        assert_eq!(topology.node_count(), 2);
        assert_eq!(topology.arc_count(), 1);
        // Threat was absent and both endpoints of the only arc are
        // attackable, so the derived threat is 5 on every asset.
        assert_eq!(topology.nodes()[0].threat, 5);
        assert_eq!(topology.arcs()[0].threat, 5);
        // Capacity column was absent: filled as RISK_MAX - risk.
        assert_eq!(topology.arcs()[0].capacity, Some(105.0));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability,consequence,threat,supply_demand\n\
             a,1,2,3,1,-10.5\n\
             b,0,4,5,2,\n\
             c,1,1,1,5,10.5\n",
            "start_node,end_node,attackable,vulnerability,consequence,threat,capacity,cost\n\
             a,b,1,2,2,3,40.0,1.5\n\
             b,c,0,1,4,2,-1,2.5\n",
        );
        let first = load_dir(dir.path(), false).unwrap();

        let saved = tempfile::tempdir().unwrap();
        save_dir(&first, saved.path()).unwrap();
        let second = load_dir(saved.path(), false).unwrap();

        assert_eq!(first.nodes(), second.nodes());
        assert_eq!(first.arcs(), second.arcs());
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability\na,1,2\n",
            "start_node,end_node,attackable,vulnerability,consequence\n",
        );
        let err = load_dir(dir.path(), false).unwrap_err();
        assert!(matches!(err, NiraError::Parse(_)));
    }

    #[test]
    fn test_non_numeric_score_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability,consequence\na,1,high,3\n",
            "start_node,end_node,attackable,vulnerability,consequence\n",
        );
        let err = load_dir(dir.path(), false).unwrap_err();
        assert!(matches!(err, NiraError::Parse(_)));
    }

    #[test]
    fn test_bad_attackable_flag_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability,consequence\na,2,1,3\n",
            "start_node,end_node,attackable,vulnerability,consequence\n",
        );
        let err = load_dir(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("attackable"));
    }

    #[test]
    fn test_dangling_endpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "node,attackable,vulnerability,consequence\na,1,1,1\n",
            "start_node,end_node,attackable,vulnerability,consequence\na,zz,1,1,1\n",
        );
        let err = load_dir(dir.path(), false).unwrap_err();
        assert!(matches!(err, NiraError::Topology(_)));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dir(dir.path(), false).unwrap_err();
        assert!(matches!(err, NiraError::Parse(_)));
    }
}
