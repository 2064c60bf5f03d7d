//! Run-mode dispatch: load, report, analyze, save.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use nira_algo::{
    critical_assets_report, defence_report, interdiction_sweep, risk_assessment_report,
    stackelberg, stackelberg_report, threat_report, Attacker, DefendMode, Defender, SolverBackend,
};
use nira_core::{graph_stats, render_dot, AssetClass, Topology};

use crate::cli::{Cli, InterdictArg, RunMode};

const HEADER: &str = "\
**********************************************************************
*                                                                    *
*            Network Infrastructure Risk Analysis (NIRA)             *
*                                                                    *
**********************************************************************
";

/// Align a report's tab-separated columns and print it.
fn print_report(text: &str) -> Result<()> {
    let mut writer = tabwriter::TabWriter::new(io::stdout());
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn print_topology_analysis(topology: &Topology) -> Result<()> {
    print_report(&risk_assessment_report(topology))?;
    print_report(&critical_assets_report(topology))?;
    Ok(())
}

/// Execute one CLI invocation against a dataset.
pub fn run(cli: &Cli) -> Result<()> {
    println!("{HEADER}");

    // Capacity tracks risk in every mode except min-cost-flow
    // interdiction, where loaded capacities must stay untouched.
    let calc_cap =
        !(cli.run == RunMode::Interdict && cli.interdict == InterdictArg::MinCostFlow);

    let mut topology = nira_io::load_dir(&cli.file, calc_cap)
        .with_context(|| format!("loading topology from {}", cli.file.display()))?;
    info!("loaded topology: {}", graph_stats(&topology));

    print_topology_analysis(&topology)?;

    if let Some(path) = &cli.dot {
        fs::write(path, render_dot(&topology))
            .with_context(|| format!("writing DOT export to {}", path.display()))?;
        info!("wrote DOT export to {}", path.display());
    }

    match cli.run {
        RunMode::CriticalAsset => {}
        RunMode::Prepare => {
            let defender = Defender::new(cli.budget);
            for class in [AssetClass::Nodes, AssetClass::Arcs] {
                let steps = defender.minimise_vulnerability(&mut topology, class)?;
                print_report(&defence_report(DefendMode::Prepare, class, &steps))?;
            }
            print_topology_analysis(&topology)?;
        }
        RunMode::Mitigate => {
            let defender = Defender::new(cli.budget);
            for class in [AssetClass::Nodes, AssetClass::Arcs] {
                let steps = defender.minimise_consequence(&mut topology, class)?;
                print_report(&defence_report(DefendMode::Mitigate, class, &steps))?;
            }
            print_topology_analysis(&topology)?;
        }
        RunMode::Threat => {
            let attacker = Attacker::new(cli.budget);
            for class in [AssetClass::Nodes, AssetClass::Arcs] {
                let steps = attacker.maximise_threat(&mut topology, class)?;
                print_report(&threat_report(class, &steps))?;
            }
            print_topology_analysis(&topology)?;
        }
        RunMode::Stackelberg => {
            for class in [AssetClass::Nodes, AssetClass::Arcs] {
                let rounds = stackelberg(&mut topology, class, cli.budget, cli.max_iter)?;
                print_report(&stackelberg_report(class, &rounds))?;
            }
            print_topology_analysis(&topology)?;
        }
        RunMode::Interdict => {
            let backend: SolverBackend = cli.solver.parse()?;
            let report = interdiction_sweep(
                &mut topology,
                cli.interdict.into(),
                cli.attacks,
                backend,
                cli.verbose,
            );
            print_report(&report)?;
        }
    }

    if let Some(path) = &cli.save {
        nira_io::save_dir(&topology, path)
            .with_context(|| format!("saving topology to {}", path.display()))?;
        info!("saved topology to {}", path.display());
    }
    Ok(())
}
