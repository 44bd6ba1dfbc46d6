use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::Parser;
use maneuver_planner::config::{Settings, load_settings};
use maneuver_planner::editor::panels::format_speed;
use maneuver_planner::editor::{ControlAxis, Editor};
use maneuver_planner::events::EventKind;
use maneuver_planner::export::{self, EventReport};
use maneuver_planner::report::event_report;
use maneuver_planner::scenario;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Print the event table of every maneuver node in a scenario, optionally editing one node first.
#[derive(Parser, Debug)]
#[command(author, version, about = "Maneuver node event solver")]
struct Cli {
    /// Scenario file (YAML list, TOML record) or directory of TOML records
    #[arg(long)]
    scenario: PathBuf,

    /// Scenario name inside the file (defaults to the first one)
    #[arg(long)]
    name: Option<String>,

    /// Editor settings file (YAML or TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Node to edit, 1-based in time order
    #[arg(long, default_value_t = 1)]
    node: usize,

    /// Delta-v input applied to the node, e.g. `prograde:25` or `radial:-3.5` (m/s)
    #[arg(long, value_parser = parse_burn)]
    burn: Option<(ControlAxis, f64)>,

    /// Move the node to an event, e.g. `apoapsis`, `equatorial_an`, `closest_approach`
    #[arg(long, value_parser = parse_event)]
    snap: Option<EventKind>,

    /// Write the report as JSON (`-` for stdout)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the report as CSV (`-` for stdout)
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn parse_burn(text: &str) -> Result<(ControlAxis, f64), String> {
    let (axis, amount) = text
        .split_once(':')
        .ok_or_else(|| format!("expected AXIS:AMOUNT, got {text:?}"))?;
    let axis = ControlAxis::from_key(axis.trim()).ok_or_else(|| format!("unknown axis {axis:?}"))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|err| format!("invalid amount {amount:?}: {err}"))?;
    if !amount.is_finite() {
        return Err(format!("amount must be finite, got {amount}"));
    }
    Ok((axis, amount))
}

fn parse_event(text: &str) -> Result<EventKind, String> {
    EventKind::from_key(text).ok_or_else(|| {
        let known: Vec<_> = EventKind::ALL.iter().map(|kind| kind.key()).collect();
        format!("unknown event {text:?}; expected one of {}", known.join(", "))
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => load_settings(path).with_context(|| format!("loading settings {}", path.display()))?,
        None => Settings::default(),
    };
    let mut scenario = scenario::load_named(&cli.scenario, cli.name.as_deref())
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    let mut editor = Editor::new(settings).with_calendar(scenario.calendar);
    editor.set_target(&scenario.model, scenario.target.clone());

    if cli.burn.is_some() || cli.snap.is_some() {
        let index = cli
            .node
            .checked_sub(1)
            .ok_or_else(|| anyhow!("--node is 1-based"))?;
        let model = &mut scenario.model;
        let node = editor.attach(&*model, index)?;
        if let Some((axis, amount)) = cli.burn {
            let applied = editor.apply(model, axis, amount)?;
            info!(%node, axis = axis.key(), amount, slices = applied.slices, "burn applied");
        }
        if let Some(kind) = cli.snap {
            if !editor.snap(model, kind)? {
                eprintln!("[warn] {} is not available for node {}; node left in place", kind.label(), cli.node);
            }
        }
        editor.detach()?;
    }

    let report = event_report(&scenario, &mut editor)?;
    if cli.json.as_deref() != Some(Path::new("-")) && cli.csv.as_deref() != Some(Path::new("-")) {
        print_report(&report);
    }

    if let Some(path) = &cli.json {
        if let Err(err) = write_with(path, &report, export::json::write_report) {
            eprintln!("[warn] failed to write JSON report {}: {err}", path.display());
        }
    }
    if let Some(path) = &cli.csv {
        if let Err(err) = write_with(path, &report, export::csv::write_report) {
            eprintln!("[warn] failed to write CSV report {}: {err}", path.display());
        }
    }
    Ok(())
}

fn write_with(
    path: &Path,
    report: &EventReport,
    write: fn(&mut dyn Write, &EventReport) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let mut writer = export::writer_for_path(path)?;
    write(&mut *writer, report)?;
    writer.flush()
}

fn print_report(report: &EventReport) {
    println!("Scenario: {} (around {})", report.scenario, report.body);
    println!("Now: UT {:.3} s", report.now_s);
    if let Some(target) = &report.target {
        println!("Target: {target}");
    }
    if report.nodes.is_empty() {
        println!("No maneuver nodes planned.");
        return;
    }
    for node in &report.nodes {
        println!();
        println!(
            "Maneuver Node #{} at UT {:.3} s: {} [radial {:.2}, normal {:.2}, prograde {:.2}]",
            node.index,
            node.ut_s,
            format_speed(node.delta_v_total_m_s),
            node.delta_v_m_s[0],
            node.delta_v_m_s[1],
            node.delta_v_m_s[2],
        );
        for row in &node.events {
            match row.ut_s {
                Some(ut) => println!("  {:<18} UT {:>14.3}  in {}", row.label, ut, row.countdown),
                None => println!("  {:<18} -", row.label),
            }
        }
    }
}
