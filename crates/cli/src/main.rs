//! `workflow-designer` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — list the validation issues of a workflow file.
//! - `simulate` — play a workflow's simulation in the terminal.
//! - `layout`   — auto-arrange a workflow and write it back out.
//! - `metrics`  — print the analytics summary of a workflow.
//! - `versions` — manage saved versions of a workflow.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing::info;

use engine::{
    edge_stats, format_duration, snapshot, Automation, EngineConfig, LayeredLayout,
    LayoutDirection, SharedStore, Speed, StoreEvent, WorkflowGraph, WorkflowMetrics,
    WorkflowStore,
};
use nodes::NodeKind;
use scheduler::{ManualScheduler, TokioScheduler};
use versions::{VersionStore, DEFAULT_MAX_VERSIONS};

#[derive(Parser)]
#[command(
    name = "workflow-designer",
    about = "Validate, simulate and arrange workflow graphs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow snapshot file.
    Validate {
        /// Path to the exported workflow JSON.
        path: PathBuf,
        /// Print the issues as JSON.
        #[arg(long)]
        json: bool,
        /// Automation catalog (JSON list) to check automated nodes against.
        #[arg(long, env = "WORKFLOW_AUTOMATIONS_FILE")]
        automations: Option<PathBuf>,
    },
    /// Play the simulation of a workflow.
    Simulate {
        path: PathBuf,
        /// Delay between steps: slow, normal or fast.
        #[arg(long, default_value = "normal")]
        speed: Speed,
        /// Seed for the simulated step durations.
        #[arg(long, env = "WORKFLOW_SIM_SEED")]
        seed: Option<u64>,
        /// Skip the real-time delays.
        #[arg(long)]
        instant: bool,
    },
    /// Auto-arrange the nodes of a workflow.
    Layout {
        path: PathBuf,
        /// TB (top to bottom) or LR (left to right).
        #[arg(long, default_value = "TB")]
        direction: LayoutDirection,
        /// Where to write the arranged workflow; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print node counts, estimated cycle time and health score.
    Metrics { path: PathBuf },
    /// Manage saved versions.
    Versions {
        #[arg(long, env = "WORKFLOW_VERSIONS_FILE", default_value = "workflow-versions.json")]
        versions_file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MAX_VERSIONS)]
        max_versions: usize,
        #[command(subcommand)]
        action: VersionAction,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// List saved versions, newest first.
    List,
    /// Save a workflow file as a new version.
    Save {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Compare a workflow file against a saved version.
    Diff { path: PathBuf, id: String },
    /// Write a saved version out as a workflow snapshot.
    Show { id: String },
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate { path, json, automations } => {
            validate(&path, json, automations.as_deref())
        }
        Command::Simulate { path, speed, seed, instant } => {
            simulate(&path, speed, seed, instant).await
        }
        Command::Layout { path, direction, output } => layout(&path, direction, output.as_deref()),
        Command::Metrics { path } => metrics(&path),
        Command::Versions { versions_file, max_versions, action } => {
            manage_versions(VersionStore::load(versions_file, max_versions), action)
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn load_graph(path: &Path) -> Result<WorkflowGraph> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    snapshot::import_json(&content).with_context(|| format!("cannot import {}", path.display()))
}

fn load_catalog(path: &Path) -> Result<Vec<Automation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("cannot parse automation catalog {}", path.display()))
}

/// Automated nodes whose action is not in the catalog or lacks parameters.
fn catalog_notes(store: &WorkflowStore) -> Vec<String> {
    let mut notes = Vec::new();
    for node in &store.graph().nodes {
        let NodeKind::Automated(data) = &node.kind else {
            continue;
        };
        let Some(action_id) = data.action_id.as_deref() else {
            continue;
        };
        match store.automation_for(&node.id) {
            None => notes.push(format!("{}: action '{action_id}' is not in the catalog", node.id)),
            Some(action) => {
                let missing = action.missing_params(&data.params);
                if !missing.is_empty() {
                    notes.push(format!(
                        "{}: '{}' is missing {}",
                        node.id,
                        action.label,
                        missing.join(", ")
                    ));
                }
            }
        }
    }
    notes
}

fn validate(path: &Path, json: bool, automations: Option<&Path>) -> Result<()> {
    let mut store = WorkflowStore::with_graph(load_graph(path)?, &EngineConfig::default());
    if let Some(catalog) = automations {
        store.set_automations(load_catalog(catalog)?);
        for note in catalog_notes(&store) {
            eprintln!("   note {note}");
        }
    }
    let report = store.report();

    if json {
        println!("{}", serde_json::to_string_pretty(report.issues())?);
    } else {
        for issue in report.issues() {
            let target = issue
                .node_id
                .as_deref()
                .or(issue.edge_id.as_deref())
                .unwrap_or("workflow");
            let marker = if issue.is_error() { "error" } else { "warning" };
            println!("{marker:>7} [{}] {target}: {}", issue.code, issue.message);
        }
    }

    if !report.is_valid() {
        bail!("validation failed with {} error(s)", report.error_count());
    }
    println!(
        "✅ Workflow is valid ({} warning(s), {} node(s), {} edge(s)).",
        report.warning_count(),
        store.graph().nodes.len(),
        store.graph().edges.len()
    );
    Ok(())
}

async fn simulate(path: &Path, speed: Speed, seed: Option<u64>, instant: bool) -> Result<()> {
    let mut config = EngineConfig::default();
    config.simulation.seed = seed;

    let shared = SharedStore::new(WorkflowStore::with_graph(load_graph(path)?, &config));
    shared.update(|store| store.set_simulation_speed(speed));

    // Print steps as the store records them and signal when the run ends.
    let finished = Arc::new(Notify::new());
    let printed = Arc::new(AtomicUsize::new(0));
    {
        let reader = shared.clone();
        let finished = finished.clone();
        shared.update(|store| {
            store.subscribe(move |event| {
                if *event != StoreEvent::SimulationChanged {
                    return;
                }
                let (fresh, done) = reader.read(|store| {
                    let sim = store.simulation();
                    let from = printed.load(Ordering::SeqCst).min(sim.steps.len());
                    (sim.steps[from..].to_vec(), !sim.is_running && sim.end_time.is_some())
                });
                printed.fetch_add(fresh.len(), Ordering::SeqCst);
                for step in fresh {
                    let duration =
                        step.duration.map(|ms| format!(" ({ms} ms)")).unwrap_or_default();
                    println!("  {:<9?} {}{duration}", step.status, step.message);
                }
                if done {
                    finished.notify_one();
                }
            })
        });
    }

    info!(speed = %speed, instant, "starting simulation");
    if instant {
        let clock = ManualScheduler::new();
        let runner = shared.simulate(clock.clone(), config.simulation)?;
        runner.start();
        clock.run_until_idle();
    } else {
        let runner = shared.simulate(TokioScheduler::current()?, config.simulation)?;
        runner.start();
        finished.notified().await;
    }

    let steps = shared.read(|store| store.simulation().steps.len());
    println!("✅ Simulation finished after {steps} step(s).");
    Ok(())
}

fn layout(path: &Path, direction: LayoutDirection, output: Option<&Path>) -> Result<()> {
    let mut store = WorkflowStore::with_graph(load_graph(path)?, &EngineConfig::default());
    store.apply_layout(&LayeredLayout::default(), direction);

    let text = serde_json::to_string_pretty(&store.export_snapshot())?;
    match output {
        Some(out) => {
            fs::write(out, text).with_context(|| format!("cannot write {}", out.display()))?;
            info!(nodes = store.graph().nodes.len(), output = %out.display(), "layout written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn metrics(path: &Path) -> Result<()> {
    let store = WorkflowStore::with_graph(load_graph(path)?, &EngineConfig::default());
    let metrics = WorkflowMetrics::compute(store.graph(), store.report());
    let edges: Vec<serde_json::Value> = store
        .graph()
        .edges
        .iter()
        .filter_map(|edge| {
            let stats = edge_stats(edge)?;
            Some(serde_json::json!({
                "id": edge.id,
                "stats": stats,
                "avgTimeLabel": format_duration(stats.avg_time.max(0.0).round() as u64),
            }))
        })
        .collect();
    let summary = serde_json::json!({ "workflow": metrics, "edges": edges });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn manage_versions(mut versions: VersionStore, action: VersionAction) -> Result<()> {
    match action {
        VersionAction::List => {
            for v in versions.list() {
                println!(
                    "{}  {}  {} node(s), {} edge(s)  {}",
                    v.id,
                    v.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    v.nodes.len(),
                    v.edges.len(),
                    v.name
                );
            }
        }
        VersionAction::Save { path, name } => {
            let version = versions.save(&load_graph(&path)?, name.as_deref());
            println!("✅ Saved {} as '{}'", version.id, version.name);
        }
        VersionAction::Diff { path, id } => {
            let current = load_graph(&path)?;
            let version = versions
                .get(&id)
                .with_context(|| format!("no saved version '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&versions::diff(&current, version))?);
        }
        VersionAction::Show { id } => {
            let version = versions
                .get(&id)
                .with_context(|| format!("no saved version '{id}'"))?;
            println!("{}", snapshot::export_json(&version.graph())?);
        }
        VersionAction::Delete { id } => {
            let removed = versions.delete(&id)?;
            println!("✅ Deleted '{}'", removed.name);
        }
    }
    Ok(())
}
