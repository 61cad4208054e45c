//! End-to-end tests of the store: editing, validation, history, snapshots
//! and simulation playback driven through the store.
//!
//! Timing is deterministic throughout: runners use `ManualScheduler` and
//! fixed step durations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nodes::{
    ApprovalData, ApprovalType, AutomatedData, EndData, KindTag, NodeKind, StartData, TaskData,
};
use scheduler::ManualScheduler;

use crate::catalog::Automation;
use crate::config::{EngineConfig, SimulationConfig};
use crate::error::EngineError;
use crate::layout::{LayeredLayout, LayoutDirection};
use crate::models::{Edge, Node, Position, WorkflowGraph};
use crate::simulation::{RunnerState, SimulationObserver, SimulationRunner, Speed};
use crate::steps::{FixedDurations, SimulationStep, StepStatus, NO_START_MESSAGE};
use crate::store::{SharedStore, StoreEvent, WorkflowStore};
use crate::validation::{CYCLE_DETECTED, EDGE_DANGLING, NODE_IS_ORPHANED, NO_START};

fn start(id: &str) -> Node {
    Node::new(id, NodeKind::Start(StartData::default()), Position::default())
}

fn task(id: &str, assignee: &str) -> Node {
    Node::new(
        id,
        NodeKind::Task(TaskData { assignee: Some(assignee.into()), ..TaskData::default() }),
        Position::default(),
    )
}

fn end(id: &str) -> Node {
    Node::new(id, NodeKind::End(EndData::default()), Position::default())
}

/// Start → Task → End, built through the store.
fn scenario_a_store() -> WorkflowStore {
    let mut store = WorkflowStore::default();
    store.add_node(start("s")).unwrap();
    store.add_node(task("t", "ana").with_label("Review")).unwrap();
    store.add_node(end("e")).unwrap();
    store.add_edge(Edge::new("s-t", "s", "t")).unwrap();
    store.add_edge(Edge::new("t-e", "t", "e")).unwrap();
    store
}

/// Runner over `graph` reporting into `shared`, with 100 ms steps.
fn runner_for(shared: &SharedStore, clock: &ManualScheduler) -> SimulationRunner<ManualScheduler> {
    let graph = shared.update(|store| {
        store.begin_simulation();
        store.graph().clone()
    });
    SimulationRunner::with_durations(
        graph,
        clock.clone(),
        Arc::new(shared.clone()),
        SimulationConfig::default(),
        Box::new(FixedDurations(100)),
    )
}

// ============================================================
// Scenarios
// ============================================================

#[test]
fn scenario_a_linear_workflow_is_clean_and_steps_in_order() {
    let store = scenario_a_store();
    assert!(store.report().issues().is_empty());
    assert!(store.report().is_valid());

    let shared = SharedStore::new(store);
    let clock = ManualScheduler::new();
    let runner = runner_for(&shared, &clock);
    runner.start();
    clock.run_until_idle();

    let trace: Vec<(Option<String>, StepStatus)> = shared.read(|store| {
        store
            .simulation()
            .steps
            .iter()
            .map(|s| (s.node_id.clone(), s.status))
            .collect()
    });
    let expected: Vec<(Option<String>, StepStatus)> = ["s", "t", "e"]
        .iter()
        .flat_map(|id| {
            [
                (Some(id.to_string()), StepStatus::Executing),
                (Some(id.to_string()), StepStatus::Completed),
            ]
        })
        .collect();
    assert_eq!(trace, expected);

    shared.read(|store| {
        let sim = store.simulation();
        assert!(!sim.is_running);
        assert!(sim.end_time.is_some());
        assert_eq!(sim.current_node_id, None);
        assert_eq!(sim.active_edge_id, None);
        assert!(store.graph().nodes.iter().all(|n| n.base.is_completed && !n.base.is_executing));
        assert_eq!(store.graph().node("t").and_then(|n| n.base.execution_time), Some(100));
    });
}

#[test]
fn scenario_b_empty_graph() {
    let store = WorkflowStore::default();
    let codes: Vec<_> = store.report().issues().iter().map(|i| i.code).collect();
    assert_eq!(codes, vec![NO_START]);

    let shared = SharedStore::new(store);
    assert!(matches!(
        shared.simulate(ManualScheduler::new(), SimulationConfig::default()),
        Err(EngineError::InvalidWorkflow(1))
    ));

    // Driving a runner directly still yields the single failed step.
    let clock = ManualScheduler::new();
    let runner = runner_for(&shared, &clock);
    runner.start();
    clock.run_until_idle();
    let steps: Vec<SimulationStep> = shared.read(|store| store.simulation().steps.clone());
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert_eq!(steps[0].message, NO_START_MESSAGE);
}

#[test]
fn scenario_c_cycle_warns_and_simulation_terminates() {
    let mut store = WorkflowStore::default();
    store.add_node(task("a", "ana")).unwrap();
    store.add_node(task("b", "ben")).unwrap();
    store.add_edge(Edge::new("ab", "a", "b")).unwrap();
    store.add_edge(Edge::new("ba", "b", "a")).unwrap();
    assert!(store.report().issues().iter().any(|i| i.code == CYCLE_DETECTED));

    store.add_node(start("s")).unwrap();
    store.add_edge(Edge::new("sa", "s", "a")).unwrap();

    let shared = SharedStore::new(store);
    let clock = ManualScheduler::new();
    let runner = runner_for(&shared, &clock);
    runner.start();
    clock.run_until_idle();

    assert_eq!(runner.state(), RunnerState::Completed);
    let executed: Vec<String> = shared.read(|store| {
        store
            .simulation()
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Executing)
            .filter_map(|s| s.node_id.clone())
            .collect()
    });
    assert_eq!(executed, vec!["s", "a", "b"]);
}

#[test]
fn scenario_d_single_approver_with_all() {
    let mut store = WorkflowStore::default();
    let id = store.create_node(KindTag::Approval, Position::default());
    store
        .update_node(&id, |_, kind| {
            if let NodeKind::Approval(approval) = kind {
                *approval = ApprovalData {
                    approvers: vec!["x".into()],
                    approval_type: Some(ApprovalType::All),
                    ..ApprovalData::default()
                };
            }
        })
        .unwrap();

    let issue = store
        .report()
        .for_node(&id)
        .find(|i| i.code == "APPROVAL_SINGLE_APPROVER_ALL")
        .cloned()
        .expect("single-approver warning");
    assert!(!issue.is_error());
}

// ============================================================
// Editing operations
// ============================================================

#[test]
fn duplicate_ids_are_refused() {
    let mut store = scenario_a_store();
    assert!(matches!(
        store.add_node(start("s")),
        Err(EngineError::DuplicateNodeId(id)) if id == "s"
    ));
    assert!(matches!(
        store.add_edge(Edge::new("s-t", "s", "e")),
        Err(EngineError::DuplicateEdgeId(_))
    ));
    assert!(matches!(
        store.add_edge(Edge::new("x", "s", "ghost")),
        Err(EngineError::UnknownNode(_))
    ));
}

#[test]
fn delete_node_cascades_and_clears_selection() {
    let mut store = scenario_a_store();
    store.select_node(Some("t"));
    store.delete_selected().unwrap();

    assert!(store.graph().node("t").is_none());
    assert!(store.graph().edges.is_empty());
    assert_eq!(store.selected_node(), None);
    assert!(matches!(store.delete_node("t"), Err(EngineError::UnknownNode(_))));
}

#[test]
fn duplicate_offsets_and_relabels() {
    let mut store = scenario_a_store();
    store.move_node("t", Position::new(100.0, 100.0)).unwrap();
    let copy_id = store.duplicate_node("t").unwrap();

    let copy = store.graph().node(&copy_id).unwrap();
    assert_ne!(copy_id, "t");
    assert!(copy_id.starts_with("task-"));
    assert_eq!(copy.position, Position::new(150.0, 150.0));
    assert_eq!(copy.label(), "Review (copy)");
    assert_eq!(copy.kind, store.graph().node("t").unwrap().kind);
}

#[test]
fn paste_remaps_ids_and_keeps_relative_offsets() {
    let mut store = scenario_a_store();
    store.move_node("s", Position::new(0.0, 0.0)).unwrap();
    store.move_node("t", Position::new(10.0, 200.0)).unwrap();
    store.copy_nodes(&["s", "t"]);

    let pasted = store.paste_nodes(Position::new(500.0, 500.0)).unwrap();
    assert_eq!(pasted.len(), 2);

    let graph = store.graph();
    let first = graph.node(&pasted[0]).unwrap();
    let second = graph.node(&pasted[1]).unwrap();
    assert_eq!(first.position, Position::new(500.0, 500.0));
    assert_eq!(second.position, Position::new(510.0, 700.0));

    // Only the s→t edge was inside the selection; it now joins the copies.
    let copied_edge = graph.edge_between(&pasted[0], &pasted[1]).expect("remapped edge");
    assert!(copied_edge.id.starts_with("edge-"));
    assert_eq!(graph.edges.len(), 3);
}

#[test]
fn paste_without_copy_fails() {
    let mut store = WorkflowStore::default();
    assert!(matches!(store.paste_nodes(Position::default()), Err(EngineError::EmptyClipboard)));
}

#[test]
fn update_edge_revalidates() {
    let mut store = scenario_a_store();
    store.update_edge("s-t", |data| data.probability = Some(1.5)).unwrap();
    assert_eq!(store.report().warning_count(), 1);
    store.update_edge("s-t", |data| data.probability = Some(0.5)).unwrap();
    assert!(store.report().issues().is_empty());
}

#[test]
fn set_nodes_replaces_wholesale_without_history() {
    let mut store = WorkflowStore::default();
    store.add_node(start("old")).unwrap();
    assert!(store.undo());
    assert!(!store.can_undo());

    store.set_nodes(vec![start("s"), end("e")]);

    let ids: Vec<&str> = store.graph().nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["s", "e"]);
    assert!(!store.can_undo());
    // Both nodes are isolated until edges arrive.
    let orphaned = store.report().issues().iter().filter(|i| i.code == NODE_IS_ORPHANED).count();
    assert_eq!(orphaned, 2);
}

#[test]
fn set_edges_keeps_dangling_edges_for_validation() {
    let mut store = scenario_a_store();

    store.set_edges(vec![Edge::new("s-e", "s", "e"), Edge::new("s-x", "s", "missing")]);

    let edge_ids: Vec<&str> = store.graph().edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids, vec!["s-e", "s-x"]);

    let dangling = store
        .report()
        .issues()
        .iter()
        .find(|i| i.code == EDGE_DANGLING)
        .expect("dangling edge reported");
    assert_eq!(dangling.edge_id.as_deref(), Some("s-x"));
    assert!(!store.report().is_valid());

    // Only the three add_node and two add_edge calls are on the undo stack.
    let mut undone = 0;
    while store.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
}

#[test]
fn assign_automation_copies_label_and_clears_params() {
    let mut store = scenario_a_store();
    let mut data = AutomatedData::default();
    data.params.insert("stale".into(), "value".into());
    store
        .add_node(Node::new("a", NodeKind::Automated(data), Position::default()))
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |event| sink.lock().unwrap().push(*event));

    store.set_automations(vec![Automation {
        id: "send_email".into(),
        label: "Send Email".into(),
        params: vec!["to".into()],
        description: None,
    }]);
    assert_eq!(*events.lock().unwrap(), vec![StoreEvent::CatalogChanged]);
    assert_eq!(store.automation_for("a"), None);

    store.assign_automation("a", "send_email").unwrap();
    let NodeKind::Automated(data) = &store.graph().node("a").unwrap().kind else {
        panic!("still automated");
    };
    assert_eq!(data.action_id.as_deref(), Some("send_email"));
    assert_eq!(data.action_label.as_deref(), Some("Send Email"));
    assert!(data.params.is_empty());

    let action = store.automation_for("a").expect("catalog entry");
    assert_eq!(action.missing_params(&data.params), vec!["to"]);
}

#[test]
fn assign_automation_rejects_bad_targets() {
    let mut store = scenario_a_store();
    store.set_automations(vec![Automation {
        id: "archive".into(),
        label: "Archive".into(),
        params: vec![],
        description: None,
    }]);
    let automated = NodeKind::Automated(AutomatedData::default());
    store.add_node(Node::new("a", automated, Position::default())).unwrap();

    assert!(matches!(
        store.assign_automation("a", "teleport"),
        Err(EngineError::UnknownAutomation(id)) if id == "teleport"
    ));
    assert!(matches!(
        store.assign_automation("t", "archive"),
        Err(EngineError::NotAutomated(_))
    ));
    assert!(matches!(
        store.assign_automation("ghost", "archive"),
        Err(EngineError::UnknownNode(_))
    ));
}

#[test]
fn layout_is_undoable() {
    let mut store = scenario_a_store();
    let before = store.graph().clone();
    store.apply_layout(&LayeredLayout::default(), LayoutDirection::TopBottom);

    let positions: Vec<Position> = store.graph().nodes.iter().map(|n| n.position).collect();
    assert_eq!(positions[0], Position::new(50.0, 50.0));
    assert_eq!(positions[2], Position::new(50.0, 450.0));

    assert!(store.undo());
    assert_eq!(store.graph(), &before);
}

// ============================================================
// History
// ============================================================

#[test]
fn n_undos_then_n_redos_restore_each_state() {
    let mut store = WorkflowStore::default();
    let mut states = vec![store.graph().clone()];
    for i in 0..5 {
        store.add_node(task(&format!("t{i}"), "ana")).unwrap();
        states.push(store.graph().clone());
    }

    for expected in states.iter().rev().skip(1) {
        assert!(store.undo());
        assert_eq!(store.graph(), expected);
    }
    assert!(!store.undo());

    for expected in states.iter().skip(1) {
        assert!(store.redo());
        assert_eq!(store.graph(), expected);
    }
    assert!(!store.redo());
}

#[test]
fn undo_revalidates() {
    let mut store = scenario_a_store();
    store.delete_node("s").unwrap();
    assert!(!store.report().is_valid());
    assert!(store.undo());
    assert!(store.report().is_valid());
}

#[test]
fn history_capacity_is_configurable() {
    let mut config = EngineConfig::default();
    config.history.capacity = 2;
    let mut store = WorkflowStore::new(&config);
    for i in 0..4 {
        store.add_node(task(&format!("t{i}"), "ana")).unwrap();
    }
    assert!(store.undo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.graph().nodes.len(), 2);
}

// ============================================================
// Snapshots
// ============================================================

#[test]
fn export_import_round_trip() {
    let store = scenario_a_store();
    let text = serde_json::to_string(&store.export_snapshot()).unwrap();

    let mut other = WorkflowStore::default();
    other.import_json(&text).unwrap();
    assert_eq!(other.graph(), store.graph());
    assert!(other.report().is_valid());
}

#[test]
fn rejected_import_changes_nothing() {
    let mut store = scenario_a_store();
    let before = store.graph().clone();
    let err = store
        .import_snapshot(&serde_json::json!({ "nodes": [{ "id": "x" }], "edges": [] }))
        .unwrap_err();
    assert!(matches!(err, EngineError::Import(_)));
    assert_eq!(store.graph(), &before);
}

#[test]
fn import_is_undoable() {
    let mut store = scenario_a_store();
    let before = store.graph().clone();
    store.import_snapshot(&serde_json::json!({ "nodes": [], "edges": [] })).unwrap();
    assert!(store.graph().is_empty());
    assert!(store.undo());
    assert_eq!(store.graph(), &before);
}

// ============================================================
// Subscriptions
// ============================================================

#[test]
fn listeners_see_graph_and_validation_changes() {
    let mut store = WorkflowStore::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = store.subscribe(move |event| sink.lock().unwrap().push(*event));

    store.add_node(start("s")).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![StoreEvent::GraphChanged, StoreEvent::ValidationChanged]
    );

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.add_node(end("e")).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn shared_store_delivers_after_unlocking() {
    let shared = SharedStore::new(WorkflowStore::default());
    let reads = Arc::new(AtomicUsize::new(0));

    let reader = shared.clone();
    let counter = reads.clone();
    shared.update(|store| {
        store.subscribe(move |event| {
            if *event == StoreEvent::GraphChanged {
                // Would deadlock if delivered under the lock.
                let nodes = reader.read(|s| s.graph().nodes.len());
                counter.fetch_add(nodes, Ordering::SeqCst);
            }
        })
    });

    shared.update(|store| store.add_node(start("s"))).unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

// ============================================================
// Simulation through the store
// ============================================================

#[test]
fn simulate_uses_store_speed() {
    let shared = SharedStore::new(scenario_a_store());
    shared.update(|store| store.set_simulation_speed(Speed::Fast));

    let clock = ManualScheduler::new();
    let runner = shared.simulate(clock.clone(), SimulationConfig::default()).unwrap();
    assert_eq!(runner.speed(), Speed::Fast);
    assert!(shared.read(|store| store.simulation().is_running));

    runner.start();
    clock.advance(Duration::from_millis(500));
    assert_eq!(shared.read(|store| store.simulation().steps.len()), 2);
}

#[test]
fn active_node_marks_previous_completed() {
    let mut store = scenario_a_store();
    store.set_active_node(Some("s"));
    store.set_active_node(Some("t"));

    let graph = store.graph();
    let s = graph.node("s").unwrap();
    let t = graph.node("t").unwrap();
    assert!(s.base.is_completed && !s.base.is_executing);
    assert!(t.base.is_executing && !t.base.is_completed);
    assert_eq!(store.simulation().current_node_id.as_deref(), Some("t"));

    store.reset_simulation();
    assert!(store.graph().nodes.iter().all(|n| !n.base.is_completed && !n.base.is_executing));
}

#[test]
fn reset_keeps_speed() {
    let mut store = WorkflowStore::default();
    store.set_simulation_speed(Speed::Slow);
    store.begin_simulation();
    store.reset_simulation();
    assert_eq!(store.simulation().speed, Speed::Slow);
    assert!(!store.simulation().is_running);
}

/// Observer that resets the run from inside `on_step` once a node is active.
struct ResetOnFirstActivation {
    store: SharedStore,
    runner: Mutex<Option<SimulationRunner<ManualScheduler>>>,
}

impl SimulationObserver for ResetOnFirstActivation {
    fn on_step(&self, step: &SimulationStep) {
        self.store.on_step(step);
    }

    fn on_complete(&self) {
        self.store.on_complete();
    }

    fn on_node_activate(&self, node_id: Option<&str>) {
        self.store.on_node_activate(node_id);
        if node_id.is_some() {
            let runner = self.runner.lock().unwrap().take();
            if let Some(runner) = runner {
                runner.reset();
                self.store.update(WorkflowStore::reset_simulation);
            }
        }
    }

    fn on_edge_activate(&self, edge_id: Option<&str>) {
        self.store.on_edge_activate(edge_id);
    }
}

#[test]
fn reset_inside_a_callback_leaves_store_idle() {
    let shared = SharedStore::new(scenario_a_store());
    let clock = ManualScheduler::new();
    let observer = Arc::new(ResetOnFirstActivation {
        store: shared.clone(),
        runner: Mutex::new(None),
    });

    let graph = shared.update(|store| {
        store.begin_simulation();
        store.graph().clone()
    });
    let runner = SimulationRunner::with_durations(
        graph,
        clock.clone(),
        observer.clone(),
        SimulationConfig::default(),
        Box::new(FixedDurations(100)),
    );
    *observer.runner.lock().unwrap() = Some(runner.clone());

    runner.start();
    assert_eq!(clock.run_until_idle(), 0);
    assert_eq!(runner.state(), RunnerState::Idle);

    shared.read(|store| {
        let sim = store.simulation();
        assert!(!sim.is_running);
        assert!(sim.steps.is_empty());
        assert_eq!(sim.current_node_id, None);
        assert!(store.graph().nodes.iter().all(|n| !n.base.is_executing && !n.base.is_completed));
    });
}

#[test]
fn fresh_store_graph_is_empty() {
    let store = WorkflowStore::with_graph(WorkflowGraph::default(), &EngineConfig::default());
    assert!(store.graph().is_empty());
    assert!(!store.can_undo());
}
