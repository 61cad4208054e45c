//! The workflow store: single owner of the graph under edit.
//!
//! Every mutation goes through a [`WorkflowStore`] method, which
//! 1. saves an undo snapshot when the change is structural,
//! 2. applies the change,
//! 3. re-runs validation, and
//! 4. notifies subscribers.
//!
//! [`SharedStore`] wraps the store for use from a simulation runner. It
//! queues notifications while the lock is held and delivers them after
//! unlocking, so listeners may call back into the store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use nodes::{BaseData, KindTag, NodeKind};
use scheduler::Scheduler;

use crate::catalog::Automation;
use crate::config::{EngineConfig, SimulationConfig};
use crate::error::EngineError;
use crate::history::History;
use crate::layout::{LayoutDirection, LayoutEngine};
use crate::models::{Edge, EdgeData, EdgeId, Node, NodeId, Position, WorkflowGraph};
use crate::simulation::{SimulationObserver, SimulationRunner, Speed};
use crate::snapshot::{self, ExportedWorkflow};
use crate::steps::{SimulationStep, StepStatus};
use crate::validation::ValidationReport;

/// Offset applied to a duplicated node.
const DUPLICATE_OFFSET: f64 = 50.0;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// What the editor shows about the current or last simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub is_running: bool,
    pub is_paused: bool,
    pub current_node_id: Option<NodeId>,
    pub active_edge_id: Option<EdgeId>,
    pub steps: Vec<SimulationStep>,
    pub speed: Speed,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// Nodes or edges changed, including transient simulation flags.
    GraphChanged,
    ValidationChanged,
    SimulationChanged,
    /// The automation catalog was replaced.
    CatalogChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

// ---------------------------------------------------------------------------
// WorkflowStore
// ---------------------------------------------------------------------------

pub struct WorkflowStore {
    graph: WorkflowGraph,
    report: ValidationReport,
    simulation: SimulationState,
    history: History,
    clipboard: Option<WorkflowGraph>,
    automations: Vec<Automation>,
    selected_node: Option<NodeId>,
    selected_edge: Option<EdgeId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    /// When set, events are queued here instead of being delivered.
    deferred: Option<Vec<StoreEvent>>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("nodes", &self.graph.nodes.len())
            .field("edges", &self.graph.edges.len())
            .field("issues", &self.report.issues().len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl WorkflowStore {
    pub fn new(config: &EngineConfig) -> Self {
        let graph = WorkflowGraph::default();
        Self {
            report: ValidationReport::from_graph(&graph),
            graph,
            simulation: SimulationState::default(),
            history: History::new(config.history.clone()),
            clipboard: None,
            automations: Vec::new(),
            selected_node: None,
            selected_edge: None,
            listeners: Vec::new(),
            next_subscription: 0,
            deferred: None,
        }
    }

    /// Store opened on an existing graph, with empty history.
    pub fn with_graph(graph: WorkflowGraph, config: &EngineConfig) -> Self {
        let mut store = Self::new(config);
        store.report = ValidationReport::from_graph(&graph);
        store.graph = graph;
        store
    }

    // -- readers ------------------------------------------------------------

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn selected_edge(&self) -> Option<&str> {
        self.selected_edge.as_deref()
    }

    pub fn clipboard(&self) -> Option<&WorkflowGraph> {
        self.clipboard.as_ref()
    }

    // -- subscriptions ------------------------------------------------------

    pub fn subscribe(
        &mut self,
        listener: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: StoreEvent) {
        if let Some(queue) = self.deferred.as_mut() {
            if !queue.contains(&event) {
                queue.push(event);
            }
            return;
        }
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    /// Re-validate after a graph mutation and notify.
    fn graph_changed(&mut self) {
        let report = ValidationReport::from_graph(&self.graph);
        self.emit(StoreEvent::GraphChanged);
        if report != self.report {
            self.report = report;
            self.emit(StoreEvent::ValidationChanged);
        }
    }

    pub fn run_validation(&mut self) -> &ValidationReport {
        let report = ValidationReport::from_graph(&self.graph);
        if report != self.report {
            self.report = report;
            self.emit(StoreEvent::ValidationChanged);
        }
        &self.report
    }

    // -- nodes --------------------------------------------------------------

    /// Fresh node id for a kind, e.g. `task-6f1c…`.
    pub fn new_node_id(tag: KindTag) -> NodeId {
        format!("{tag}-{}", Uuid::new_v4())
    }

    pub fn new_edge_id() -> EdgeId {
        format!("edge-{}", Uuid::new_v4())
    }

    /// # Errors
    /// [`EngineError::DuplicateNodeId`] if the id is taken.
    #[instrument(skip(self, node), fields(node_id = %node.id, kind = %node.tag()))]
    pub fn add_node(&mut self, node: Node) -> Result<(), EngineError> {
        if self.graph.contains_node(&node.id) {
            return Err(EngineError::DuplicateNodeId(node.id));
        }
        self.history.save(&self.graph);
        self.graph.nodes.push(node);
        self.graph_changed();
        Ok(())
    }

    /// Add an empty node of `tag` with its default label.
    pub fn create_node(&mut self, tag: KindTag, position: Position) -> NodeId {
        let id = Self::new_node_id(tag);
        self.history.save(&self.graph);
        self.graph.nodes.push(Node::new(id.clone(), NodeKind::empty(tag), position));
        self.graph_changed();
        debug!(node_id = %id, "node created");
        id
    }

    /// Edit a node's fields in place. Not recorded in history.
    ///
    /// # Errors
    /// [`EngineError::UnknownNode`] if no node has this id.
    pub fn update_node(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut BaseData, &mut NodeKind),
    ) -> Result<(), EngineError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_owned()))?;
        edit(&mut node.base, &mut node.kind);
        self.graph_changed();
        Ok(())
    }

    /// Not recorded in history.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), EngineError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_owned()))?;
        node.position = position;
        self.emit(StoreEvent::GraphChanged);
        Ok(())
    }

    /// Remove a node and every edge touching it.
    #[instrument(skip(self))]
    pub fn delete_node(&mut self, id: &str) -> Result<Node, EngineError> {
        if !self.graph.contains_node(id) {
            return Err(EngineError::UnknownNode(id.to_owned()));
        }
        self.history.save(&self.graph);
        let (node, cascaded) = self
            .graph
            .remove_node(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_owned()))?;
        if self.selected_node.as_deref() == Some(id) {
            self.selected_node = None;
        }
        debug!(cascaded, "node deleted");
        self.graph_changed();
        Ok(node)
    }

    /// Copy of a node, offset and relabelled `"<label> (copy)"`.
    #[instrument(skip(self))]
    pub fn duplicate_node(&mut self, id: &str) -> Result<NodeId, EngineError> {
        let original = self
            .graph
            .node(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_owned()))?;

        let mut copy = original.clone();
        copy.id = Self::new_node_id(original.tag());
        copy.position = original.position.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        copy.base.label = format!("{} (copy)", original.base.label);
        copy.base.clear_simulation_flags();

        let new_id = copy.id.clone();
        self.history.save(&self.graph);
        self.graph.nodes.push(copy);
        self.graph_changed();
        Ok(new_id)
    }

    /// Replace every node. Not recorded in history.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.graph.nodes = nodes;
        self.graph_changed();
    }

    // -- edges --------------------------------------------------------------

    /// # Errors
    /// [`EngineError::DuplicateEdgeId`] if the id is taken,
    /// [`EngineError::UnknownNode`] if either endpoint does not exist.
    #[instrument(
        skip(self, edge),
        fields(edge_id = %edge.id, source = %edge.source, target = %edge.target)
    )]
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), EngineError> {
        if self.graph.edge(&edge.id).is_some() {
            return Err(EngineError::DuplicateEdgeId(edge.id));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.graph.contains_node(endpoint) {
                return Err(EngineError::UnknownNode(endpoint.clone()));
            }
        }
        self.history.save(&self.graph);
        self.graph.edges.push(edge);
        self.graph_changed();
        Ok(())
    }

    /// Add an edge with a generated id.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<EdgeId, EngineError> {
        let id = Self::new_edge_id();
        self.add_edge(Edge::new(id.clone(), source, target))?;
        Ok(id)
    }

    /// Edit an edge's annotations. Not recorded in history.
    pub fn update_edge(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut EdgeData),
    ) -> Result<(), EngineError> {
        let edge = self
            .graph
            .edge_mut(id)
            .ok_or_else(|| EngineError::UnknownEdge(id.to_owned()))?;
        edit(&mut edge.data);
        self.graph_changed();
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_edge(&mut self, id: &str) -> Result<Edge, EngineError> {
        if self.graph.edge(id).is_none() {
            return Err(EngineError::UnknownEdge(id.to_owned()));
        }
        self.history.save(&self.graph);
        let edge = self
            .graph
            .remove_edge(id)
            .ok_or_else(|| EngineError::UnknownEdge(id.to_owned()))?;
        if self.selected_edge.as_deref() == Some(id) {
            self.selected_edge = None;
        }
        self.graph_changed();
        Ok(edge)
    }

    /// Replace every edge. Not recorded in history.
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.graph.edges = edges;
        self.graph_changed();
    }

    // -- automation catalog -------------------------------------------------

    pub fn automations(&self) -> &[Automation] {
        &self.automations
    }

    pub fn automation(&self, id: &str) -> Option<&Automation> {
        self.automations.iter().find(|a| a.id == id)
    }

    /// Replace the catalog. Nodes keep their action ids even when the new
    /// catalog no longer lists them.
    pub fn set_automations(&mut self, automations: Vec<Automation>) {
        debug!(count = automations.len(), "automation catalog replaced");
        self.automations = automations;
        self.emit(StoreEvent::CatalogChanged);
    }

    /// Catalog entry an automated node points at, if it is listed.
    pub fn automation_for(&self, node_id: &str) -> Option<&Automation> {
        match &self.graph.node(node_id)?.kind {
            NodeKind::Automated(data) => self.automation(data.action_id.as_deref()?),
            _ => None,
        }
    }

    /// Point an automated node at a catalog action. The action label is
    /// copied from the catalog and previously entered params are cleared.
    /// Not recorded in history.
    ///
    /// # Errors
    /// [`EngineError::UnknownNode`], [`EngineError::NotAutomated`] or
    /// [`EngineError::UnknownAutomation`].
    pub fn assign_automation(&mut self, node_id: &str, action_id: &str) -> Result<(), EngineError> {
        let label = self
            .automation(action_id)
            .map(|a| a.label.clone())
            .ok_or_else(|| EngineError::UnknownAutomation(action_id.to_owned()))?;
        let node = self
            .graph
            .node_mut(node_id)
            .ok_or_else(|| EngineError::UnknownNode(node_id.to_owned()))?;
        let NodeKind::Automated(data) = &mut node.kind else {
            return Err(EngineError::NotAutomated(node_id.to_owned()));
        };
        data.action_id = Some(action_id.to_owned());
        data.action_label = Some(label);
        data.params.clear();
        self.graph_changed();
        Ok(())
    }

    // -- selection ----------------------------------------------------------

    /// Selecting a node clears the edge selection.
    pub fn select_node(&mut self, id: Option<&str>) {
        self.selected_node = id.map(str::to_owned);
        self.selected_edge = None;
    }

    /// Selecting an edge clears the node selection.
    pub fn select_edge(&mut self, id: Option<&str>) {
        self.selected_edge = id.map(str::to_owned);
        self.selected_node = None;
    }

    /// Delete whichever node or edge is selected. Returns whether anything was removed.
    pub fn delete_selected(&mut self) -> Result<bool, EngineError> {
        if let Some(id) = self.selected_node.clone() {
            self.delete_node(&id)?;
            return Ok(true);
        }
        if let Some(id) = self.selected_edge.clone() {
            self.delete_edge(&id)?;
            return Ok(true);
        }
        Ok(false)
    }

    // -- clipboard ----------------------------------------------------------

    /// Copy the given nodes and the edges running between them.
    pub fn copy_nodes(&mut self, ids: &[&str]) {
        let nodes: Vec<Node> = self
            .graph
            .nodes
            .iter()
            .filter(|n| ids.contains(&n.id.as_str()))
            .cloned()
            .collect();
        let edges: Vec<Edge> = self
            .graph
            .edges
            .iter()
            .filter(|e| ids.contains(&e.source.as_str()) && ids.contains(&e.target.as_str()))
            .cloned()
            .collect();
        debug!(nodes = nodes.len(), edges = edges.len(), "copied to clipboard");
        self.clipboard = Some(WorkflowGraph::new(nodes, edges));
    }

    /// Paste the clipboard with its first node at `anchor`, keeping relative
    /// offsets. Every pasted node and edge gets a fresh id.
    ///
    /// # Errors
    /// [`EngineError::EmptyClipboard`] if nothing was copied.
    #[instrument(skip(self))]
    pub fn paste_nodes(&mut self, anchor: Position) -> Result<Vec<NodeId>, EngineError> {
        let clipboard = self
            .clipboard
            .as_ref()
            .filter(|c| !c.nodes.is_empty())
            .ok_or(EngineError::EmptyClipboard)?;

        let origin = clipboard.nodes[0].position;
        let mut id_map: HashMap<&str, NodeId> = HashMap::new();
        let mut nodes = Vec::with_capacity(clipboard.nodes.len());
        for node in &clipboard.nodes {
            let mut pasted = node.clone();
            pasted.id = Self::new_node_id(node.tag());
            pasted.position = anchor.offset(node.position.x - origin.x, node.position.y - origin.y);
            pasted.base.clear_simulation_flags();
            id_map.insert(node.id.as_str(), pasted.id.clone());
            nodes.push(pasted);
        }

        let remap = |id: &str| id_map.get(id).cloned().unwrap_or_else(|| id.to_owned());
        let edges: Vec<Edge> = clipboard
            .edges
            .iter()
            .map(|edge| Edge {
                id: Self::new_edge_id(),
                source: remap(&edge.source),
                target: remap(&edge.target),
                data: edge.data.clone(),
            })
            .collect();

        let new_ids: Vec<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
        self.history.save(&self.graph);
        self.graph.nodes.extend(nodes);
        self.graph.edges.extend(edges);
        self.graph_changed();
        Ok(new_ids)
    }

    // -- layout, import, export ---------------------------------------------

    #[instrument(skip(self, engine))]
    pub fn apply_layout(&mut self, engine: &dyn LayoutEngine, direction: LayoutDirection) {
        let positions = engine.layout(&self.graph, direction);
        self.history.save(&self.graph);
        for node in &mut self.graph.nodes {
            if let Some(position) = positions.get(&node.id) {
                node.position = *position;
            }
        }
        self.graph_changed();
    }

    /// Replace the graph with a snapshot. A rejected snapshot leaves the
    /// store untouched.
    #[instrument(skip(self, value))]
    pub fn import_snapshot(&mut self, value: &Value) -> Result<(), EngineError> {
        let graph = snapshot::import_snapshot(value)
            .inspect_err(|e| warn!(error = %e, "import rejected"))?;
        info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "workflow imported");
        self.history.save(&self.graph);
        self.graph = graph;
        self.selected_node = None;
        self.selected_edge = None;
        self.graph_changed();
        Ok(())
    }

    pub fn import_json(&mut self, text: &str) -> Result<(), EngineError> {
        let value: Value = serde_json::from_str(text).map_err(crate::error::ImportError::Parse)?;
        self.import_snapshot(&value)
    }

    pub fn export_snapshot(&self) -> ExportedWorkflow {
        snapshot::export_snapshot(&self.graph)
    }

    // -- history ------------------------------------------------------------

    /// Returns `false` when there was nothing to undo.
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.graph) {
            Some(previous) => {
                self.graph = previous;
                self.graph_changed();
                true
            }
            None => false,
        }
    }

    /// Returns `false` when there was nothing to redo.
    #[instrument(skip(self))]
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.graph) {
            Some(next) => {
                self.graph = next;
                self.graph_changed();
                true
            }
            None => false,
        }
    }

    // -- simulation state ---------------------------------------------------

    /// Clear the previous run and mark a new one as running.
    pub fn begin_simulation(&mut self) {
        self.reset_simulation();
        self.simulation.is_running = true;
        self.simulation.start_time = Some(Utc::now());
        self.emit(StoreEvent::SimulationChanged);
    }

    /// Append a step; an executing step also records the node's duration.
    pub fn record_step(&mut self, step: SimulationStep) {
        if step.status == StepStatus::Executing {
            if let (Some(id), Some(ms)) = (step.node_id.as_deref(), step.duration) {
                if let Some(node) = self.graph.node_mut(id) {
                    node.base.execution_time = Some(ms);
                    self.emit(StoreEvent::GraphChanged);
                }
            }
        }
        self.simulation.steps.push(step);
        self.emit(StoreEvent::SimulationChanged);
    }

    /// Highlight `id` as executing. The previously active node is marked
    /// completed once another node (or nothing) takes over.
    pub fn set_active_node(&mut self, id: Option<&str>) {
        let previous = self.simulation.current_node_id.take();
        for node in &mut self.graph.nodes {
            let is_active = id == Some(node.id.as_str());
            let was_active = previous.as_deref() == Some(node.id.as_str());
            node.base.is_executing = is_active;
            if was_active && !is_active {
                node.base.is_completed = true;
            }
        }
        self.simulation.current_node_id = id.map(str::to_owned);
        self.emit(StoreEvent::GraphChanged);
        self.emit(StoreEvent::SimulationChanged);
    }

    pub fn set_active_edge(&mut self, id: Option<&str>) {
        self.simulation.active_edge_id = id.map(str::to_owned);
        self.emit(StoreEvent::SimulationChanged);
    }

    pub fn set_simulation_paused(&mut self, paused: bool) {
        self.simulation.is_paused = paused;
        self.emit(StoreEvent::SimulationChanged);
    }

    pub fn set_simulation_speed(&mut self, speed: Speed) {
        self.simulation.speed = speed;
        self.emit(StoreEvent::SimulationChanged);
    }

    pub fn finish_simulation(&mut self) {
        self.simulation.is_running = false;
        self.simulation.is_paused = false;
        self.simulation.end_time = Some(Utc::now());
        info!(steps = self.simulation.steps.len(), "simulation finished");
        self.emit(StoreEvent::SimulationChanged);
    }

    /// Back to an idle run; the chosen speed is kept.
    pub fn reset_simulation(&mut self) {
        self.simulation = SimulationState {
            speed: self.simulation.speed,
            ..SimulationState::default()
        };
        self.graph.clear_simulation_flags();
        self.emit(StoreEvent::GraphChanged);
        self.emit(StoreEvent::SimulationChanged);
    }
}

// ---------------------------------------------------------------------------
// SharedStore
// ---------------------------------------------------------------------------

/// Thread-safe handle onto a [`WorkflowStore`].
///
/// Listeners registered on the inner store are called after the lock is
/// released, once per distinct event kind per [`SharedStore::update`].
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<WorkflowStore>>,
}

impl SharedStore {
    pub fn new(store: WorkflowStore) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the store, then deliver the events it raised.
    pub fn update<R>(&self, f: impl FnOnce(&mut WorkflowStore) -> R) -> R {
        let (result, events, listeners) = {
            let mut store = self.lock();
            store.deferred = Some(Vec::new());
            let result = f(&mut *store);
            let events = store.deferred.take().unwrap_or_default();
            let listeners: Vec<Listener> =
                store.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (result, events, listeners)
        };
        for event in &events {
            for listener in &listeners {
                listener(event);
            }
        }
        result
    }

    /// Read from the store without raising events.
    pub fn read<R>(&self, f: impl FnOnce(&WorkflowStore) -> R) -> R {
        f(&*self.lock())
    }

    /// Build a runner over a snapshot of the current graph, driving this
    /// store, and mark the run as started. Playback begins on `start()`.
    ///
    /// # Errors
    /// [`EngineError::InvalidWorkflow`] if validation reports errors.
    pub fn simulate<S: Scheduler + 'static>(
        &self,
        scheduler: S,
        config: SimulationConfig,
    ) -> Result<SimulationRunner<S>, EngineError> {
        let (graph, speed) = self.update(|store| {
            let errors = store.report().error_count();
            if errors > 0 {
                return Err(EngineError::InvalidWorkflow(errors));
            }
            store.begin_simulation();
            Ok((store.graph().clone(), store.simulation().speed))
        })?;

        let runner = SimulationRunner::new(graph, scheduler, Arc::new(self.clone()), config);
        runner.set_speed(speed);
        Ok(runner)
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedStore").field(&*self.lock()).finish()
    }
}

impl SimulationObserver for SharedStore {
    fn on_step(&self, step: &SimulationStep) {
        self.update(|store| store.record_step(step.clone()));
    }

    fn on_complete(&self) {
        self.update(WorkflowStore::finish_simulation);
    }

    fn on_node_activate(&self, node_id: Option<&str>) {
        self.update(|store| store.set_active_node(node_id));
    }

    fn on_edge_activate(&self, edge_id: Option<&str>) {
        self.update(|store| store.set_active_edge(edge_id));
    }
}
