//! Per-kind field checks.
//!
//! These look at a single node in isolation. Structural rules that need the
//! rest of the graph (edges, reachability, cycles) live in the engine.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    ApprovalData, ApprovalType, AutomatedData, BaseData, EndData, NodeKind, StartData, TaskData,
};

pub const MISSING_LABEL: &str = "MISSING_LABEL";
pub const TASK_NO_ASSIGNEE: &str = "TASK_NO_ASSIGNEE";
pub const APPROVAL_NO_APPROVERS: &str = "APPROVAL_NO_APPROVERS";
pub const APPROVAL_SINGLE_APPROVER_ALL: &str = "APPROVAL_SINGLE_APPROVER_ALL";
pub const APPROVAL_BAD_ESCALATION_EMAIL: &str = "APPROVAL_BAD_ESCALATION_EMAIL";
pub const AUTOMATION_NO_ACTION: &str = "AUTOMATION_NO_ACTION";
pub const AUTOMATION_NO_PARAMS: &str = "AUTOMATION_NO_PARAMS";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// How much a finding blocks simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocking: the workflow is not simulation-eligible.
    Error,
    /// Advisory only.
    Warning,
}

/// A single problem found on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Stable identifier, e.g. `APPROVAL_NO_APPROVERS`.
    pub code: &'static str,
    pub message: String,
}

impl Finding {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, code, message: message.into() }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, code, message: message.into() }
    }
}

/// Field-level rules of one kind-specific record.
pub trait FieldCheck {
    /// Every problem with this record; an empty list means it is complete.
    fn check_fields(&self) -> Vec<Finding>;
}

impl FieldCheck for StartData {
    fn check_fields(&self) -> Vec<Finding> {
        Vec::new()
    }
}

impl FieldCheck for TaskData {
    fn check_fields(&self) -> Vec<Finding> {
        if is_blank(self.assignee.as_deref()) {
            return vec![Finding::warning(
                TASK_NO_ASSIGNEE,
                "Task has no assignee; tasks without assignees may not be actionable.",
            )];
        }
        Vec::new()
    }
}

impl FieldCheck for ApprovalData {
    fn check_fields(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        if self.approvers.is_empty() {
            findings.push(Finding::error(
                APPROVAL_NO_APPROVERS,
                "Approval node requires at least one approver.",
            ));
        } else if self.approvers.len() == 1 && self.approval_type == Some(ApprovalType::All) {
            findings.push(Finding::warning(
                APPROVAL_SINGLE_APPROVER_ALL,
                "Approval type \"All approvers\" with a single approver is equivalent to \"Any\".",
            ));
        }

        if let Some(email) = self.escalation_email.as_deref().filter(|e| !e.is_empty()) {
            if !EMAIL_PATTERN.is_match(email) {
                findings.push(Finding::warning(
                    APPROVAL_BAD_ESCALATION_EMAIL,
                    "Escalation email does not look like a valid email address.",
                ));
            }
        }

        findings
    }
}

impl FieldCheck for AutomatedData {
    fn check_fields(&self) -> Vec<Finding> {
        if is_blank(self.action_id.as_deref()) {
            return vec![Finding::error(
                AUTOMATION_NO_ACTION,
                "Automated node must have an action selected.",
            )];
        }
        if self.params.is_empty() {
            return vec![Finding::warning(
                AUTOMATION_NO_PARAMS,
                "Automated action has no parameters specified; \
                 verify required params for the selected action.",
            )];
        }
        Vec::new()
    }
}

// Outgoing-edge rule for end nodes needs the graph; see the engine.
impl FieldCheck for EndData {
    fn check_fields(&self) -> Vec<Finding> {
        Vec::new()
    }
}

impl FieldCheck for NodeKind {
    fn check_fields(&self) -> Vec<Finding> {
        match self {
            Self::Start(d)     => d.check_fields(),
            Self::Task(d)      => d.check_fields(),
            Self::Approval(d)  => d.check_fields(),
            Self::Automated(d) => d.check_fields(),
            Self::End(d)       => d.check_fields(),
        }
    }
}

/// Label rule (shared by every kind) followed by the kind's own rules.
pub fn check_node(base: &BaseData, kind: &NodeKind) -> Vec<Finding> {
    let mut findings = Vec::new();
    if base.label.trim().is_empty() {
        findings.push(Finding::error(
            MISSING_LABEL,
            format!("{} node is missing a label/title.", kind.tag().title()),
        ));
    }
    findings.extend(kind.check_fields());
    findings
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
