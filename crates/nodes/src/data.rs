//! Node data records.
//!
//! A node's `data` object on the wire holds the shared [`BaseData`] fields
//! side by side with the fields of its kind. The two halves are decoded from
//! the same JSON object; unknown keys are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{KindTag, NodeError};

// ---------------------------------------------------------------------------
// Shared fields
// ---------------------------------------------------------------------------

/// Fields every node kind carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseData {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set while the simulation runner has this node highlighted.
    #[serde(default)]
    pub is_executing: bool,
    /// Set once the simulation has moved past this node.
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
}

impl BaseData {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Clear the transient simulation flags.
    pub fn clear_simulation_flags(&mut self) {
        self.is_executing = false;
        self.is_completed = false;
    }
}

// ---------------------------------------------------------------------------
// Enumerated field values
// ---------------------------------------------------------------------------

/// How a workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Scheduled,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// How many approvers must sign off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    Any,
    All,
    Majority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Kind-specific records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalData {
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_type: Option<ApprovalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub notify_on_complete: bool,
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Kind of a node together with its kind-specific record.
///
/// Serializes as the bare record (no tag); the tag lives next to it as the
/// node's `kind` field, so decoding goes through [`NodeKind::decode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeKind {
    Start(StartData),
    Task(TaskData),
    Approval(ApprovalData),
    Automated(AutomatedData),
    End(EndData),
}

impl NodeKind {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Start(_)     => KindTag::Start,
            Self::Task(_)      => KindTag::Task,
            Self::Approval(_)  => KindTag::Approval,
            Self::Automated(_) => KindTag::Automated,
            Self::End(_)       => KindTag::End,
        }
    }

    /// An empty record of the given kind.
    pub fn empty(tag: KindTag) -> Self {
        match tag {
            KindTag::Start     => Self::Start(StartData::default()),
            KindTag::Task      => Self::Task(TaskData::default()),
            KindTag::Approval  => Self::Approval(ApprovalData::default()),
            KindTag::Automated => Self::Automated(AutomatedData::default()),
            KindTag::End       => Self::End(EndData::default()),
        }
    }

    /// Decode the kind-specific half of a node's `data` object.
    ///
    /// A `null` record decodes to the empty record of that kind.
    ///
    /// # Errors
    /// [`NodeError::InvalidData`] if a known field has the wrong shape.
    pub fn decode(tag: KindTag, data: &Value) -> Result<Self, NodeError> {
        if data.is_null() {
            return Ok(Self::empty(tag));
        }

        let invalid = |e: serde_json::Error| NodeError::InvalidData {
            kind: tag.to_string(),
            message: e.to_string(),
        };

        Ok(match tag {
            KindTag::Start     => Self::Start(StartData::deserialize(data).map_err(invalid)?),
            KindTag::Task      => Self::Task(TaskData::deserialize(data).map_err(invalid)?),
            KindTag::Approval  => Self::Approval(ApprovalData::deserialize(data).map_err(invalid)?),
            KindTag::Automated => {
                Self::Automated(AutomatedData::deserialize(data).map_err(invalid)?)
            }
            KindTag::End       => Self::End(EndData::deserialize(data).map_err(invalid)?),
        })
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start(_))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End(_))
    }
}
