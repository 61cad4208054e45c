//! `nodes` crate — the node kinds of a workflow and their field checks.
//!
//! Every node carries one [`NodeKind`] variant holding its kind-specific
//! record. The engine crate dispatches per-kind validation through the
//! [`FieldCheck`] trait and never inspects kind fields directly.

pub mod checks;
pub mod data;
pub mod error;
pub mod kind;

pub use checks::{check_node, FieldCheck, Finding, Severity};
pub use data::{
    ApprovalData, ApprovalType, AutomatedData, BaseData, EndData, NodeKind, Outcome, Priority,
    StartData, TaskData, Trigger,
};
pub use error::NodeError;
pub use kind::KindTag;
