//! The plain node-kind discriminant.

use serde::{Deserialize, Serialize};

use crate::NodeError;

/// Discriminant of a node, without its kind-specific record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Start,
    Task,
    Approval,
    Automated,
    End,
}

impl KindTag {
    /// All kinds, in palette order.
    pub const ALL: [KindTag; 5] = [
        KindTag::Start,
        KindTag::Task,
        KindTag::Approval,
        KindTag::Automated,
        KindTag::End,
    ];

    /// Lower-case wire name (`"task"`, `"end"`, …).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start     => "start",
            Self::Task      => "task",
            Self::Approval  => "approval",
            Self::Automated => "automated",
            Self::End       => "end",
        }
    }

    /// Capitalised name used in user-facing messages.
    pub fn title(self) -> &'static str {
        match self {
            Self::Start     => "Start",
            Self::Task      => "Task",
            Self::Approval  => "Approval",
            Self::Automated => "Automated",
            Self::End       => "End",
        }
    }

    /// Label given to a freshly created node of this kind.
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Start     => "Start",
            Self::Task      => "New Task",
            Self::Approval  => "Approval Required",
            Self::Automated => "Automated Step",
            Self::End       => "End",
        }
    }
}

impl std::fmt::Display for KindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KindTag {
    type Err = NodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start"     => Ok(Self::Start),
            "task"      => Ok(Self::Task),
            "approval"  => Ok(Self::Approval),
            "automated" => Ok(Self::Automated),
            "end"       => Ok(Self::End),
            other       => Err(NodeError::UnknownKind(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for tag in KindTag::ALL {
            assert_eq!(tag.as_str().parse::<KindTag>(), Ok(tag));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "gateway".parse::<KindTag>(),
            Err(NodeError::UnknownKind("gateway".into()))
        );
    }
}
