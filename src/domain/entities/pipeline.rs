use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, ErrorKind};

/// Per-query lifecycle. Transitions only move forward; `Errored` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Classified,
    Retrieved,
    Responded,
    Done,
    Errored,
}

impl PipelineState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Classified),
            Self::Classified => Some(Self::Retrieved),
            Self::Retrieved => Some(Self::Responded),
            Self::Responded => Some(Self::Done),
            Self::Done | Self::Errored => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            Self::Errored => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    /// The stage that runs while the pipeline sits in this state.
    pub fn pending_stage(self) -> Option<Stage> {
        match self {
            Self::Received => Some(Stage::Classification),
            Self::Classified => Some(Stage::Retrieval),
            Self::Retrieved => Some(Stage::Response),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Retrieved => "retrieved",
            Self::Responded => "responded",
            Self::Done => "done",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Classification,
    Retrieval,
    Response,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Intake => "intake",
            Self::Classification => "classification",
            Self::Retrieval => "retrieval",
            Self::Response => "response",
        };
        f.write_str(name)
    }
}

/// A non-fatal condition absorbed by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: Stage, error: &DomainError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
