use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing a flow document from JSON.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("failed to parse flow document JSON: {0}")]
    Json(String),
}

/// The graph element a validation issue points at. The editor uses this to
/// highlight the offending node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ElementRef {
    Document,
    Node(String),
    Edge(String),
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Document => write!(f, "document"),
            ElementRef::Node(id) => write!(f, "node '{}'", id),
            ElementRef::Edge(id) => write!(f, "edge '{}'", id),
        }
    }
}

/// Machine-readable problem codes for structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnknownSourceNode,
    UnknownTargetNode,
    UnknownStartNode,
    InvalidBranchLabel,
    DuplicateBranch,
    DuplicateCase,
    DuplicateDefault,
    AmbiguousTransition,
    UnterminatedCycle,
    InvalidConfig,
    UnknownMergeNode,
    OrphanNode,
    EmptyParallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single structural problem found in a flow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FlowIssue {
    pub element: ElementRef,
    pub code: IssueCode,
    pub message: String,
    pub severity: Severity,
}

impl FlowIssue {
    pub fn error(element: ElementRef, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            element,
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(element: ElementRef, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            element,
            code,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for FlowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}: {}", tag, self.element, self.message)
    }
}

/// The full list of structural errors a flow document failed validation with.
///
/// Callers (the graph editor) need every offending element at once, so this
/// is always a list, never a halt-on-first-error.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("flow document failed validation with {} issue(s)", .issues.len())]
pub struct ValidationReport {
    pub issues: Vec<FlowIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<FlowIssue>) -> Self {
        Self { issues }
    }

    /// Issues of `Error` severity. Warnings alone never produce a report.
    pub fn errors(&self) -> impl Iterator<Item = &FlowIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }
}

/// Errors that can occur during a single evaluation step.
///
/// These are fatal for the step: the interpreter reports them to the runtime
/// instead of guessing, and never silently drops the lead on a dead end.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("node '{node_id}' not found in the compiled flow")]
    NodeNotFound { node_id: String },

    #[error("condition node '{node_id}' has no outgoing edge for its '{branch}' branch")]
    MissingBranch { node_id: String, branch: bool },

    #[error("switch node '{node_id}' matched no case for value '{value}' and has no default edge")]
    NoMatchingCase { node_id: String, value: String },

    #[error("flow did not pause within {limit} steps")]
    StepLimitExceeded { limit: usize },
}

/// Errors that can occur when persisting or loading a compiled flow artifact.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("serialization failed: {0}")]
    Encode(String),

    #[error("deserialization failed: {0}")]
    Decode(String),

    #[error("could not access artifact file '{path}': {message}")]
    Io { path: String, message: String },
}
