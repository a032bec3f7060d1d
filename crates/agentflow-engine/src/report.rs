//! The outcome of a workflow run, as returned to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::ExecutionState;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
  Success,
  CompletedNoSteps,
  PartialFailure,
  Failed,
}

impl ReportStatus {
  /// Whether the run should be treated as successful by callers.
  pub fn is_success(self) -> bool {
    matches!(self, ReportStatus::Success | ReportStatus::CompletedNoSteps)
  }
}

impl fmt::Display for ReportStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ReportStatus::Success => "SUCCESS",
      ReportStatus::CompletedNoSteps => "COMPLETED_NO_STEPS",
      ReportStatus::PartialFailure => "PARTIAL_FAILURE",
      ReportStatus::Failed => "FAILED",
    };
    f.write_str(s)
  }
}

/// Why a `FAILED` run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
  Invocation,
  Cancelled,
  TimedOut,
}

/// Why a loop workflow stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopExit {
  MaxIterations,
  ExitTool,
  StateCondition,
}

/// A non-fatal problem noticed during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  tag = "kind",
  rename_all = "SCREAMING_SNAKE_CASE",
  rename_all_fields = "camelCase"
)]
pub enum Diagnostic {
  /// A reference in the step's input did not resolve and was passed as null.
  UnresolvedReference {
    step: usize,
    reference: String,
    missing: String,
  },
  /// A step succeeded but has no output key, so later steps cannot see its result.
  MissingOutputKey { step: usize, agent_id: String },
  /// A step's agent invocation failed.
  StepFailed {
    step: usize,
    agent_id: String,
    message: String,
  },
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Diagnostic::UnresolvedReference {
        step,
        reference,
        missing,
      } => write!(
        f,
        "step {}: reference {} did not resolve (missing '{}')",
        step, reference, missing
      ),
      Diagnostic::MissingOutputKey { step, agent_id } => write!(
        f,
        "step {} ({}): no output key, result is not visible to later steps",
        step, agent_id
      ),
      Diagnostic::StepFailed {
        step,
        agent_id,
        message,
      } => write!(f, "step {} ({}) failed: {}", step, agent_id, message),
    }
  }
}

/// The result of [`WorkflowRunner::run`](crate::WorkflowRunner::run).
///
/// Carries no run id or duration, so repeated runs of one definition against
/// the same agents differ only in step timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionReport {
  pub status: ReportStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failure: Option<FailureKind>,
  pub message: String,
  pub state: ExecutionState,
  #[serde(default)]
  pub diagnostics: Vec<Diagnostic>,
  #[serde(default)]
  pub steps_succeeded: usize,
  #[serde(default)]
  pub steps_failed: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iterations: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub loop_termination: Option<LoopExit>,
}
