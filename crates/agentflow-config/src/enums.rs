use serde::{Deserialize, Serialize};

/// How the steps of a workflow are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
  #[default]
  Sequential,
  Parallel,
  Loop,
}

/// What happens to the rest of a run when a step invocation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
  /// Abort the run on the first failed invocation.
  #[default]
  FailFast,
  /// Record the failure and keep executing the remaining steps.
  ContinueOnError,
}

/// Extra condition that can end a loop workflow before `loopMaxIterations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopTerminationType {
  #[default]
  None,
  /// A step invoked the designated exit tool.
  Tool,
  /// A state reference reached the target value.
  State,
}
