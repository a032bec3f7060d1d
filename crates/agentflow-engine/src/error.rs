//! Engine error types.

/// Boxed cause of an invocation failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An agent invocation failed.
///
/// Raised by [`AgentInvoker`](crate::AgentInvoker) implementations for network
/// errors, agent-side failures, or per-call timeouts.
#[derive(Debug, thiserror::Error)]
#[error("agent '{agent_id}' failed: {source}")]
pub struct InvocationError {
  pub agent_id: String,
  #[source]
  pub source: BoxError,
}

impl InvocationError {
  pub fn new(agent_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self {
      agent_id: agent_id.into(),
      source: source.into(),
    }
  }
}

/// Errors that can occur while executing a workflow.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// A step's agent invocation failed.
  #[error("{step} failed: {source}")]
  StepInvocation {
    index: usize,
    /// Step label, see [`Step::label`](agentflow_workflow::Step::label).
    step: String,
    #[source]
    source: InvocationError,
  },

  /// A spawned step task panicked or was aborted.
  #[error("{step} did not finish: {message}")]
  StepJoin {
    index: usize,
    step: String,
    message: String,
  },

  /// Execution was cancelled.
  #[error("execution cancelled")]
  Cancelled,

  /// The run's wall-clock budget was exhausted.
  #[error("execution exceeded its time budget of {budget_ms}ms")]
  TimedOut { budget_ms: u64 },
}
