//! Single step execution.

use std::sync::Arc;

use agentflow_workflow::Step;
use tracing::{error, info, instrument};

use crate::error::EngineError;
use crate::invoker::AgentInvoker;
use crate::report::Diagnostic;
use crate::resolve::resolve_mapping;
use crate::state::{ExecutionState, StepResult};

/// What came out of executing one step.
#[derive(Debug)]
pub struct StepOutcome {
  /// Warnings raised while resolving the step's input.
  pub diagnostics: Vec<Diagnostic>,
  pub result: Result<StepResult, EngineError>,
}

/// Resolves a step's input and invokes its agent.
///
/// Never touches the execution state; storing results is the runner's job.
#[derive(Clone)]
pub struct StepExecutor {
  invoker: Arc<dyn AgentInvoker>,
}

impl StepExecutor {
  pub fn new(invoker: Arc<dyn AgentInvoker>) -> Self {
    Self { invoker }
  }

  #[instrument(
    name = "step_execute",
    skip(self, step, state, execution_id),
    fields(
      execution_id = %execution_id,
      step = step.index,
      agent_id = %step.agent_id,
    )
  )]
  pub async fn execute(
    &self,
    step: &Step,
    state: &ExecutionState,
    execution_id: &str,
  ) -> StepOutcome {
    let mut unresolved = Vec::new();
    let input = resolve_mapping(&step.input, state, &mut unresolved);

    let diagnostics = unresolved
      .into_iter()
      .map(|miss| Diagnostic::UnresolvedReference {
        step: step.index,
        reference: miss.reference,
        missing: miss.missing,
      })
      .collect();

    info!(resolved_input = %input, "step started");

    let result = match self.invoker.invoke(&step.agent_id, input.clone()).await {
      Ok(output) => {
        info!(output = %output, "step completed");
        Ok(StepResult::new(output, input))
      }
      Err(e) => {
        error!(error = %e, "step failed");
        Err(EngineError::StepInvocation {
          index: step.index,
          step: step.label(),
          source: e,
        })
      }
    };

    StepOutcome {
      diagnostics,
      result,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::invoker::StaticInvoker;
  use agentflow_workflow::InputMapping;
  use serde_json::{Value, json};

  fn step(agent_id: &str, input: Value) -> Step {
    Step {
      index: 1,
      agent_id: agent_id.to_string(),
      input: InputMapping::parse(&input).unwrap(),
      output_key: Some("out".to_string()),
      name: None,
      description: None,
    }
  }

  #[tokio::test]
  async fn test_execute_records_received_input() {
    let executor = StepExecutor::new(Arc::new(
      StaticInvoker::new().with_response("pay", json!({ "confirmed": true })),
    ));
    let mut state = ExecutionState::new();
    state.insert("inv", StepResult::new(json!({ "available": true }), Value::Null));

    let outcome = executor
      .execute(
        &step("pay", json!({ "amount": 100, "check": "$inv.result.available" })),
        &state,
        "exec-1",
      )
      .await;

    let result = outcome.result.unwrap();
    assert_eq!(result.result, json!({ "confirmed": true }));
    assert_eq!(result.received_input, json!({ "amount": 100, "check": true }));
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(state.len(), 1);
  }

  #[tokio::test]
  async fn test_execute_reports_unresolved_and_failure() {
    let executor = StepExecutor::new(Arc::new(StaticInvoker::new()));

    let outcome = executor
      .execute(&step("ghost", json!("$nothing.result")), &ExecutionState::new(), "exec-1")
      .await;

    assert_eq!(
      outcome.diagnostics,
      vec![Diagnostic::UnresolvedReference {
        step: 1,
        reference: "$nothing.result".to_string(),
        missing: "nothing".to_string(),
      }]
    );
    match outcome.result {
      Err(EngineError::StepInvocation { index, source, .. }) => {
        assert_eq!(index, 1);
        assert_eq!(source.agent_id, "ghost");
      }
      other => panic!("expected invocation error, got {:?}", other),
    }
  }
}
