use agentflow_config::{
  ErrorPolicy, LoopSettings, LoopTerminationType, StepDef, WorkflowDef, WorkflowType,
};
use serde_json::Value;

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::mapping::InputMapping;
use crate::path::ValuePath;
use crate::step::Step;

/// Iteration bound used when a loop workflow does not set `loopMaxIterations`.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// A locked workflow ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  pub name: String,
  pub goal: String,
  pub workflow_type: WorkflowType,
  pub error_policy: ErrorPolicy,
  pub timeout_ms: Option<u64>,
  /// Present only for loop workflows.
  pub loop_policy: Option<LoopPolicy>,
  pub steps: Vec<Step>,
}

/// When a loop workflow stops repeating its body.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopPolicy {
  pub max_iterations: u32,
  pub termination: LoopTermination,
}

/// Early-exit condition of a loop, in addition to the iteration bound.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopTermination {
  None,
  /// Stop as soon as a step's result shows a call to this tool.
  ExitTool(String),
  /// Stop after an iteration in which `key` resolves to `target`.
  StateValue { key: ValuePath, target: Value },
}

impl Default for LoopPolicy {
  fn default() -> Self {
    Self {
      max_iterations: DEFAULT_MAX_ITERATIONS,
      termination: LoopTermination::None,
    }
  }
}

impl Workflow {
  /// Build the dependency graph between steps.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.steps)
  }

  /// Get a step by index.
  pub fn get_step(&self, index: usize) -> Option<&Step> {
    self.steps.get(index)
  }

  /// The batches the runner executes, in order.
  ///
  /// Parallel workflows run one batch per dependency layer; every other
  /// workflow type runs its steps one at a time.
  pub fn execution_groups(&self) -> Vec<Vec<&Step>> {
    match self.workflow_type {
      WorkflowType::Parallel => self
        .graph()
        .layers()
        .into_iter()
        .map(|layer| layer.into_iter().map(|idx| &self.steps[idx]).collect())
        .collect(),
      WorkflowType::Sequential | WorkflowType::Loop => {
        self.steps.iter().map(|step| vec![step]).collect()
      }
    }
  }
}

impl TryFrom<WorkflowDef> for Workflow {
  type Error = WorkflowError;

  fn try_from(def: WorkflowDef) -> Result<Self, Self::Error> {
    let steps = def
      .steps
      .into_iter()
      .enumerate()
      .map(|(index, step)| lock_step(index, step))
      .collect::<Result<Vec<_>, _>>()?;

    let loop_policy = match def.workflow_type {
      WorkflowType::Loop => Some(lock_loop(&def.loop_settings)?),
      WorkflowType::Sequential | WorkflowType::Parallel => None,
    };

    Ok(Self {
      name: def.name,
      goal: def.goal,
      workflow_type: def.workflow_type,
      error_policy: def.error_policy,
      timeout_ms: def.timeout_ms,
      loop_policy,
      steps,
    })
  }
}

fn lock_step(index: usize, def: StepDef) -> Result<Step, WorkflowError> {
  if def.agent_id.trim().is_empty() {
    return Err(WorkflowError::MissingAgentId { index });
  }
  if def.output_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
    return Err(WorkflowError::EmptyOutputKey { index });
  }

  let input = InputMapping::parse(&def.input_mapping)
    .map_err(|source| WorkflowError::InvalidReference { index, source })?;

  Ok(Step {
    index,
    agent_id: def.agent_id,
    input,
    output_key: def.output_key,
    name: def.name,
    description: def.description,
  })
}

fn lock_loop(settings: &LoopSettings) -> Result<LoopPolicy, WorkflowError> {
  let invalid = |message: String| WorkflowError::InvalidLoop { message };

  let max_iterations = settings
    .loop_max_iterations
    .unwrap_or(DEFAULT_MAX_ITERATIONS);
  if max_iterations == 0 {
    return Err(invalid("loopMaxIterations must be at least 1".to_string()));
  }

  let termination = match settings.loop_termination_condition_type {
    LoopTerminationType::None => LoopTermination::None,
    LoopTerminationType::Tool => {
      let tool = settings
        .loop_exit_tool
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("tool termination requires loopExitTool".to_string()))?;
      LoopTermination::ExitTool(tool.to_string())
    }
    LoopTerminationType::State => {
      let raw = settings
        .loop_state_key
        .as_deref()
        .ok_or_else(|| invalid("state termination requires loopStateKey".to_string()))?;
      let key = ValuePath::parse(raw).map_err(|e| invalid(format!("loopStateKey {}", e)))?;
      let target = settings
        .loop_target_value
        .clone()
        .unwrap_or(Value::Bool(true));
      LoopTermination::StateValue { key, target }
    }
  };

  Ok(LoopPolicy {
    max_iterations,
    termination,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn def(value: serde_json::Value) -> WorkflowDef {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_lock_sequential_workflow() {
    let workflow = Workflow::try_from(def(json!({
      "goal": "order",
      "steps": [
        { "agentId": "inventory", "inputMapping": { "item": "sku1" }, "outputKey": "inv" },
        { "agentId": "pay", "inputMapping": { "amount": 100, "check": "$inv.result.available" }, "outputKey": "pay" }
      ]
    })))
    .unwrap();

    assert_eq!(workflow.goal, "order");
    assert!(workflow.loop_policy.is_none());
    assert_eq!(workflow.steps[1].index, 1);
    assert_eq!(workflow.steps[1].input.references().len(), 1);
    assert_eq!(workflow.execution_groups().len(), 2);
  }

  #[test]
  fn test_missing_agent_id_is_rejected() {
    let err = Workflow::try_from(def(json!({
      "steps": [{ "agentId": "a" }, { "agentId": "  " }]
    })))
    .unwrap_err();

    assert!(matches!(err, WorkflowError::MissingAgentId { index: 1 }));
  }

  #[test]
  fn test_empty_output_key_is_rejected() {
    let err = Workflow::try_from(def(json!({
      "steps": [{ "agentId": "a", "outputKey": "" }]
    })))
    .unwrap_err();

    assert!(matches!(err, WorkflowError::EmptyOutputKey { index: 0 }));
  }

  #[test]
  fn test_invalid_reference_names_the_step() {
    let err = Workflow::try_from(def(json!({
      "steps": [{ "agentId": "a", "inputMapping": { "x": "$a..b" } }]
    })))
    .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidReference { index: 0, .. }));
  }

  #[test]
  fn test_loop_defaults() {
    let workflow = Workflow::try_from(def(json!({
      "workflowType": "loop",
      "steps": [{ "agentId": "a" }]
    })))
    .unwrap();

    assert_eq!(workflow.loop_policy, Some(LoopPolicy::default()));
  }

  #[test]
  fn test_loop_state_condition_defaults_target_to_true() {
    let workflow = Workflow::try_from(def(json!({
      "workflowType": "loop",
      "loopMaxIterations": 3,
      "loopTerminationConditionType": "state",
      "loopStateKey": "$review.result.approved",
      "steps": [{ "agentId": "a" }]
    })))
    .unwrap();

    let policy = workflow.loop_policy.unwrap();
    assert_eq!(policy.max_iterations, 3);
    match policy.termination {
      LoopTermination::StateValue { key, target } => {
        assert_eq!(key.to_string(), "$review.result.approved");
        assert_eq!(target, json!(true));
      }
      other => panic!("unexpected termination: {:?}", other),
    }
  }

  #[test]
  fn test_loop_settings_are_validated() {
    let zero = def(json!({ "workflowType": "loop", "loopMaxIterations": 0, "steps": [] }));
    assert!(matches!(
      Workflow::try_from(zero),
      Err(WorkflowError::InvalidLoop { .. })
    ));

    let no_tool = def(json!({
      "workflowType": "loop",
      "loopTerminationConditionType": "tool",
      "steps": []
    }));
    assert!(matches!(
      Workflow::try_from(no_tool),
      Err(WorkflowError::InvalidLoop { .. })
    ));

    let bad_key = def(json!({
      "workflowType": "loop",
      "loopTerminationConditionType": "state",
      "loopStateKey": "review.result",
      "steps": []
    }));
    assert!(matches!(
      Workflow::try_from(bad_key),
      Err(WorkflowError::InvalidLoop { .. })
    ));
  }

  #[test]
  fn test_loop_settings_ignored_outside_loops() {
    let workflow = Workflow::try_from(def(json!({
      "workflowType": "parallel",
      "loopMaxIterations": 0,
      "steps": []
    })))
    .unwrap();

    assert!(workflow.loop_policy.is_none());
    assert!(workflow.execution_groups().is_empty());
  }
}
