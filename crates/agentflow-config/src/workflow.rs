use serde::{Deserialize, Serialize};

use crate::enums::{ErrorPolicy, LoopTerminationType, WorkflowType};
use crate::step::StepDef;

/// A workflow definition as supplied by the configuration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
  #[serde(default = "default_name")]
  pub name: String,
  /// Free-text description of what the workflow is for.
  #[serde(default)]
  pub goal: String,
  #[serde(default)]
  pub workflow_type: WorkflowType,
  #[serde(default)]
  pub error_policy: ErrorPolicy,
  /// Wall-clock budget for a whole run.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(flatten)]
  pub loop_settings: LoopSettings,
  #[serde(default)]
  pub steps: Vec<StepDef>,
}

fn default_name() -> String {
  "workflow".to_string()
}

/// Loop configuration. Only read when `workflowType` is `loop`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loop_max_iterations: Option<u32>,
  pub loop_termination_condition_type: LoopTerminationType,
  /// Tool name whose invocation ends the loop (`tool` condition).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loop_exit_tool: Option<String>,
  /// Reference checked after every iteration (`state` condition).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loop_state_key: Option<String>,
  /// Value `loopStateKey` must reach. Defaults to `true`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loop_target_value: Option<serde_json::Value>,
}

impl WorkflowDef {
  /// Parse a workflow definition from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_minimal_definition() {
    let def = WorkflowDef::from_json(r#"{ "steps": [{ "agentId": "writer" }] }"#).unwrap();

    assert_eq!(def.name, "workflow");
    assert_eq!(def.workflow_type, WorkflowType::Sequential);
    assert_eq!(def.error_policy, ErrorPolicy::FailFast);
    assert_eq!(def.steps.len(), 1);
    assert_eq!(def.steps[0].agent_id, "writer");
    assert_eq!(def.steps[0].input_mapping, serde_json::Value::Null);
    assert!(def.steps[0].output_key.is_none());
  }

  #[test]
  fn test_parse_loop_definition() {
    let def = WorkflowDef::from_json(
      r#"{
        "name": "refine",
        "goal": "Iterate on a draft until approved",
        "workflowType": "loop",
        "errorPolicy": "continueOnError",
        "timeoutMs": 30000,
        "loopMaxIterations": 4,
        "loopTerminationConditionType": "state",
        "loopStateKey": "$review.result.approved",
        "steps": [
          { "agentId": "drafter", "inputMapping": { "notes": "$review.result.notes" }, "outputKey": "draft" },
          { "agentId": "reviewer", "inputMapping": "$draft.result", "outputKey": "review", "name": "Review" }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(def.workflow_type, WorkflowType::Loop);
    assert_eq!(def.error_policy, ErrorPolicy::ContinueOnError);
    assert_eq!(def.timeout_ms, Some(30000));
    assert_eq!(def.loop_settings.loop_max_iterations, Some(4));
    assert_eq!(
      def.loop_settings.loop_termination_condition_type,
      LoopTerminationType::State
    );
    assert_eq!(
      def.loop_settings.loop_state_key.as_deref(),
      Some("$review.result.approved")
    );
    assert!(def.loop_settings.loop_target_value.is_none());
    assert_eq!(def.steps[1].name.as_deref(), Some("Review"));
    assert_eq!(def.steps[0].input_mapping, json!({ "notes": "$review.result.notes" }));
  }

  #[test]
  fn test_unknown_workflow_type_is_rejected() {
    let result = WorkflowDef::from_json(r#"{ "workflowType": "graph", "steps": [] }"#);
    assert!(result.is_err());
  }

  #[test]
  fn test_serialize_omits_unset_options() {
    let def = WorkflowDef::from_json(r#"{ "steps": [] }"#).unwrap();
    let value = serde_json::to_value(&def).unwrap();

    assert!(value.get("timeoutMs").is_none());
    assert!(value.get("loopMaxIterations").is_none());
    assert_eq!(value["loopTerminationConditionType"], "none");
    assert_eq!(value["workflowType"], "sequential");
  }
}
