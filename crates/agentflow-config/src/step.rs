use serde::{Deserialize, Serialize};

use crate::input::InputMappingDef;

/// One step of a workflow definition, delegating to an external sub-agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
  #[serde(default)]
  pub agent_id: String,
  #[serde(default)]
  pub input_mapping: InputMappingDef,
  /// State key the step's result is stored under. `{iteration}` is replaced
  /// with the loop iteration index in loop workflows.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output_key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}
