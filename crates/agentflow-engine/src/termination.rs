//! Early-exit checks for loop workflows.

use agentflow_workflow::ValuePath;
use serde_json::Value;

use crate::resolve::resolve_path;
use crate::state::ExecutionState;

/// Whether an agent result shows a call to `tool`.
///
/// The result must be an object with a `toolCalls` array whose entries are
/// either tool names or objects with a `name` field.
pub(crate) fn calls_tool(result: &Value, tool: &str) -> bool {
  let Some(calls) = result.get("toolCalls").and_then(Value::as_array) else {
    return false;
  };
  calls.iter().any(|call| match call {
    Value::String(name) => name == tool,
    Value::Object(map) => map.get("name").and_then(Value::as_str) == Some(tool),
    _ => false,
  })
}

/// Whether `key` currently resolves to `target`.
pub(crate) fn state_reached(key: &ValuePath, target: &Value, state: &ExecutionState) -> bool {
  resolve_path(key, state).is_ok_and(|value| &value == target)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::StepResult;
  use serde_json::json;

  #[test]
  fn test_calls_tool_by_name_or_object() {
    assert!(calls_tool(&json!({ "toolCalls": ["search", "finish"] }), "finish"));
    assert!(calls_tool(
      &json!({ "toolCalls": [{ "name": "finish", "arguments": {} }] }),
      "finish"
    ));
    assert!(!calls_tool(&json!({ "toolCalls": ["search"] }), "finish"));
    assert!(!calls_tool(&json!({ "toolCalls": "finish" }), "finish"));
    assert!(!calls_tool(&json!("finish"), "finish"));
  }

  #[test]
  fn test_state_reached() {
    let key = ValuePath::parse("$review.result.approved").unwrap();
    let mut state = ExecutionState::new();
    assert!(!state_reached(&key, &json!(true), &state));

    state.insert("review", StepResult::new(json!({ "approved": false }), Value::Null));
    assert!(!state_reached(&key, &json!(true), &state));

    state.insert("review", StepResult::new(json!({ "approved": true }), Value::Null));
    assert!(state_reached(&key, &json!(true), &state));
  }
}
