//! Execution state threaded between steps.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Result of a single step execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
  /// Payload returned by the agent.
  pub result: Value,
  /// Input after reference resolution, as passed to the agent.
  pub received_input: Value,
  pub timestamp: DateTime<Utc>,
}

impl StepResult {
  pub fn new(result: Value, received_input: Value) -> Self {
    Self {
      result,
      received_input,
      timestamp: Utc::now(),
    }
  }

  /// The timestamp as seen by references (`$key.timestamp`).
  pub fn timestamp_value(&self) -> Value {
    Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
  }

  /// The whole entry as a JSON object, as seen by a root-only reference (`$key`).
  pub fn to_value(&self) -> Value {
    json!({
      "result": self.result,
      "receivedInput": self.received_input,
      "timestamp": self.timestamp_value(),
    })
  }
}

/// Step results keyed by output key, in insertion order.
///
/// Re-inserting an existing key (loop iterations) replaces the entry in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionState(IndexMap<String, StepResult>);

impl ExecutionState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&StepResult> {
    self.0.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  /// Store a step result, returning the entry it replaced.
  pub fn insert(&mut self, key: impl Into<String>, result: StepResult) -> Option<StepResult> {
    self.0.insert(key.into(), result)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StepResult)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl Extend<(String, StepResult)> for ExecutionState {
  fn extend<T: IntoIterator<Item = (String, StepResult)>>(&mut self, iter: T) {
    self.0.extend(iter);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_insert_keeps_original_position() {
    let mut state = ExecutionState::new();
    state.insert("a", StepResult::new(json!(1), Value::Null));
    state.insert("b", StepResult::new(json!(2), Value::Null));

    let replaced = state.insert("a", StepResult::new(json!(3), Value::Null));

    assert_eq!(replaced.map(|r| r.result), Some(json!(1)));
    assert_eq!(state.keys().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(state.get("a").unwrap().result, json!(3));
  }

  #[test]
  fn test_serializes_as_object_of_entries() {
    let mut state = ExecutionState::new();
    state.insert("inv", StepResult::new(json!({ "available": true }), json!({ "item": "sku1" })));

    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["inv"]["result"]["available"], json!(true));
    assert_eq!(value["inv"]["receivedInput"]["item"], json!("sku1"));
    assert!(value["inv"]["timestamp"].is_string());
  }

  #[test]
  fn test_entry_view_has_three_fields() {
    let entry = StepResult::new(json!("ok"), json!({ "x": 1 }));
    let view = entry.to_value();

    assert_eq!(view["result"], json!("ok"));
    assert_eq!(view["receivedInput"], json!({ "x": 1 }));
    assert!(view["timestamp"].as_str().unwrap().ends_with('Z'));
  }
}
