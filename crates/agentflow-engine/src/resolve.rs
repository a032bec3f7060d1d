//! Reference resolution.
//!
//! Resolves locked input mappings against the current [`ExecutionState`].
//! A reference that cannot be followed resolves to `null`; resolution never
//! fails a step.
//!
//! Inside a state entry the first field selects one of `result`,
//! `receivedInput` or `timestamp`. Further fields walk object keys, or array
//! indices when the segment is a decimal number.

use agentflow_workflow::{InputMapping, ValuePath};
use serde_json::{Map, Value};
use tracing::warn;

use crate::state::{ExecutionState, StepResult};

/// A reference that did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
  /// The full reference, e.g. `$inv.result.available`.
  pub reference: String,
  /// The segment at which the walk stopped.
  pub missing: String,
}

/// Resolve a single reference against the state.
pub fn resolve_path(path: &ValuePath, state: &ExecutionState) -> Result<Value, Unresolved> {
  let unresolved = |missing: &str| Unresolved {
    reference: path.to_string(),
    missing: missing.to_string(),
  };

  let entry = state
    .get(path.root())
    .ok_or_else(|| unresolved(path.root()))?;

  let Some((first, rest)) = path.fields().split_first() else {
    return Ok(entry.to_value());
  };

  let start = entry_field(entry, first).ok_or_else(|| unresolved(first.as_str()))?;

  let mut current = &start;
  for field in rest {
    current = child(current, field).ok_or_else(|| unresolved(field.as_str()))?;
  }
  Ok(current.clone())
}

/// Resolve a whole input mapping, collecting every reference that did not resolve.
///
/// Unresolved references become `null`; map keys are always kept.
pub fn resolve_mapping(
  mapping: &InputMapping,
  state: &ExecutionState,
  unresolved: &mut Vec<Unresolved>,
) -> Value {
  match mapping {
    InputMapping::Literal(value) => value.clone(),
    InputMapping::Reference(path) => match resolve_path(path, state) {
      Ok(value) => value,
      Err(miss) => {
        warn!(
          reference = %miss.reference,
          missing = %miss.missing,
          "unresolved reference, passing null"
        );
        unresolved.push(miss);
        Value::Null
      }
    },
    InputMapping::Sequence(items) => Value::Array(
      items
        .iter()
        .map(|item| resolve_mapping(item, state, unresolved))
        .collect(),
    ),
    InputMapping::Map(entries) => {
      let mut map = Map::with_capacity(entries.len());
      for (key, value) in entries {
        map.insert(key.clone(), resolve_mapping(value, state, unresolved));
      }
      Value::Object(map)
    }
  }
}

fn entry_field(entry: &StepResult, field: &str) -> Option<Value> {
  match field {
    "result" => Some(entry.result.clone()),
    "receivedInput" => Some(entry.received_input.clone()),
    "timestamp" => Some(entry.timestamp_value()),
    _ => None,
  }
}

fn child<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
  match value {
    Value::Object(map) => map.get(field),
    Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn state_with(key: &str, result: Value) -> ExecutionState {
    let mut state = ExecutionState::new();
    state.insert(key, StepResult::new(result, json!({ "q": "in" })));
    state
  }

  fn path(s: &str) -> ValuePath {
    ValuePath::parse(s).unwrap()
  }

  fn mapping(value: Value) -> InputMapping {
    InputMapping::parse(&value).unwrap()
  }

  #[test]
  fn test_literals_pass_through() {
    let state = state_with("stepA", json!({ "text": "hi" }));
    for literal in [json!(42), json!("plain"), json!(true), json!(null), json!(1.5)] {
      let mut misses = Vec::new();
      let resolved = resolve_mapping(&mapping(literal.clone()), &state, &mut misses);
      assert_eq!(resolved, literal);
      assert!(misses.is_empty());
    }
  }

  #[test]
  fn test_resolve_nested_field() {
    let state = state_with("stepA", json!({ "text": "hi" }));
    assert_eq!(
      resolve_path(&path("$stepA.result.text"), &state),
      Ok(json!("hi"))
    );
    assert_eq!(
      resolve_path(&path("$stepA.receivedInput.q"), &state),
      Ok(json!("in"))
    );
  }

  #[test]
  fn test_missing_root_is_one_unresolved() {
    let state = ExecutionState::new();
    let mut misses = Vec::new();

    let resolved = resolve_mapping(&mapping(json!("$missing.field")), &state, &mut misses);

    assert_eq!(resolved, Value::Null);
    assert_eq!(
      misses,
      vec![Unresolved {
        reference: "$missing.field".to_string(),
        missing: "missing".to_string(),
      }]
    );
  }

  #[test]
  fn test_resolve_structured_mapping() {
    let state = state_with("stepA", json!({ "text": "hi" }));
    let mut misses = Vec::new();

    let resolved = resolve_mapping(
      &mapping(json!({
        "a": "$stepA.result.text",
        "b": [1, "$stepA.result.text"],
        "c": 42
      })),
      &state,
      &mut misses,
    );

    assert_eq!(resolved, json!({ "a": "hi", "b": [1, "hi"], "c": 42 }));
    assert!(misses.is_empty());
  }

  #[test]
  fn test_unresolved_values_keep_their_keys() {
    let state = state_with("stepA", json!({ "text": "hi" }));
    let mut misses = Vec::new();

    let resolved = resolve_mapping(
      &mapping(json!({ "later": "$stepB.result", "deep": "$stepA.result.text.len" })),
      &state,
      &mut misses,
    );

    assert_eq!(resolved, json!({ "later": null, "deep": null }));
    assert_eq!(misses.len(), 2);
    assert_eq!(misses[1].missing, "len");
  }

  #[test]
  fn test_array_index_segments() {
    let state = state_with("list", json!({ "items": ["a", "b"] }));

    assert_eq!(resolve_path(&path("$list.result.items.1"), &state), Ok(json!("b")));
    assert!(resolve_path(&path("$list.result.items.2"), &state).is_err());
    assert!(resolve_path(&path("$list.result.items.first"), &state).is_err());
  }

  #[test]
  fn test_unknown_entry_field() {
    let state = state_with("stepA", json!("x"));
    let miss = resolve_path(&path("$stepA.output"), &state).unwrap_err();
    assert_eq!(miss.missing, "output");
  }

  #[test]
  fn test_root_only_reference_yields_entry_view() {
    let state = state_with("stepA", json!("x"));
    let entry = resolve_path(&path("$stepA"), &state).unwrap();

    assert_eq!(entry["result"], json!("x"));
    assert_eq!(entry["receivedInput"], json!({ "q": "in" }));
    assert!(entry["timestamp"].is_string());
  }
}
