//! Parsed input mappings.
//!
//! A step's input mapping is parsed once, when the workflow is locked. Each
//! string is classified as either a literal or a reference so resolution never
//! has to look at string contents again.
//!
//! | Definition value        | Parsed as                          |
//! |-------------------------|------------------------------------|
//! | `"$inv.result.ok"`      | `Reference($inv.result.ok)`        |
//! | `"$$5"`                 | `Literal("$5")`                    |
//! | `"sku1"`, `42`, `null`  | `Literal(..)`                      |
//! | `[..]`                  | `Sequence(..)`                     |
//! | `{..}`                  | `Map(..)` (keys are never parsed)  |
//! | `"$"`, `"$a..b"`        | error                              |
//!
//! A malformed reference fails the lock with `WorkflowError::InvalidReference`
//! instead of resolving to null at run time.

use serde_json::Value;

use crate::path::{REFERENCE_SIGIL, ValuePath, ValuePathError};

#[derive(Debug, Clone, PartialEq)]
pub enum InputMapping {
  Literal(Value),
  Reference(ValuePath),
  Sequence(Vec<InputMapping>),
  Map(Vec<(String, InputMapping)>),
}

impl InputMapping {
  /// Parse a raw definition value.
  pub fn parse(value: &Value) -> Result<Self, ValuePathError> {
    match value {
      Value::String(s) => Self::parse_str(s),
      Value::Array(items) => items
        .iter()
        .map(Self::parse)
        .collect::<Result<Vec<_>, _>>()
        .map(InputMapping::Sequence),
      Value::Object(map) => map
        .iter()
        .map(|(k, v)| Self::parse(v).map(|m| (k.clone(), m)))
        .collect::<Result<Vec<_>, _>>()
        .map(InputMapping::Map),
      other => Ok(InputMapping::Literal(other.clone())),
    }
  }

  fn parse_str(s: &str) -> Result<Self, ValuePathError> {
    match s.strip_prefix(REFERENCE_SIGIL) {
      None => Ok(InputMapping::Literal(Value::String(s.to_string()))),
      Some(rest) if rest.starts_with(REFERENCE_SIGIL) => {
        Ok(InputMapping::Literal(Value::String(rest.to_string())))
      }
      Some(_) => ValuePath::parse(s).map(InputMapping::Reference),
    }
  }

  /// All references in this mapping, depth first in declaration order.
  pub fn references(&self) -> Vec<&ValuePath> {
    let mut out = Vec::new();
    self.collect_references(&mut out);
    out
  }

  fn collect_references<'a>(&'a self, out: &mut Vec<&'a ValuePath>) {
    match self {
      InputMapping::Literal(_) => {}
      InputMapping::Reference(path) => out.push(path),
      InputMapping::Sequence(items) => {
        for item in items {
          item.collect_references(out);
        }
      }
      InputMapping::Map(entries) => {
        for (_, value) in entries {
          value.collect_references(out);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_mixed_mapping() {
    let mapping = InputMapping::parse(&json!({
      "a": "$stepA.result.text",
      "b": [1, "$stepA.result.text"],
      "c": 42
    }))
    .unwrap();

    let InputMapping::Map(entries) = &mapping else {
      panic!("expected a map, got {:?}", mapping);
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, "a");
    assert!(matches!(entries[0].1, InputMapping::Reference(_)));
    assert!(matches!(entries[1].1, InputMapping::Sequence(ref items) if items.len() == 2));
    assert_eq!(entries[2].1, InputMapping::Literal(json!(42)));
    assert_eq!(mapping.references().len(), 2);
  }

  #[test]
  fn test_doubled_sigil_is_literal() {
    let mapping = InputMapping::parse(&json!("$$9.99")).unwrap();
    assert_eq!(mapping, InputMapping::Literal(json!("$9.99")));
    assert!(mapping.references().is_empty());
  }

  #[test]
  fn test_plain_strings_and_scalars_are_literals() {
    for value in [json!("sku1"), json!(true), json!(null), json!(3.5), json!("a$b")] {
      let mapping = InputMapping::parse(&value).unwrap();
      assert_eq!(mapping, InputMapping::Literal(value));
    }
  }

  #[test]
  fn test_map_keys_are_never_references() {
    let mapping = InputMapping::parse(&json!({ "$notARef": "literal" })).unwrap();
    assert!(mapping.references().is_empty());
  }

  #[test]
  fn test_invalid_reference_is_an_error() {
    let err = InputMapping::parse(&json!({ "x": ["$"] })).unwrap_err();
    assert_eq!(err.reference, "$");

    let err = InputMapping::parse(&json!("$a..b")).unwrap_err();
    assert_eq!(err.reference, "$a..b");
  }
}
