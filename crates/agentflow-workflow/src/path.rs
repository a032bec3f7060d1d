//! Symbolic references into the execution state.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Prefix that marks a string as a reference rather than a literal.
pub const REFERENCE_SIGIL: char = '$';

/// A parsed reference such as `$inv.result.available`.
///
/// `root` names a state entry (a step's output key); `fields` are walked
/// inside that entry one by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValuePath {
  root: String,
  fields: Vec<String>,
}

/// A string that starts with the sigil but is not a usable reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{reference}': {message}")]
pub struct ValuePathError {
  pub reference: String,
  pub message: String,
}

impl ValuePath {
  /// Parse a reference. The input must include the leading sigil.
  pub fn parse(reference: &str) -> Result<Self, ValuePathError> {
    let invalid = |message: &str| ValuePathError {
      reference: reference.to_string(),
      message: message.to_string(),
    };

    let body = reference
      .strip_prefix(REFERENCE_SIGIL)
      .ok_or_else(|| invalid("references must start with '$'"))?;
    if body.is_empty() {
      return Err(invalid("reference names no state entry"));
    }

    let mut segments = body.split('.');
    // split always yields at least one item
    let root = segments.next().unwrap_or_default().to_string();
    let fields: Vec<String> = segments.map(str::to_string).collect();

    if root.is_empty() || fields.iter().any(|f| f.is_empty()) {
      return Err(invalid("empty path segment"));
    }

    Ok(Self { root, fields })
  }

  /// The state entry this reference reads from.
  pub fn root(&self) -> &str {
    &self.root
  }

  /// Field names walked inside the root entry.
  pub fn fields(&self) -> &[String] {
    &self.fields
  }
}

impl fmt::Display for ValuePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", REFERENCE_SIGIL, self.root)?;
    for field in &self.fields {
      write!(f, ".{}", field)?;
    }
    Ok(())
  }
}

impl Serialize for ValuePath {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for ValuePath {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    ValuePath::parse(&raw).map_err(serde::de::Error::custom)
  }
}
