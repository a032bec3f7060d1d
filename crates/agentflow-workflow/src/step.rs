use std::fmt;

use crate::mapping::InputMapping;

/// Placeholder in an output key that is replaced by the loop iteration index.
pub const ITERATION_PLACEHOLDER: &str = "{iteration}";

/// A validated workflow step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  /// Position in the declared step list.
  pub index: usize,
  pub agent_id: String,
  pub input: InputMapping,
  pub output_key: Option<String>,
  pub name: Option<String>,
  pub description: Option<String>,
}

impl Step {
  /// The state key this step writes to during the given loop iteration.
  ///
  /// Outside of loops (`iteration == None`) the placeholder is kept verbatim.
  pub fn output_key_for(&self, iteration: Option<u32>) -> Option<String> {
    let key = self.output_key.as_deref()?;
    match iteration {
      Some(i) if key.contains(ITERATION_PLACEHOLDER) => {
        Some(key.replace(ITERATION_PLACEHOLDER, &i.to_string()))
      }
      _ => Some(key.to_string()),
    }
  }

  /// Display name used in logs and diagnostics.
  pub fn label(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "step {} '{}' ({})", self.index, name, self.agent_id),
      None => write!(f, "step {} ({})", self.index, self.agent_id),
    }
  }
}
