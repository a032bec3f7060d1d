//! The boundary between the engine and the agents it calls.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::InvocationError;

/// Calls an external sub-agent.
///
/// Inputs and outputs are opaque JSON to the engine. Per-call timeouts,
/// retries and concurrency limits belong to the implementation.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
  async fn invoke(&self, agent_id: &str, input: Value) -> Result<Value, InvocationError>;
}

/// An invoker that answers every call with a fixed response per agent.
///
/// Calls to an agent without a configured response fail.
#[derive(Debug, Clone, Default)]
pub struct StaticInvoker {
  responses: HashMap<String, Value>,
}

impl StaticInvoker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register the response returned for `agent_id`.
  pub fn with_response(mut self, agent_id: impl Into<String>, response: Value) -> Self {
    self.responses.insert(agent_id.into(), response);
    self
  }

  pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
    self.responses.keys().map(String::as_str)
  }
}

impl From<HashMap<String, Value>> for StaticInvoker {
  fn from(responses: HashMap<String, Value>) -> Self {
    Self { responses }
  }
}

impl FromIterator<(String, Value)> for StaticInvoker {
  fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
    Self {
      responses: iter.into_iter().collect(),
    }
  }
}

#[async_trait]
impl AgentInvoker for StaticInvoker {
  async fn invoke(&self, agent_id: &str, _input: Value) -> Result<Value, InvocationError> {
    self.responses.get(agent_id).cloned().ok_or_else(|| {
      InvocationError::new(agent_id, format!("no response configured for agent '{}'", agent_id))
    })
  }
}
