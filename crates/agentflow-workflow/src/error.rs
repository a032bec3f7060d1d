use thiserror::Error;

use crate::path::ValuePathError;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("step {index} has no agent id")]
  MissingAgentId { index: usize },

  #[error("step {index} has an empty output key")]
  EmptyOutputKey { index: usize },

  #[error("step {index} has an invalid reference: {source}")]
  InvalidReference {
    index: usize,
    #[source]
    source: ValuePathError,
  },

  #[error("invalid loop settings: {message}")]
  InvalidLoop { message: String },
}
