//! agentflow Workflow
//!
//! This crate provides the "locked" workflow representation for agentflow.
//! A locked workflow is a validated form of a workflow definition that is
//! ready for execution.
//!
//! Key differences from `agentflow-config`:
//! - Input mappings are parsed once into [`InputMapping`] trees, so string
//!   literals and `$` references are distinct variants
//! - References are parsed into [`ValuePath`]s up front
//! - Loop settings are checked and collapsed into a [`LoopPolicy`]
//! - Dependencies between steps are available as a [`Graph`]

mod error;
mod graph;
mod mapping;
mod path;
mod step;
mod workflow;

pub use agentflow_config::{ErrorPolicy, WorkflowType};
pub use error::WorkflowError;
pub use graph::Graph;
pub use mapping::InputMapping;
pub use path::{REFERENCE_SIGIL, ValuePath, ValuePathError};
pub use step::{ITERATION_PLACEHOLDER, Step};
pub use workflow::{DEFAULT_MAX_ITERATIONS, LoopPolicy, LoopTermination, Workflow};
