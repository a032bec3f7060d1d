//! agentflow Config
//!
//! This crate contains the serializable workflow configuration types for agentflow.
//! These types represent agent workflow definitions as they are stored by the
//! configuration layer, before they are validated and locked for execution.
//!
//! Definitions arrive as JSON (camelCase keys):
//!
//! ```json
//! {
//!   "goal": "Check stock, then charge the customer",
//!   "workflowType": "sequential",
//!   "steps": [
//!     { "agentId": "inventory", "inputMapping": { "item": "sku1" }, "outputKey": "inv" },
//!     { "agentId": "pay", "inputMapping": { "check": "$inv.result.available" }, "outputKey": "pay" }
//!   ]
//! }
//! ```
//!
//! The engine takes these types, validates them, and locks them into runtime
//! structures (see `agentflow-workflow`).

mod enums;
mod input;
mod step;
mod workflow;

pub use enums::{ErrorPolicy, LoopTerminationType, WorkflowType};
pub use input::InputMappingDef;
pub use step::StepDef;
pub use workflow::{LoopSettings, WorkflowDef};
