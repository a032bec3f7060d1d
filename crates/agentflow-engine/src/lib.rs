//! agentflow Engine
//!
//! This crate executes locked agent workflows. It resolves each step's input
//! mapping against the shared execution state, invokes the step's agent through
//! an [`AgentInvoker`], and threads results forward to later steps.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - run(workflow, cancel) → WorkflowExecutionReport          │
//! │  - sequential / parallel / loop strategies                  │
//! │  - owns ExecutionState, cancellation, time budget           │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      StepExecutor                           │
//! │  - execute(step, state) → StepOutcome                       │
//! │  - input resolution, agent invocation                       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │             resolve_mapping / resolve_path                  │
//! │  - `$key.field` references → values from ExecutionState     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use agentflow_engine::{StaticInvoker, WorkflowRunner};
//! use tokio_util::sync::CancellationToken;
//!
//! let invoker = StaticInvoker::new()
//!     .with_response("inventory", json!({ "available": true }))
//!     .with_response("pay", json!({ "confirmed": true }));
//! let runner = WorkflowRunner::new(Arc::new(invoker));
//!
//! let report = runner.run(&workflow, CancellationToken::new()).await;
//! println!("{}: {}", report.status, report.message);
//! ```

mod error;
mod events;
mod invoker;
mod report;
mod resolve;
mod runner;
mod state;
mod step;
mod termination;

pub use error::{BoxError, EngineError, InvocationError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use invoker::{AgentInvoker, StaticInvoker};
pub use report::{Diagnostic, FailureKind, LoopExit, ReportStatus, WorkflowExecutionReport};
pub use resolve::{Unresolved, resolve_mapping, resolve_path};
pub use runner::{RunnerConfig, WorkflowRunner};
pub use state::{ExecutionState, StepResult};
pub use step::{StepExecutor, StepOutcome};
