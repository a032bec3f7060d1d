//! Execution events and notifiers for observability.
//!
//! Events are emitted while a workflow runs so consumers can follow progress,
//! persist intermediate results, or stream them to a UI.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::report::ReportStatus;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
  },

  /// A step is about to be invoked.
  StepStarted {
    execution_id: String,
    step_index: usize,
    agent_id: String,
    iteration: Option<u32>,
  },

  /// A step's agent returned a result.
  StepCompleted {
    execution_id: String,
    step_index: usize,
    output_key: Option<String>,
    result: serde_json::Value,
  },

  /// A step's agent invocation failed.
  StepFailed {
    execution_id: String,
    step_index: usize,
    error: String,
  },

  /// A loop iteration ran its whole body.
  IterationCompleted { execution_id: String, iteration: u32 },

  /// Workflow execution has finished without a fatal error.
  WorkflowCompleted {
    execution_id: String,
    status: ReportStatus,
  },

  /// Workflow execution has failed.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The runner calls `notify` for each event; implementations decide what to
/// do with them (persist, broadcast, log, ignore).
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // NOTE: unbounded so a slow consumer never stalls the runner. Volume is a
  // handful of events per step.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
