//! Workflow orchestration.
//!
//! The [`WorkflowRunner`] owns one run from start to report: it picks the
//! strategy for the workflow type, stores step results in the execution
//! state, applies the error policy and watches for cancellation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use agentflow_workflow::{ErrorPolicy, LoopTermination, Step, Workflow, WorkflowType};
use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Span, error, info, instrument, warn};

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::invoker::AgentInvoker;
use crate::report::{Diagnostic, FailureKind, LoopExit, ReportStatus, WorkflowExecutionReport};
use crate::state::{ExecutionState, StepResult};
use crate::step::{StepExecutor, StepOutcome};
use crate::termination::{calls_tool, state_reached};

/// Configuration for the workflow runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
  /// Wall-clock budget for a whole run. Takes precedence over the
  /// workflow's own `timeoutMs`.
  pub time_budget: Option<Duration>,
}

/// Executes workflows against an [`AgentInvoker`].
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `WorkflowRunner::new()` for a runner with no-op notifications,
/// or `WorkflowRunner::with_notifier()` to observe events.
pub struct WorkflowRunner<N: ExecutionNotifier = NoopNotifier> {
  executor: StepExecutor,
  config: RunnerConfig,
  notifier: N,
}

impl WorkflowRunner<NoopNotifier> {
  pub fn new(invoker: Arc<dyn AgentInvoker>) -> Self {
    Self::with_notifier(invoker, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowRunner<N> {
  pub fn with_notifier(invoker: Arc<dyn AgentInvoker>, notifier: N) -> Self {
    Self {
      executor: StepExecutor::new(invoker),
      config: RunnerConfig::default(),
      notifier,
    }
  }

  pub fn with_config(mut self, config: RunnerConfig) -> Self {
    self.config = config;
    self
  }

  /// Run a workflow to completion.
  ///
  /// Always returns a report; failures are described by its status, failure
  /// kind and message. Cancellation is observed between steps and between
  /// parallel groups, never during an invocation.
  #[instrument(
    name = "workflow_run",
    skip(self, workflow, cancel),
    fields(
      workflow = %workflow.name,
      execution_id = tracing::field::Empty,
    )
  )]
  pub async fn run(
    &self,
    workflow: &Workflow,
    cancel: CancellationToken,
  ) -> WorkflowExecutionReport {
    let execution_id = uuid::Uuid::new_v4().to_string();
    Span::current().record("execution_id", execution_id.as_str());

    info!(
      workflow_type = ?workflow.workflow_type,
      steps = workflow.steps.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow: workflow.name.clone(),
    });

    let budget = self
      .config
      .time_budget
      .or(workflow.timeout_ms.map(Duration::from_millis));
    let mut run = Run::new(execution_id, cancel, budget, workflow.error_policy);

    let outcome = if workflow.steps.is_empty() {
      Ok(())
    } else {
      match workflow.workflow_type {
        WorkflowType::Sequential => self.run_sequential(&mut run, workflow).await,
        WorkflowType::Parallel => self.run_parallel(&mut run, workflow).await,
        WorkflowType::Loop => self.run_loop(&mut run, workflow).await,
      }
    };

    self.finish(workflow, run, outcome)
  }

  async fn run_sequential(&self, run: &mut Run, workflow: &Workflow) -> Result<(), EngineError> {
    for step in &workflow.steps {
      self.run_step(run, step, None).await?;
    }
    Ok(())
  }

  /// Run each dependency layer concurrently against a snapshot of the state,
  /// then merge the layer's results in declaration order.
  async fn run_parallel(&self, run: &mut Run, workflow: &Workflow) -> Result<(), EngineError> {
    for group in workflow.execution_groups() {
      run.check()?;

      info!(
        execution_id = %run.execution_id,
        steps = ?group.iter().map(|s| s.index).collect::<Vec<_>>(),
        "executing parallel group"
      );

      let snapshot = Arc::new(run.state.clone());
      let mut handles = Vec::with_capacity(group.len());
      for step in &group {
        self.notify_started(run, step, None);

        let executor = self.executor.clone();
        let step = Step::clone(step);
        let snapshot = Arc::clone(&snapshot);
        let execution_id = run.execution_id.clone();
        handles.push(tokio::spawn(async move {
          executor.execute(&step, &snapshot, &execution_id).await
        }));
      }

      let results = join_all(handles).await;

      // Merge everything that finished before honouring a fail-fast halt.
      let mut halt = None;
      for (step, joined) in group.into_iter().zip(results) {
        let outcome = joined.unwrap_or_else(|e| StepOutcome {
          diagnostics: Vec::new(),
          result: Err(EngineError::StepJoin {
            index: step.index,
            step: step.label(),
            message: e.to_string(),
          }),
        });
        if let Err(e) = self.absorb(run, step, None, outcome) {
          halt.get_or_insert(e);
        }
      }
      if let Some(e) = halt {
        return Err(e);
      }
    }
    Ok(())
  }

  async fn run_loop(&self, run: &mut Run, workflow: &Workflow) -> Result<(), EngineError> {
    let policy = workflow.loop_policy.clone().unwrap_or_default();
    run.iterations = Some(0);

    for iteration in 0..policy.max_iterations {
      for step in &workflow.steps {
        let stored = self.run_step(run, step, Some(iteration)).await?;

        if let LoopTermination::ExitTool(tool) = &policy.termination {
          if stored.is_some_and(|r| calls_tool(&r.result, tool)) {
            info!(
              execution_id = %run.execution_id,
              iteration,
              step = step.index,
              tool = %tool,
              "exit tool called"
            );
            self.complete_iteration(run, iteration);
            run.loop_exit = Some(LoopExit::ExitTool);
            return Ok(());
          }
        }
      }

      self.complete_iteration(run, iteration);

      if let LoopTermination::StateValue { key, target } = &policy.termination {
        if state_reached(key, target, &run.state) {
          info!(
            execution_id = %run.execution_id,
            iteration,
            key = %key,
            "loop state condition reached"
          );
          run.loop_exit = Some(LoopExit::StateCondition);
          return Ok(());
        }
      }
    }

    info!(
      execution_id = %run.execution_id,
      max_iterations = policy.max_iterations,
      "loop reached its iteration bound"
    );
    run.loop_exit = Some(LoopExit::MaxIterations);
    Ok(())
  }

  /// Execute one step against the live state and record its outcome.
  async fn run_step(
    &self,
    run: &mut Run,
    step: &Step,
    iteration: Option<u32>,
  ) -> Result<Option<StepResult>, EngineError> {
    run.check()?;
    self.notify_started(run, step, iteration);

    let outcome = self
      .executor
      .execute(step, &run.state, &run.execution_id)
      .await;
    self.absorb(run, step, iteration, outcome)
  }

  /// Record a finished step.
  ///
  /// Returns the stored result, `None` for a failure tolerated by the error
  /// policy, or the error that halts the run.
  fn absorb(
    &self,
    run: &mut Run,
    step: &Step,
    iteration: Option<u32>,
    outcome: StepOutcome,
  ) -> Result<Option<StepResult>, EngineError> {
    run.diagnostics.extend(outcome.diagnostics);

    match outcome.result {
      Ok(result) => {
        run.succeeded += 1;
        let output_key = step.output_key_for(iteration);

        self.notifier.notify(ExecutionEvent::StepCompleted {
          execution_id: run.execution_id.clone(),
          step_index: step.index,
          output_key: output_key.clone(),
          result: result.result.clone(),
        });

        match output_key {
          Some(key) => {
            run.state.insert(key, result.clone());
          }
          None => {
            if run.warned_missing_keys.insert(step.index) {
              warn!(
                execution_id = %run.execution_id,
                step = step.index,
                agent_id = %step.agent_id,
                "step has no output key, result is not stored"
              );
              run.diagnostics.push(Diagnostic::MissingOutputKey {
                step: step.index,
                agent_id: step.agent_id.clone(),
              });
            }
          }
        }
        Ok(Some(result))
      }
      Err(e) => {
        run.failed += 1;
        error!(
          execution_id = %run.execution_id,
          step = step.index,
          error = %e,
          "step_failed"
        );

        self.notifier.notify(ExecutionEvent::StepFailed {
          execution_id: run.execution_id.clone(),
          step_index: step.index,
          error: e.to_string(),
        });
        run.diagnostics.push(Diagnostic::StepFailed {
          step: step.index,
          agent_id: step.agent_id.clone(),
          message: e.to_string(),
        });

        match run.error_policy {
          ErrorPolicy::FailFast => Err(e),
          ErrorPolicy::ContinueOnError => Ok(None),
        }
      }
    }
  }

  fn notify_started(&self, run: &Run, step: &Step, iteration: Option<u32>) {
    self.notifier.notify(ExecutionEvent::StepStarted {
      execution_id: run.execution_id.clone(),
      step_index: step.index,
      agent_id: step.agent_id.clone(),
      iteration,
    });
  }

  fn complete_iteration(&self, run: &mut Run, iteration: u32) {
    run.iterations = Some(iteration + 1);
    info!(execution_id = %run.execution_id, iteration, "iteration_completed");
    self.notifier.notify(ExecutionEvent::IterationCompleted {
      execution_id: run.execution_id.clone(),
      iteration,
    });
  }

  fn finish(
    &self,
    workflow: &Workflow,
    run: Run,
    outcome: Result<(), EngineError>,
  ) -> WorkflowExecutionReport {
    let (status, failure, message) = match outcome {
      Err(e) => {
        let kind = match &e {
          EngineError::Cancelled => FailureKind::Cancelled,
          EngineError::TimedOut { .. } => FailureKind::TimedOut,
          EngineError::StepInvocation { .. } | EngineError::StepJoin { .. } => {
            FailureKind::Invocation
          }
        };
        (ReportStatus::Failed, Some(kind), e.to_string())
      }
      Ok(()) if workflow.steps.is_empty() => (
        ReportStatus::CompletedNoSteps,
        None,
        format!("workflow '{}' has no steps", workflow.name),
      ),
      Ok(()) if run.failed == 0 => (
        ReportStatus::Success,
        None,
        format!(
          "workflow '{}' completed: {} step executions succeeded",
          workflow.name, run.succeeded
        ),
      ),
      Ok(()) if run.succeeded == 0 => (
        ReportStatus::Failed,
        Some(FailureKind::Invocation),
        format!(
          "workflow '{}' failed: all {} step executions failed",
          workflow.name, run.failed
        ),
      ),
      Ok(()) => (
        ReportStatus::PartialFailure,
        None,
        format!(
          "workflow '{}' completed with errors: {} step executions succeeded, {} failed",
          workflow.name, run.succeeded, run.failed
        ),
      ),
    };

    if status == ReportStatus::Failed {
      error!(execution_id = %run.execution_id, error = %message, "workflow_failed");
      self.notifier.notify(ExecutionEvent::WorkflowFailed {
        execution_id: run.execution_id.clone(),
        error: message.clone(),
      });
    } else {
      info!(execution_id = %run.execution_id, status = %status, "workflow_completed");
      self.notifier.notify(ExecutionEvent::WorkflowCompleted {
        execution_id: run.execution_id.clone(),
        status,
      });
    }

    WorkflowExecutionReport {
      status,
      failure,
      message,
      state: run.state,
      diagnostics: run.diagnostics,
      steps_succeeded: run.succeeded,
      steps_failed: run.failed,
      iterations: run.iterations,
      loop_termination: run.loop_exit,
    }
  }
}

/// Mutable bookkeeping for a single run.
struct Run {
  execution_id: String,
  cancel: CancellationToken,
  deadline: Option<(Instant, Duration)>,
  error_policy: ErrorPolicy,
  state: ExecutionState,
  diagnostics: Vec<Diagnostic>,
  warned_missing_keys: HashSet<usize>,
  succeeded: usize,
  failed: usize,
  iterations: Option<u32>,
  loop_exit: Option<LoopExit>,
}

impl Run {
  fn new(
    execution_id: String,
    cancel: CancellationToken,
    budget: Option<Duration>,
    error_policy: ErrorPolicy,
  ) -> Self {
    Self {
      execution_id,
      cancel,
      deadline: budget.map(|b| (Instant::now() + b, b)),
      error_policy,
      state: ExecutionState::new(),
      diagnostics: Vec::new(),
      warned_missing_keys: HashSet::new(),
      succeeded: 0,
      failed: 0,
      iterations: None,
      loop_exit: None,
    }
  }

  /// Fails with the reason the run must stop, if any.
  fn check(&self) -> Result<(), EngineError> {
    if self.cancel.is_cancelled() {
      warn!(execution_id = %self.execution_id, "workflow cancelled");
      return Err(EngineError::Cancelled);
    }
    if let Some((deadline, budget)) = self.deadline {
      if Instant::now() >= deadline {
        warn!(execution_id = %self.execution_id, "workflow time budget exhausted");
        return Err(EngineError::TimedOut {
          budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        });
      }
    }
    Ok(())
  }
}
