use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agentflow_config::WorkflowDef;
use agentflow_engine::{RunnerConfig, StaticInvoker, WorkflowRunner};
use agentflow_workflow::{LoopTermination, Workflow};

/// agentflow - Runs multi-step agent workflows
#[derive(Parser)]
#[command(name = "agentflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter, e.g. `debug` or `agentflow_engine=trace` (default: RUST_LOG, else info)
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow definition and print its execution plan
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a workflow against canned agent responses
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// JSON object mapping agent ids to their responses (default: read from stdin)
    #[arg(long)]
    agents: Option<PathBuf>,

    /// Overall time budget for the run, overriding the workflow's timeoutMs
    #[arg(long)]
    timeout_ms: Option<u64>,
  },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_tracing(cli.log_level.as_deref())?;

  match cli.command {
    Some(Commands::Validate { workflow_file }) => {
      let workflow = load_workflow(&workflow_file)?;
      print!("{}", describe_plan(&workflow));
      Ok(ExitCode::SUCCESS)
    }
    Some(Commands::Run {
      workflow_file,
      agents,
      timeout_ms,
    }) => run_workflow(workflow_file, agents, timeout_ms),
    None => {
      println!("agentflow - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
  let filter = match log_level {
    Some(level) => {
      EnvFilter::try_new(level).with_context(|| format!("invalid log level: {}", level))?
    }
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();
  Ok(())
}

fn run_workflow(
  workflow_file: PathBuf,
  agents: Option<PathBuf>,
  timeout_ms: Option<u64>,
) -> Result<ExitCode> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, agents, timeout_ms).await })
}

async fn run_workflow_async(
  workflow_file: PathBuf,
  agents: Option<PathBuf>,
  timeout_ms: Option<u64>,
) -> Result<ExitCode> {
  let workflow = load_workflow(&workflow_file)?;
  info!(workflow = %workflow.name, steps = workflow.steps.len(), "loaded workflow");

  let responses = match agents {
    Some(path) => load_responses(&path)?,
    None => read_responses_from_stdin()?,
  };
  let invoker = StaticInvoker::from(responses);

  let runner = WorkflowRunner::new(Arc::new(invoker)).with_config(RunnerConfig {
    time_budget: timeout_ms.map(Duration::from_millis),
  });

  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, cancelling after the current step");
        cancel.cancel();
      }
    }
  });

  let report = runner.run(&workflow, cancel).await;

  eprintln!("{}: {}", report.status, report.message);
  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(if report.status.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn load_workflow(path: &Path) -> Result<Workflow> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;

  let def = WorkflowDef::from_json(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))?;

  Workflow::try_from(def)
    .with_context(|| format!("invalid workflow definition: {}", path.display()))
}

fn load_responses(path: &Path) -> Result<HashMap<String, serde_json::Value>> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read agents file: {}", path.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("agents file must be a JSON object: {}", path.display()))
}

fn read_responses_from_stdin() -> Result<HashMap<String, serde_json::Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, every invocation will fail
    return Ok(HashMap::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read agent responses from stdin")?;

  if input.trim().is_empty() {
    Ok(HashMap::new())
  } else {
    serde_json::from_str(&input).context("failed to parse agent responses from stdin")
  }
}

/// Human-readable execution plan for `validate`.
fn describe_plan(workflow: &Workflow) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "workflow '{}' ({:?}, {:?})",
    workflow.name, workflow.workflow_type, workflow.error_policy
  );
  if !workflow.goal.is_empty() {
    let _ = writeln!(out, "goal: {}", workflow.goal);
  }

  for (i, group) in workflow.execution_groups().into_iter().enumerate() {
    let _ = writeln!(out, "group {}:", i);
    for step in group {
      match &step.output_key {
        Some(key) => {
          let _ = writeln!(out, "  {} -> {}", step, key);
        }
        None => {
          let _ = writeln!(out, "  {} (no output key)", step);
        }
      }
    }
  }

  if let Some(policy) = &workflow.loop_policy {
    let exit = match &policy.termination {
      LoopTermination::None => String::new(),
      LoopTermination::ExitTool(tool) => format!(", or when tool '{}' is called", tool),
      LoopTermination::StateValue { key, target } => format!(", or when {} is {}", key, target),
    };
    let _ = writeln!(out, "loop: up to {} iterations{}", policy.max_iterations, exit);
  }
  out
}
