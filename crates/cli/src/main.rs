//! `conveyor` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server.
//! - `validate` — validate a workflow JSON file.
//! - `run`      — execute a workflow file locally and print the outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use engine::{LogNotifier, RunController, RunState, SchedulerConfig, WorkflowDefinition};
use runners::{FileSensor, InlineRunner};

#[derive(Parser)]
#[command(
    name = "conveyor",
    about = "DAG workflow orchestration engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        /// Workflow JSON files to register at startup.
        #[arg(long = "workflow")]
        workflows: Vec<PathBuf>,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Execute a workflow file locally with the built-in runner.
    Run {
        /// Path to the workflow JSON file.
        path: PathBuf,
        /// Run parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

fn load_definition(path: &PathBuf) -> WorkflowDefinition {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"))
}

fn local_controller() -> RunController {
    RunController::new(
        Arc::new(InlineRunner::new()),
        Arc::new(FileSensor::new()),
        Arc::new(LogNotifier),
        SchedulerConfig::default(),
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, workflows } => {
            let controller = local_controller();
            for path in &workflows {
                let definition = load_definition(path);
                let id = definition.id.clone();
                controller
                    .register(definition)
                    .unwrap_or_else(|e| panic!("invalid workflow {}: {e}", path.display()));
                info!(workflow = %id, "registered from {}", path.display());
            }

            let addr = bind.parse().unwrap_or_else(|e| panic!("invalid bind address {bind}: {e}"));
            info!("Starting API server on {bind}");
            api::serve(api::AppState::new(Arc::new(controller)), addr)
                .await
                .expect("server failed");
        }
        Command::Validate { path } => {
            let definition = load_definition(&path);

            match engine::compile(&definition) {
                Ok(graph) => {
                    let order: Vec<&String> = graph.task_ids().collect();
                    println!("✅ Workflow is valid. Execution order: {order:?}");
                }
                Err(e) => {
                    eprintln!("❌ Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Run { path, params } => {
            let definition = load_definition(&path);
            let params: serde_json::Value =
                serde_json::from_str(&params).unwrap_or_else(|e| panic!("invalid params: {e}"));

            let controller = local_controller();
            let workflow_id = definition.id.clone();
            controller
                .register(definition)
                .unwrap_or_else(|e| panic!("invalid workflow: {e}"));

            let run_id = controller
                .start(&workflow_id, params)
                .unwrap_or_else(|e| panic!("cannot start run: {e}"));
            info!(%run_id, workflow = %workflow_id, "run started");

            let run = loop {
                let run = controller.status(run_id).expect("run should exist");
                if run.state.is_terminal() {
                    break run;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            };

            // report in definition order, not map order
            let definition = controller.workflow(&workflow_id).expect("still registered");
            for node in &definition.nodes {
                if let Some(task) = run.tasks.get(&node.id) {
                    println!(
                        "  {}: {:?} (attempts: {})",
                        node.id, task.state, task.attempts
                    );
                }
            }
            match run.state {
                RunState::Success => println!("✅ Run {run_id} succeeded"),
                state => {
                    eprintln!("❌ Run {run_id} finished as {state:?}");
                    std::process::exit(1);
                }
            }
        }
    }
}
