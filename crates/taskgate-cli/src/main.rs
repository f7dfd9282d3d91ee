use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskgate_core::domain::{Operation, Outcome, StoreError, Task, TaskId};
use taskgate_core::impls::InMemoryTaskStore;
use taskgate_core::{DispatchConfig, RetryMode, ServiceBuilder, TaskService};

/// Drive a batch of task operations through the gated dispatcher.
///
/// Flags override values read from `--config`; both fall back to the defaults
/// (5 slots, 3 attempts 100 ms apart within 10 s).
#[derive(Debug, Parser)]
#[command(name = "taskgate")]
#[command(about = "Run task-store operations through a bounded, retrying dispatcher")]
struct Args {
    /// JSON file with a DispatchConfig
    #[arg(long, env = "TASKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Worker slots
    #[arg(long, env = "TASKGATE_CAPACITY")]
    capacity: Option<usize>,

    /// Max wait for a worker slot in milliseconds
    #[arg(long = "acquire-timeout-ms", env = "TASKGATE_ACQUIRE_TIMEOUT_MS")]
    acquire_timeout_ms: Option<u64>,

    /// Attempts per store operation
    #[arg(long = "max-attempts", env = "TASKGATE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Delay between attempts in milliseconds
    #[arg(long = "retry-delay-ms", env = "TASKGATE_RETRY_DELAY_MS")]
    retry_delay_ms: Option<u64>,

    /// Time budget per store operation in milliseconds
    #[arg(long = "budget-ms", env = "TASKGATE_BUDGET_MS")]
    budget_ms: Option<u64>,

    /// Retry permanent store errors as well
    #[arg(long = "uniform-retry", env = "TASKGATE_UNIFORM_RETRY")]
    uniform_retry: bool,

    /// JSON file with a list of operations (built-in demo script if omitted)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Submit all operations at once instead of one after another
    #[arg(long)]
    concurrent: bool,

    /// Artificial latency of the in-memory store in milliseconds
    #[arg(long = "latency-ms", default_value = "0")]
    latency_ms: u64,

    /// Make the first N store calls fail with a transient error
    #[arg(long = "fail-next", default_value = "0")]
    fail_next: u32,
}

impl Args {
    fn dispatch_config(&self) -> anyhow::Result<DispatchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                DispatchConfig::from_json(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => DispatchConfig::default(),
        };

        if let Some(v) = self.capacity {
            config.capacity = v;
        }
        if self.acquire_timeout_ms.is_some() {
            config.acquire_timeout_ms = self.acquire_timeout_ms;
        }
        if let Some(v) = self.max_attempts {
            config.retry.max_attempts = v;
        }
        if let Some(v) = self.retry_delay_ms {
            config.retry.delay_ms = v;
        }
        if let Some(v) = self.budget_ms {
            config.retry.budget_ms = v;
        }
        if self.uniform_retry {
            config.retry.mode = RetryMode::Uniform;
        }
        Ok(config)
    }

    fn operations(&self) -> anyhow::Result<Vec<Operation>> {
        let Some(path) = &self.script else {
            return Ok(demo_script());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing script {}", path.display()))
    }
}

/// One line of output per operation.
#[derive(Debug, Serialize)]
struct Report {
    seq: usize,
    op: &'static str,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn demo_script() -> Vec<Operation> {
    let mut ops: Vec<Operation> = (1..=6)
        .map(|i| Operation::Insert {
            task: Task::new(format!("task {i}"), format!("content of task {i}"), i % 2 == 0),
        })
        .collect();
    ops.extend([
        Operation::GetAll,
        Operation::Page { page: 1, page_size: 4 },
        Operation::Page { page: 2, page_size: 4 },
        Operation::GetById { id: TaskId::new(2) },
        Operation::Update {
            id: TaskId::new(2),
            task: Task::new("task 2", "rewritten content", true),
        },
        Operation::Delete { id: TaskId::new(3) },
        Operation::GetById { id: TaskId::new(3) },
        Operation::Insert {
            task: Task::new("x", "", false),
        },
    ]);
    ops
}

async fn run_one(
    service: &TaskService<InMemoryTaskStore>,
    seq: usize,
    op: Operation,
) -> Report {
    let name = op.name();
    match service.execute(op).await {
        Ok(outcome) => Report {
            seq,
            op: name,
            status: match outcome {
                Outcome::Created(_) => 201,
                _ => 200,
            },
            outcome: Some(outcome),
            error: None,
        },
        Err(err) => Report {
            seq,
            op: name,
            status: err.http_status(),
            outcome: None,
            error: Some(err.to_string()),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.dispatch_config()?;
    let ops = args.operations()?;

    // the store is owned here and handed to the service
    let store = Arc::new(
        InMemoryTaskStore::new().with_latency(Duration::from_millis(args.latency_ms)),
    );
    if args.fail_next > 0 {
        store
            .fail_next(args.fail_next, StoreError::Transient("injected failure".to_string()))
            .await;
    }

    let service = ServiceBuilder::from_config(&config)
        .build(Arc::clone(&store))
        .context("invalid dispatch configuration")?;

    info!(operations = ops.len(), concurrent = args.concurrent, "running script");

    let mut reports = Vec::with_capacity(ops.len());
    if args.concurrent {
        let mut set = JoinSet::new();
        for (seq, op) in ops.into_iter().enumerate() {
            let svc = service.clone();
            set.spawn(async move { run_one(&svc, seq, op).await });
        }
        while let Some(joined) = set.join_next().await {
            reports.push(joined.context("operation task panicked")?);
        }
        reports.sort_by_key(|r| r.seq);
    } else {
        for (seq, op) in ops.into_iter().enumerate() {
            reports.push(run_one(&service, seq, op).await);
        }
    }

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }

    service.shutdown();
    println!("{}", serde_json::to_string(&service.stats())?);
    info!(store_calls = store.calls(), tasks = store.len().await, "done");
    Ok(())
}
