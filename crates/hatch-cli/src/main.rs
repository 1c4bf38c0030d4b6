use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hatch_core::{Handler, HandlerError, JobConfig, JobsBuilder, PoolConfig, Scope};

/// Submit a batch of demo jobs to worker threads and print the results.
#[derive(Debug, Parser)]
#[command(name = "hatch", version)]
struct Cli {
    /// Number of worker threads.
    #[arg(long, env = "HATCH_WORKERS")]
    workers: Option<usize>,

    /// Number of sum jobs to submit.
    #[arg(long, default_value_t = 8)]
    jobs: usize,

    /// `factor` binding passed as ctx to every sum job.
    #[arg(long, default_value_t = 1)]
    factor: i64,
}

struct Sum;

#[async_trait]
impl Handler for Sum {
    const ID: &'static str = "demo.sum.v1";
    type Input = Vec<i64>;
    type Output = i64;

    async fn handle(&self, scope: &Scope, input: Vec<i64>) -> Result<i64, HandlerError> {
        let factor: i64 = scope.get("factor")?;
        Ok(input.iter().sum::<i64>() * factor)
    }
}

#[derive(Debug, Deserialize)]
struct GreetInput {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Greeting {
    text: String,
}

struct Greet;

#[async_trait]
impl Handler for Greet {
    const ID: &'static str = "demo.greet.v1";
    type Input = GreetInput;
    type Output = Greeting;

    async fn handle(&self, scope: &Scope, input: GreetInput) -> Result<Greeting, HandlerError> {
        let greeting: String = scope.get("greeting")?;
        Ok(Greeting {
            text: format!("{greeting}, {}!", input.name),
        })
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hatch=info,hatch_core=info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut config = match PoolConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let built = JobsBuilder::new()
        .register(Sum)
        .and_then(|b| b.register(Greet))
        .and_then(|b| {
            b.register_fn("demo.fail.v1", |_scope, data: Value| async move {
                Err::<Value, _>(HandlerError::new(format!("refusing {data}")))
            })
        })
        .map_err(hatch_core::BuildError::from)
        .and_then(|b| {
            b.expect_handlers(&[Sum::ID, Greet::ID, "demo.fail.v1"])
                .config(config)
                .build()
        });
    let jobs = match built {
        Ok(jobs) => jobs,
        Err(e) => {
            error!(error = %e, "failed to start workers");
            return ExitCode::FAILURE;
        }
    };

    let sums: Vec<_> = (1..=cli.jobs as i64)
        .map(|n| {
            jobs.submit::<Sum>(
                JobConfig::new()
                    .with_ctx(json!({ "factor": cli.factor }))
                    .with_data((1..=n).collect::<Vec<i64>>()),
            )
        })
        .collect();
    for (n, pending) in sums.into_iter().enumerate() {
        match pending.await {
            Ok(total) => println!("sum(1..={}) * {} = {total}", n + 1, cli.factor),
            Err(e) => println!("sum job {} failed: {e}", n + 1),
        }
    }

    match jobs
        .submit::<Greet>(
            JobConfig::new()
                .with_ctx(json!({ "greeting": "Hello" }))
                .with_data(json!({ "name": "hatch" })),
        )
        .await
    {
        Ok(greeting) => println!("{}", greeting.text),
        Err(e) => println!("greet failed: {e}"),
    }

    if let Err(e) = jobs.job("demo.fail.v1", JobConfig::new().with_data(json!([1, 2]))).await {
        println!("expected failure: {e}");
        if let Some(stack) = e.stack() {
            println!("{stack}");
        }
    }

    // validation happens before anything reaches a worker
    if let Err(e) = jobs.job("demo.missing.v1", JobConfig::new()).await {
        println!("{e}");
    }

    info!(counts = ?jobs.pool().counts(), "done");
    jobs.stop().await;
    ExitCode::SUCCESS
}
