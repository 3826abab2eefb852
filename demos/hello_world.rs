//! The classic hello-world deployment: two print-and-wait tasks composed
//! into one flow, deployed on a process pool with an every-minute cron.
//!
//! Run with: `cargo run --example hello_world --features logging`

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flowvisor::{
    Config, DeployRequest, FlowBuilder, LogWriter, Orchestrator, PoolKind, PoolSpec, TaskError,
    TaskFn, TaskRegistry, TaskSpec,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(10);

    let orchestrator = Orchestrator::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let mut registry = TaskRegistry::new("hello-world");
    registry.register(TaskSpec::new(TaskFn::arc(
        "greet",
        |ctx: CancellationToken| async move {
            println!("Hello from flowvisor!");
            pause(&ctx, Duration::from_secs(2)).await;
            Ok::<(), TaskError>(())
        },
    )))?;
    registry.register(TaskSpec::new(TaskFn::arc(
        "goodbye",
        |ctx: CancellationToken| async move {
            println!("Goodbye from flowvisor!");
            pause(&ctx, Duration::from_secs(2)).await;
            Ok::<(), TaskError>(())
        },
    )))?;

    let flow = FlowBuilder::new("hello-world")
        .steps_from(&registry, ["greet", "goodbye"])?
        .build()?;

    orchestrator
        .deploy(
            DeployRequest::new(
                "hello-world",
                flow,
                PoolSpec::new("local-pool", PoolKind::Process)
                    .with_description("local demo pool"),
            )
            .with_schedule("* * * * *") // every minute
            .with_tag("local")
            .with_tag("test"),
        )
        .await?;

    println!("deployed; runs fire every minute, Ctrl-C to stop");
    orchestrator.run_until_shutdown().await?;
    Ok(())
}

/// Sleeps unless the run is cancelled first.
async fn pause(ctx: &CancellationToken, dur: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(dur) => {}
        _ = ctx.cancelled() => {}
    }
}
