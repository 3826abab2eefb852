//! Triggers one ad-hoc run of a deployed flow (no schedule) and polls its
//! status until it terminates.
//!
//! Run with: `cargo run --example ad_hoc_run --features logging`

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flowvisor::{
    Config, DeployRequest, FlowBuilder, LogWriter, Orchestrator, PoolKind, PoolSpec, RetryPolicy,
    TaskError, TaskFn, TaskSpec,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = Orchestrator::builder(Config::default())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let flow = FlowBuilder::new("one-shot")
        .step(TaskSpec::new(TaskFn::arc(
            "work",
            |_ctx: CancellationToken| async {
                println!("doing the work once");
                Ok::<(), TaskError>(())
            },
        )))?
        .step({
            let attempts = Arc::new(AtomicU32::new(0));
            TaskSpec::new(TaskFn::arc("flaky", move |_ctx: CancellationToken| {
                let attempts = Arc::clone(&attempts);
                async move {
                    // Fails once, then succeeds, to show RetryScheduled.
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TaskError::Fail {
                            error: "transient".into(),
                        })
                    } else {
                        Ok(())
                    }
                }
            }))
            .with_retry(RetryPolicy::retries(2))
        })?
        .build()?;

    orchestrator
        .deploy(DeployRequest::new(
            "one-shot",
            flow,
            PoolSpec::new("local-pool", PoolKind::Process),
        ))
        .await?;

    let run = orchestrator.trigger("one-shot").await?;
    loop {
        let view = orchestrator.run_status(run).await?;
        if view.status.is_terminal() {
            println!("run {} finished: {} (error: {:?})", view.id, view.status, view.error);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    orchestrator.shutdown().await?;
    Ok(())
}
