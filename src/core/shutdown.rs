//! # OS signal handling for `run_until_shutdown`.
//!
//! Provides [`wait_for_shutdown_signal`] an async helper that completes when
//! the process receives a termination signal. On Unix this covers `SIGINT`,
//! `SIGTERM` (systemd/Kubernetes default), and `SIGQUIT`; elsewhere it falls
//! back to Ctrl-C.

/// Waits for a termination signal.
///
/// Each call registers independent listeners. Returns `Ok(())` when any
/// signal is received, or `Err` if listener registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use futures::future::select_all;
    use tokio::signal::unix::{signal, SignalKind};

    let mut listeners = vec![
        signal(SignalKind::interrupt())?,
        signal(SignalKind::terminate())?,
        signal(SignalKind::quit())?,
    ];

    let waits = listeners.iter_mut().map(|s| Box::pin(s.recv()));
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = select_all(waits) => {}
    }
    Ok(())
}

/// Waits for a termination signal (Ctrl-C only off Unix).
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
