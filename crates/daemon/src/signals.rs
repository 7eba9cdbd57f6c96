// Process signals -> agent stop requests

use inkstat_core::application::{ShutdownSender, StopReason};
use tracing::warn;

/// Resolve on SIGINT (Ctrl+C) or SIGTERM
pub async fn wait_for_stop_signal() -> StopReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => return StopReason::Interrupt,
                    _ = term.recv() => return StopReason::Terminate,
                }
            }
            Err(e) => warn!(error = %e, "SIGTERM handler unavailable; listening for Ctrl+C only"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable; only the iteration limit stops the agent");
        return std::future::pending().await;
    }
    StopReason::Interrupt
}

/// Forward the first stop signal to the agent
pub async fn forward_signals(shutdown: ShutdownSender) {
    let reason = wait_for_stop_signal().await;
    warn!(reason = ?reason, "Shutting down due to signal");
    shutdown.shutdown(reason);
}
