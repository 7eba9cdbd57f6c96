// Agent Shutdown Token

use tokio::sync::watch;

/// Why the agent was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupt,
    Terminate,
}

/// Stop signal observed by the agent at its suspension points
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<Option<StopReason>>,
}

impl ShutdownToken {
    /// The first requested stop reason, if any
    pub fn reason(&self) -> Option<StopReason> {
        *self.rx.borrow()
    }

    pub fn is_shutdown(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait for a stop request; pends forever if the sender is gone
    pub async fn wait(&mut self) -> StopReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Shutdown sender, safe to call from a signal listener at any time
pub struct ShutdownSender {
    tx: watch::Sender<Option<StopReason>>,
}

impl ShutdownSender {
    /// Request a stop; later requests keep the first reason
    pub fn shutdown(&self, reason: StopReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(None);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
