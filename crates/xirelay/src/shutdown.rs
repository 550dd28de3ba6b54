//! Cooperative shutdown signal shared by the relay loops.
//!
//! One [`ShutdownTrigger`] fans out to any number of [`Shutdown`] handles.
//! Loops `select!` on [`Shutdown::wait`], so a pending receive is dropped as
//! soon as the trigger fires.

use tokio::sync::watch;

/// Creates a trigger and its first listener.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every listener. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listens for the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown was triggered or the trigger was dropped.
    pub async fn wait(&mut self) {
        // Err means the trigger is gone, which also ends the loops.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
