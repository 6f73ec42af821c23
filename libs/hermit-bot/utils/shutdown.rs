//! Graceful shutdown management

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use wirelink::ShutdownSignal;

/// Manages graceful shutdown for long-running processes
#[derive(Clone)]
pub struct ShutdownManager {
    signal: Arc<ShutdownSignal>,
}

impl ShutdownManager {
    /// Create a new shutdown manager with running state
    pub fn new() -> Self {
        Self {
            signal: Arc::new(ShutdownSignal::new()),
        }
    }

    /// Spawn a Ctrl+C signal handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let signal = Arc::clone(&self.signal);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("");
                info!("Received shutdown signal (Ctrl+C)");
                info!("Shutting down gracefully...");
                signal.trigger();
            }
        });
    }

    /// Request shutdown from code
    pub fn trigger(&self) {
        self.signal.trigger();
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        !self.signal.is_triggered()
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        self.signal.wait().await;
    }

    /// Sleep for a duration, but wake early if shutdown is triggered
    pub async fn interruptible_sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.signal.wait() => {}
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_trigger_interrupts_sleep() {
        let shutdown = ShutdownManager::new();
        assert!(shutdown.is_running());

        let sleeper = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let started = tokio::time::Instant::now();
                shutdown.interruptible_sleep(Duration::from_secs(3600)).await;
                started.elapsed()
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.trigger();

        let slept = sleeper.await.unwrap();
        assert!(slept < Duration::from_secs(3600));
        assert!(!shutdown.is_running());
    }
}
