//! Cooperative cancellation (spec §5: "cancellable at step boundaries and
//! at every poll iteration... in-flight HTTP requests are abandoned").
//!
//! A plain `watch::Receiver<bool>` rather than a dedicated crate: the
//! same `tokio::sync::watch::channel(false)` + `shutdown_rx.changed()`
//! primitive drives shutdown at the top-level run loop and, here, at
//! every poll iteration too.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::WorkerError;

#[derive(Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A receiver that never fires, for contexts (like unit tests) that
    /// don't need real cancellation wiring.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn check(&self) -> Result<(), WorkerError> {
        if self.is_cancelled() {
            Err(WorkerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking early (and returning `Cancelled`) if a
    /// cancellation arrives mid-sleep, rather than only checking at the
    /// boundary of the next poll (spec §5: poll loops suspend on sleeps;
    /// cancellation must interrupt them, not wait them out).
    pub async fn cancellable_sleep(&mut self, duration: Duration) -> Result<(), WorkerError> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.rx.changed() => {
                if self.is_cancelled() {
                    Err(WorkerError::Cancelled)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_is_never_cancelled() {
        let cancel = Cancellation::never();
        assert!(!cancel.is_cancelled());
        assert!(cancel.check().is_ok());
    }

    #[tokio::test]
    async fn check_fails_once_cancelled() {
        let (tx, rx) = watch::channel(false);
        let cancel = Cancellation::new(rx);
        assert!(cancel.check().is_ok());
        tx.send(true).unwrap();
        assert!(matches!(cancel.check(), Err(WorkerError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellable_sleep_completes_normally_when_not_cancelled() {
        let mut cancel = Cancellation::never();
        let result = cancel.cancellable_sleep(Duration::from_millis(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancellable_sleep_interrupts_early_on_cancellation() {
        let (tx, rx) = watch::channel(false);
        let mut cancel = Cancellation::new(rx);
        let sleeper = tokio::spawn(async move {
            cancel.cancellable_sleep(Duration::from_secs(3600)).await
        });
        tokio::task::yield_now().await;
        tx.send(true).unwrap();
        let result = sleeper.await.unwrap();
        assert!(matches!(result, Err(WorkerError::Cancelled)));
    }
}
