//! Cancellation handles for long-running polls.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation of a poll.
///
/// Cancelling clears the poll's pending timer and abandons any in-flight
/// status request. Previously observed task state is left untouched and no
/// vendor-side cancellation call is made.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());

        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        handle.cancel();

        tokio::time::timeout(std::time::Duration::from_millis(200), task)
            .await
            .expect("cancel should wake the waiting task")
            .expect("task ok");
        assert!(handle.is_cancelled());
    }
}
