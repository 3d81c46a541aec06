//! Shutdown signaling between the serve loop and the signal handler.

use tokio_util::sync::CancellationToken;

/// Owns the cancellation token the serve loop waits on.
///
/// The binary's ctrl-c task calls [`shutdown`](Self::shutdown); axum's
/// graceful-shutdown future observes the cancelled token and stops
/// accepting connections while in-flight requests drain.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// A coordinator whose token has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A token tied to this coordinator.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fire the token. Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_resolves_waiting_token() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();

        let waiter = tokio::spawn(async move {
            token.cancelled().await;
        });

        coord.shutdown();
        waiter.await.unwrap();
    }

    #[test]
    fn tokens_handed_out_before_and_after_fire() {
        let coord = ShutdownCoordinator::new();
        let early = coord.token();
        coord.shutdown();
        coord.shutdown();
        assert!(early.is_cancelled());
        assert!(coord.token().is_cancelled());
    }
}
