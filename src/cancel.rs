//! Supersession-based cancellation for in-flight requests.
//!
//! Every fetch carries a `CancelToken` stamped with the generation it was
//! issued under. Starting a newer fetch bumps the generation, which wakes
//! any future racing on `cancelled()` and marks late results as stale. An
//! out-of-order late response can therefore never overwrite fresher state.

use tokio::sync::watch;

/// Owner of the request generation. One per session.
pub struct CancelSource {
    tx: watch::Sender<u64>,
    generation: u64,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx, generation: 0 }
    }

    /// Token for the current generation.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
            generation: self.generation,
        }
    }

    /// Invalidates every outstanding token and returns a fresh one.
    /// `send_replace` stores the new generation even when no token is
    /// currently subscribed; a plain `send` would drop it and leave the
    /// next token stillborn.
    pub fn supersede(&mut self) -> CancelToken {
        self.generation += 1;
        self.tx.send_replace(self.generation);
        self.token()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<u64>,
    generation: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() != self.generation
    }

    /// Resolves once this token's generation has been superseded. When the
    /// source is gone no newer request can exist, so the future pends
    /// forever instead of resolving.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() != self.generation {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fresh_token_is_not_cancelled() {
        let source = CancelSource::new();
        assert!(!source.token().is_cancelled());
    }

    #[tokio::test]
    async fn supersede_cancels_outstanding_tokens() {
        let mut source = CancelSource::new();
        let stale = source.token();
        let fresh = source.supersede();

        assert!(stale.is_cancelled());
        assert!(!fresh.is_cancelled());

        // Resolves immediately for an already-superseded token.
        stale.cancelled().await;
    }

    #[tokio::test]
    async fn supersede_without_outstanding_tokens_issues_a_live_token() {
        // Sequential use: each request's token is dropped before the next
        // supersede, so the channel has no subscribers at that moment.
        let mut source = CancelSource::new();

        let first = source.supersede();
        assert!(!first.is_cancelled());
        drop(first);

        let second = source.supersede();
        assert!(!second.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_a_pending_waiter() {
        let mut source = CancelSource::new();
        let token = source.token();

        let waiter = tokio::spawn(async move { token.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.supersede();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken by supersede")
            .unwrap();
    }

    #[tokio::test]
    async fn live_token_pends_when_source_dropped() {
        let source = CancelSource::new();
        let token = source.token();
        drop(source);

        assert!(!token.is_cancelled());
        let result = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(result.is_err(), "token without a source must never cancel");
    }
}
