//! Request-scoped cancellation and deadline.

use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carried through every engine call. Store round-trips are abandoned as
/// soon as the token fires or the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// No deadline, never canceled unless [`Context::cancel`] is called.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context canceled together with `self`, keeping the earlier deadline.
    #[must_use]
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout.map(|t| Instant::now() + t)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast if the context is already done.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AppError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drives a store future, dropping it if the context finishes first.
    pub async fn run<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        self.check()?;

        let guarded = async {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(AppError::Canceled),
                result = future => result.map_err(AppError::Store),
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| AppError::DeadlineExceeded)?,
            None => guarded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_store_results() {
        let ctx = Context::background();
        assert_eq!(ctx.run(async { Ok(7) }).await.unwrap(), 7);

        let err = ctx
            .run(async { Err::<(), _>(anyhow::anyhow!("boom")) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[tokio::test]
    async fn canceled_context_fails_before_store_call() {
        let ctx = Context::background();
        ctx.cancel();
        let err = ctx
            .run(std::future::pending::<anyhow::Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Canceled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_call() {
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = ctx
            .run(std::future::pending::<anyhow::Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Canceled));
    }

    #[tokio::test]
    async fn deadline_interrupts_pending_call() {
        let ctx = Context::with_timeout(Duration::from_millis(20));
        let err = ctx
            .run(std::future::pending::<anyhow::Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn child_is_canceled_with_parent_and_keeps_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(1));
        let child = parent.child(Some(Duration::from_secs(60)));
        assert_eq!(child.deadline(), parent.deadline());

        parent.cancel();
        assert!(matches!(child.check(), Err(AppError::Canceled)));
    }
}
