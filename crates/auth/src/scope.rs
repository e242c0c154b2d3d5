use super::*;
use std::future::Future;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline for one logical operation.
///
/// Every store round-trip and hash computation the identity core performs
/// runs through [`Scope::guard`], so a fired token or a passed deadline
/// surfaces as [`Error::Cancelled`] instead of a hung request.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Scope {
    /// No deadline; only explicit cancellation stops it.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn within(timeout: std::time::Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }
    /// Shares the cancellation token of `parent`, keeps its own deadline.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
    /// Drives `work` to completion unless the scope fires first.
    pub async fn guard<T, E, F>(&self, work: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
        Error: From<E>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = deadline => Err(Error::Cancelled),
            result = work => result.map_err(Error::from),
        }
    }
}
