//! Fan-out of `n` concurrent candidate requests with first-error cancellation.
//!
//! All tasks share one cancellation scope derived from the caller's token.
//! The first failure cancels the scope and becomes the result; partial
//! success is never returned. Outputs are concatenated in task completion
//! order, which need not match request order. The orchestrator returns only
//! after every task has exited.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::provider::ImageProvider;

pub struct Orchestrator {
    provider: Arc<dyn ImageProvider>,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            deadline: None,
        }
    }

    /// Cap the whole fan-out; expiry cancels every task.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Request `n` candidates (`n <= 0` uses the provider default).
    pub async fn edit(
        &self,
        parent: &CancellationToken,
        image: &[u8],
        prompt: &str,
        n: i32,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        let count = match usize::try_from(n) {
            Ok(n) if n > 0 => n,
            _ => self.provider.default_candidates().max(1),
        };

        let scope = parent.child_token();
        let _cancel_on_exit = scope.clone().drop_guard();
        let image: Arc<[u8]> = Arc::from(image);
        let prompt: Arc<str> = Arc::from(prompt);

        let mut tasks = JoinSet::new();
        for task in 0..count {
            let provider = Arc::clone(&self.provider);
            let scope = scope.clone();
            let image = Arc::clone(&image);
            let prompt = Arc::clone(&prompt);
            tasks.spawn(async move {
                let result = provider.edit_single(&scope, &image, &prompt).await;
                (task, result)
            });
        }

        tracing::debug!(provider = self.provider.name(), candidates = count, "Fan-out started");

        let expires_at = self.deadline.map(|d| (Instant::now() + d, d));
        let mut images = Vec::new();
        let mut first_error: Option<ProviderError> = None;

        loop {
            let joined = match expires_at {
                Some((at, limit)) if first_error.is_none() => {
                    tokio::select! {
                        joined = tasks.join_next() => joined,
                        _ = tokio::time::sleep_until(at) => {
                            tracing::warn!(provider = self.provider.name(), ?limit, "Fan-out deadline exceeded");
                            scope.cancel();
                            first_error = Some(ProviderError::Timeout(limit));
                            continue;
                        }
                    }
                }
                _ => tasks.join_next().await,
            };
            let Some(joined) = joined else {
                break;
            };

            let (task, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => (usize::MAX, Err(ProviderError::Task(e.to_string()))),
            };
            match result {
                Ok(mut produced) if first_error.is_none() => images.append(&mut produced),
                Ok(_) => {}
                Err(err) if first_error.is_none() => {
                    tracing::warn!(provider = self.provider.name(), task, error = %err, "Candidate failed; cancelling siblings");
                    scope.cancel();
                    first_error = Some(err);
                }
                Err(_) => {}
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        if images.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(images)
    }
}
