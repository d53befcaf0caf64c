//! Scripted provider for stage and pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use slidesmith_provider::{CompletionProvider, CompletionRequest};
use slidesmith_shared::{Result, SlidesmithError};

/// Replays canned replies in order and records every request.
///
/// Once the script runs out, every call fails with a provider error.
pub(crate) struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<CompletionRequest>>,
    delay: Duration,
}

impl ScriptedProvider {
    pub(crate) fn new(replies: impl IntoIterator<Item = Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// A provider with no script; every call fails.
    pub(crate) fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Wait this long before answering each call.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SlidesmithError::Provider("script exhausted".into())))
    }
}

/// A reply the provider would give for an unreachable host.
pub(crate) fn transport_error() -> Result<String> {
    Err(SlidesmithError::Provider("connection refused".into()))
}

/// A reply the provider would give for an exhausted account.
pub(crate) fn quota_error() -> Result<String> {
    Err(SlidesmithError::QuotaExceeded("HTTP 429: insufficient_quota".into()))
}
