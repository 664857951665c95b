// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use colored::Colorize;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Status line shown under shell output.
pub trait ShellStatusProvider: Send + Sync {
    fn status(&self) -> String;

    fn start(&self);

    fn stop(&self);
}

pub struct DefaultStatusProvider {
    task_count: Arc<AtomicU64>,
    interval: Duration,
    ticker: Mutex<Option<CancellationToken>>,
}

impl DefaultStatusProvider {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(2))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            task_count: Arc::new(AtomicU64::new(0)),
            interval,
            ticker: Mutex::new(None),
        }
    }

    pub fn task_count(&self) -> u64 {
        self.task_count.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }
}

impl Default for DefaultStatusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellStatusProvider for DefaultStatusProvider {
    fn status(&self) -> String {
        format!(
            "{}{}",
            "Connected to server | ".blue(),
            format!("{} tasks running", self.task_count()).green()
        )
    }

    fn start(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Status provider started outside a tokio runtime; status will not update");
            return;
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let count = self.task_count.clone();
        let interval = self.interval;

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        debug!("Status ticker stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        count.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        *ticker = Some(token);
    }

    fn stop(&self) {
        if let Some(token) = self.ticker.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for DefaultStatusProvider {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticker_counts_until_stopped() {
        let provider = DefaultStatusProvider::with_interval(Duration::from_millis(10));
        provider.start();
        provider.start();
        assert!(provider.is_running());

        tokio::time::sleep(Duration::from_millis(60)).await;
        provider.stop();
        provider.stop();
        assert!(!provider.is_running());

        let stopped_at = provider.task_count();
        assert!(stopped_at >= 1);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(provider.task_count(), stopped_at);
    }

    #[test]
    fn test_status_text() {
        let provider = DefaultStatusProvider::new();
        let status = provider.status();
        assert!(status.contains("Connected to server | "));
        assert!(status.contains("0 tasks running"));
    }
}
