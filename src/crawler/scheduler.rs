//! Request scheduling and rate limiting
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - A minimum spacing between consecutive request starts

use crate::config::CrawlerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Hands out permission to start a request
///
/// Cloning shares the same limits, so every fetch task of a run draws from
/// one scheduler.
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    permits: Arc<Semaphore>,

    /// Minimum time between two request starts
    delay: Duration,

    /// Earliest instant the next request may start
    next_slot: Arc<Mutex<Instant>>,
}

impl Scheduler {
    pub fn new(max_concurrent: usize, delay: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            delay,
            next_slot: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_concurrent_requests as usize,
            Duration::from_millis(config.request_delay),
        )
    }

    /// Waits for a free concurrency slot and for the politeness delay
    ///
    /// The request may start once this returns; it keeps its slot until the
    /// permit is dropped. Returns `None` if the semaphore has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;

        let start = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let start = if *next_slot > now { *next_slot } else { now };
            *next_slot = start + self.delay;
            start
        };

        tokio::time::sleep_until(start).await;
        Some(permit)
    }

    /// Number of requests that could start right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
