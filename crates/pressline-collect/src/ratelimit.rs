//! Per-platform token-bucket rate limiters, shared process-wide so
//! concurrent source tasks hitting the same remote API serialize their
//! requests instead of each keeping an independent budget.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Github,
    HuggingFace,
    OpenReview,
}

/// A token bucket that refills at `qps` tokens/second up to `capacity`.
/// Acquiring a token blocks the caller when the bucket is empty rather than
/// failing.
pub struct RateLimiter {
    semaphore: Semaphore,
    capacity: usize,
    qps: f64,
    last_refill: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(capacity: usize, qps: f64) -> Self {
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            qps,
            last_refill: Mutex::new(Instant::now()),
        }
    }

    pub async fn acquire(&self) {
        self.refill();
        let _ = self.semaphore.acquire().await.expect("rate limiter semaphore never closes");
    }

    fn refill(&self) {
        let mut last = self.last_refill.lock().expect("rate limiter mutex poisoned");
        let elapsed = last.elapsed();
        let to_add = (elapsed.as_secs_f64() * self.qps) as usize;
        if to_add > 0 {
            let available = self.semaphore.available_permits();
            let add = to_add.min(self.capacity.saturating_sub(available));
            if add > 0 {
                self.semaphore.add_permits(add);
            }
            *last = Instant::now();
        }
    }
}

static LIMITERS: OnceLock<HashMap<Platform, RateLimiter>> = OnceLock::new();

pub fn limiter_for(platform: Platform) -> &'static RateLimiter {
    let map = LIMITERS.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert(Platform::Github, RateLimiter::new(5, 1.0));
        m.insert(Platform::HuggingFace, RateLimiter::new(5, 1.0));
        m.insert(Platform::OpenReview, RateLimiter::new(3, 0.5));
        m
    });
    map.get(&platform).expect("all Platform variants are registered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_does_not_exceed_capacity_concurrently() {
        let limiter = RateLimiter::new(2, 1000.0);
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.semaphore.available_permits(), 0);
    }

    #[test]
    fn registered_platforms_resolve() {
        let _ = limiter_for(Platform::Github);
        let _ = limiter_for(Platform::HuggingFace);
        let _ = limiter_for(Platform::OpenReview);
    }
}
