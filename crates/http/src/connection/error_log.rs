//! Process wide cap on connection error logging.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of connection failures logged before going quiet.
pub const DEFAULT_ERROR_LOG_LIMIT: usize = 10;

/// Counts logged connection errors and refuses once `limit` is reached, so a
/// misbehaving peer or origin cannot flood the log.
///
/// The counter saturates at the limit and is never reset.
#[derive(Debug)]
pub struct ErrorLogLimiter {
    limit: usize,
    logged: AtomicUsize,
}

impl ErrorLogLimiter {
    pub fn new(limit: usize) -> Self {
        Self { limit, logged: AtomicUsize::new(0) }
    }

    /// Returns `true` if the caller may log one more error.
    pub fn try_acquire(&self) -> bool {
        self.logged.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| (n < self.limit).then_some(n + 1)).is_ok()
    }

    pub fn logged(&self) -> usize {
        self.logged.load(Ordering::Relaxed)
    }
}

impl Default for ErrorLogLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_saturates_at_limit() {
        let limiter = ErrorLogLimiter::new(3);
        let granted = (0..10).filter(|_| limiter.try_acquire()).count();
        assert_eq!(granted, 3);
        assert_eq!(limiter.logged(), 3);
    }

    #[test]
    fn test_concurrent_acquire() {
        let limiter = Arc::new(ErrorLogLimiter::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..100).filter(|_| limiter.try_acquire()).count())
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, DEFAULT_ERROR_LOG_LIMIT);
    }
}
