use std::sync::atomic::{AtomicUsize, Ordering};

use triomphe::Arc;

use crate::config::ConfigError;
use crate::downstream::DownstreamTarget;

/// Picks the origin for each new client connection.
///
/// The target list never changes after construction, the only shared
/// mutable state is the round-robin counter.
#[derive(Debug)]
pub enum AddressSelector {
    Fixed(Arc<DownstreamTarget>),
    RoundRobin { targets: Box<[Arc<DownstreamTarget>]>, next: AtomicUsize },
}

impl AddressSelector {
    pub fn fixed(target: DownstreamTarget) -> Self {
        Self::Fixed(Arc::new(target))
    }

    pub fn round_robin(targets: Vec<DownstreamTarget>) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoDownstream);
        }
        let targets = targets.into_iter().map(Arc::new).collect();
        Ok(Self::RoundRobin { targets, next: AtomicUsize::new(0) })
    }

    /// The target for the next connection. Round-robin starts at the first
    /// target; the counter wraps on overflow.
    pub fn next(&self) -> Arc<DownstreamTarget> {
        match self {
            Self::Fixed(target) => Arc::clone(target),
            Self::RoundRobin { targets, next } => {
                let index = next.fetch_add(1, Ordering::Relaxed) % targets.len();
                Arc::clone(&targets[index])
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fixed(_) => 1,
            Self::RoundRobin { targets, .. } => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
