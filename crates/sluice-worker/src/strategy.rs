//! Resizing strategies.
//!
//! A strategy decides whether a pool that has a job waiting should start
//! another worker. Each named strategy resolves to a rated policy: once the
//! pool has at least one running worker, only every `rate`-th grow request is
//! granted.
//!
//! | strategy   | rate                     |
//! |------------|--------------------------|
//! | `eager`    | 1                        |
//! | `balanced` | max(cpus / 2, 1)         |
//! | `lazy`     | max(cpus, 1)             |

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{WorkerError, WorkerResult};

/// The named resizing strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizingStrategy {
    /// Grow on every request.
    Eager,
    /// Grow only under persistent queue pressure.
    Lazy,
    /// Grow in proportion to sustained queue depth.
    #[default]
    Balanced,
}

impl ResizingStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 3] = [Self::Eager, Self::Lazy, Self::Balanced];

    /// The configuration name of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
            Self::Balanced => "balanced",
        }
    }

    /// Grow rate for a machine with `cpus` logical CPUs.
    #[must_use]
    pub fn rate_for(self, cpus: usize) -> usize {
        match self {
            Self::Eager => 1,
            Self::Balanced => (cpus / 2).max(1),
            Self::Lazy => cpus.max(1),
        }
    }
}

impl fmt::Display for ResizingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizingStrategy {
    type Err = WorkerError;

    /// Names are matched exactly; no case folding, no fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| WorkerError::unknown_strategy(s))
    }
}

/// Decides whether a pool should start another worker.
///
/// This is the seam a pool engine consumes.
pub trait Resizer: Send + Sync {
    /// Called when a job is waiting; `running` is the current worker count.
    fn should_grow(&self, running: usize, min_workers: usize, max_workers: usize) -> bool;
}

/// A rated resizer bound to a [`ResizingStrategy`].
#[derive(Debug)]
pub struct ResizingPolicy {
    strategy: ResizingStrategy,
    rate: usize,
    hits: AtomicUsize,
}

impl ResizingPolicy {
    /// Creates a policy for `strategy` sized to this machine.
    #[must_use]
    pub fn new(strategy: ResizingStrategy) -> Self {
        Self::with_cpus(strategy, num_cpus::get())
    }

    /// Creates a policy for `strategy` as if the machine had `cpus` CPUs.
    #[must_use]
    pub fn with_cpus(strategy: ResizingStrategy, cpus: usize) -> Self {
        Self {
            strategy,
            rate: strategy.rate_for(cpus),
            hits: AtomicUsize::new(0),
        }
    }

    /// The strategy this policy implements.
    #[must_use]
    pub fn strategy(&self) -> ResizingStrategy {
        self.strategy
    }

    /// Grow requests per granted growth once workers are running.
    #[must_use]
    pub fn rate(&self) -> usize {
        self.rate
    }
}

impl Clone for ResizingPolicy {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy,
            rate: self.rate,
            hits: AtomicUsize::new(self.hits.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for ResizingPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.strategy == other.strategy && self.rate == other.rate
    }
}

impl Eq for ResizingPolicy {}

impl Resizer for ResizingPolicy {
    fn should_grow(&self, running: usize, min_workers: usize, max_workers: usize) -> bool {
        if running >= max_workers {
            return false;
        }
        if running < min_workers || running == 0 || self.rate <= 1 {
            return true;
        }
        let hits = self.hits.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        hits % self.rate == 1
    }
}

/// Resolves a strategy name into a policy.
///
/// Unknown names are an error; there is no default substitution.
///
/// # Example
///
/// ```rust
/// use sluice_worker::{resolve_strategy, ResizingStrategy};
///
/// let policy = resolve_strategy("eager").unwrap();
/// assert_eq!(policy.strategy(), ResizingStrategy::Eager);
/// assert!(resolve_strategy("greedy").is_err());
/// ```
pub fn resolve_strategy(name: &str) -> WorkerResult<ResizingPolicy> {
    let strategy: ResizingStrategy = name.parse()?;
    let policy = ResizingPolicy::new(strategy);
    tracing::debug!(strategy = %strategy, rate = policy.rate(), "Resolved resizing strategy");
    Ok(policy)
}
