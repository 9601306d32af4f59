//! Global request budget shared by every worker

use crate::config::RateLimitConfig;
use crate::state::{BudgetSnapshot, RateBudget};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::trace;

/// Three-tier rate limiter
///
/// `acquire` refills the budget, admits the call if every window has a token,
/// and otherwise sleeps until the earliest instant at which all exhausted
/// windows have refilled before trying again. The budget lock is never held
/// across an await point.
pub struct RateLimiter {
    budget: Mutex<RateBudget>,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            budget: Mutex::new(RateBudget::new(limits, Instant::now())),
        }
    }

    /// Waits until a call is admissible, then spends one token per window
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut budget = self.lock();
                let now = Instant::now();
                if budget.try_admit(now) {
                    return;
                }
                budget.time_until_admissible(now)
            };

            trace!("Rate budget exhausted, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Admits the call only if it is admissible right now
    pub fn try_acquire(&self) -> bool {
        self.lock().try_admit(Instant::now())
    }

    /// Remaining tokens after a lazy refill
    pub fn snapshot(&self) -> BudgetSnapshot {
        let mut budget = self.lock();
        budget.refill(Instant::now());
        budget.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, RateBudget> {
        self.budget.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
