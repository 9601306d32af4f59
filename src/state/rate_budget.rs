use crate::config::RateLimitConfig;
use std::time::Duration;
use tokio::time::Instant;

/// One of the three budget windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Second,
    Minute,
    Hour,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Second, Window::Minute, Window::Hour];

    /// Time after which the window's counter resets to its ceiling
    pub fn period(&self) -> Duration {
        match self {
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(3600),
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Second => 0,
            Self::Minute => 1,
            Self::Hour => 2,
        }
    }
}

/// Remaining tokens per window at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub per_second: u32,
    pub per_minute: u32,
    pub per_hour: u32,
}

/// Three-tier request budget shared by every worker
///
/// Each window holds a token count that resets to its ceiling once the
/// window's period has elapsed since its last reset. Refills happen lazily
/// whenever the budget is consulted. A call is admitted only while all three
/// counters are positive, and costs one token from each.
#[derive(Debug, Clone)]
pub struct RateBudget {
    ceilings: [u32; 3],
    remaining: [u32; 3],
    last_refreshed: [Instant; 3],
}

impl RateBudget {
    /// Creates a full budget whose windows all start at `now`
    pub fn new(limits: RateLimitConfig, now: Instant) -> Self {
        let ceilings = [limits.per_second, limits.per_minute, limits.per_hour];
        Self {
            ceilings,
            remaining: ceilings,
            last_refreshed: [now; 3],
        }
    }

    /// Resets every window whose period has elapsed
    pub fn refill(&mut self, now: Instant) {
        for window in Window::ALL {
            let i = window.index();
            if now.saturating_duration_since(self.last_refreshed[i]) >= window.period() {
                self.remaining[i] = self.ceilings[i];
                self.last_refreshed[i] = now;
            }
        }
    }

    /// Returns true while every window still has a token
    pub fn is_admissible(&self) -> bool {
        self.remaining.iter().all(|&tokens| tokens > 0)
    }

    /// Refills, then takes one token from each window if all are non-empty
    pub fn try_admit(&mut self, now: Instant) -> bool {
        self.refill(now);
        if !self.is_admissible() {
            return false;
        }
        for tokens in self.remaining.iter_mut() {
            *tokens -= 1;
        }
        true
    }

    /// How long until every exhausted window has refilled
    ///
    /// Zero when a call would be admitted right now.
    pub fn time_until_admissible(&self, now: Instant) -> Duration {
        Window::ALL
            .iter()
            .filter(|window| self.remaining[window.index()] == 0)
            .map(|window| {
                let refresh_at = self.last_refreshed[window.index()] + window.period();
                refresh_at.saturating_duration_since(now)
            })
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn remaining(&self, window: Window) -> u32 {
        self.remaining[window.index()]
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            per_second: self.remaining[0],
            per_minute: self.remaining[1],
            per_hour: self.remaining[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn limits(per_second: u32, per_minute: u32, per_hour: u32) -> RateLimitConfig {
        RateLimitConfig {
            per_second,
            per_minute,
            per_hour,
        }
    }

    #[test]
    fn test_new_budget_is_full() {
        let budget = RateBudget::new(limits(2, 10, 100), Instant::now());
        assert_eq!(
            budget.snapshot(),
            BudgetSnapshot {
                per_second: 2,
                per_minute: 10,
                per_hour: 100
            }
        );
        assert!(budget.is_admissible());
    }

    #[test]
    fn test_admission_costs_one_from_each_window() {
        let t0 = Instant::now();
        let mut budget = RateBudget::new(limits(2, 10, 100), t0);

        assert!(budget.try_admit(t0));
        assert_eq!(budget.remaining(Window::Second), 1);
        assert_eq!(budget.remaining(Window::Minute), 9);
        assert_eq!(budget.remaining(Window::Hour), 99);
    }

    #[test]
    fn test_second_window_refill_boundary() {
        let t0 = Instant::now();
        let mut budget = RateBudget::new(limits(1, 10, 100), t0);
        assert!(budget.try_admit(t0));
        assert_eq!(budget.remaining(Window::Second), 0);

        assert!(!budget.try_admit(t0 + Duration::from_millis(990)));
        assert_eq!(
            budget.time_until_admissible(t0 + Duration::from_millis(990)),
            Duration::from_millis(10)
        );

        assert!(budget.try_admit(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_exhausted_minute_blocks_despite_second_refill() {
        let t0 = Instant::now();
        let mut budget = RateBudget::new(limits(5, 2, 100), t0);
        assert!(budget.try_admit(t0));
        assert!(budget.try_admit(t0));

        let later = t0 + Duration::from_secs(2);
        assert!(!budget.try_admit(later));
        assert_eq!(budget.time_until_admissible(later), Duration::from_secs(58));

        assert!(budget.try_admit(t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_wait_is_the_latest_exhausted_window() {
        let t0 = Instant::now();
        let mut budget = RateBudget::new(limits(1, 1, 100), t0);
        assert!(budget.try_admit(t0));

        let now = t0 + Duration::from_millis(500);
        assert_eq!(budget.time_until_admissible(now), Duration::from_millis(59_500));
    }

    #[test]
    fn test_no_window_exceeds_its_ceiling() {
        let t0 = Instant::now();
        let mut budget = RateBudget::new(limits(3, 20, 50), t0);

        let mut per_second: HashMap<u64, u32> = HashMap::new();
        let mut per_minute: HashMap<u64, u32> = HashMap::new();
        let mut per_hour = 0;

        // One attempt every 100ms for five simulated minutes
        for step in 0..3000u64 {
            let offset = Duration::from_millis(step * 100);
            if budget.try_admit(t0 + offset) {
                *per_second.entry(offset.as_secs()).or_default() += 1;
                *per_minute.entry(offset.as_secs() / 60).or_default() += 1;
                per_hour += 1;
            }
        }

        assert!(per_second.values().all(|&n| n <= 3));
        assert!(per_minute.values().all(|&n| n <= 20));
        assert!(per_hour <= 50);
        assert!(per_hour > 0);
    }
}
