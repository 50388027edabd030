//! Turn timing and budget tracking
//!
//! `TurnClock` measures one turn against its budget so the pipeline can stop
//! early; `TurnStats` keeps a rolling window of turn durations.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Budget usage levels over the rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Under 30% of the budget
    Comfortable,
    /// Under 70% of the budget
    Normal,
    /// Under 100% of the budget
    Tight,
    /// Average turn overran the budget
    Over,
}

/// Deadline for the current turn
#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    start: Instant,
    budget: Duration,
}

impl TurnClock {
    pub fn start(budget_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            budget: Duration::from_millis(budget_ms),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// True once the turn has used its whole budget
    #[inline]
    pub fn exceeded(&self) -> bool {
        self.elapsed() >= self.budget
    }
}

/// Rolling turn duration statistics
pub struct TurnStats {
    durations: VecDeque<Duration>,
    max_samples: usize,
    last: Duration,
    max: Duration,
    overruns: u32,
    status: BudgetStatus,
}

impl TurnStats {
    pub fn new(max_samples: usize) -> Self {
        Self {
            durations: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            last: Duration::ZERO,
            max: Duration::ZERO,
            overruns: 0,
            status: BudgetStatus::Comfortable,
        }
    }

    /// Record a finished turn against the budget it had
    pub fn record(&mut self, duration: Duration, budget: Duration) {
        self.durations.push_back(duration);
        while self.durations.len() > self.max_samples {
            self.durations.pop_front();
        }
        self.last = duration;
        self.max = self.max.max(duration);
        if duration > budget {
            self.overruns += 1;
        }
        self.update_status(budget);
    }

    fn update_status(&mut self, budget: Duration) {
        let budget = budget.as_secs_f32();
        if budget <= 0.0 {
            self.status = BudgetStatus::Over;
            return;
        }
        let ratio = self.average().as_secs_f32() / budget;
        self.status = if ratio < 0.3 {
            BudgetStatus::Comfortable
        } else if ratio < 0.7 {
            BudgetStatus::Normal
        } else if ratio < 1.0 {
            BudgetStatus::Tight
        } else {
            BudgetStatus::Over
        };
    }

    pub fn average(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.durations.iter().sum();
        sum / self.durations.len() as u32
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Turns that went over their budget
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    pub fn samples(&self) -> usize {
        self.durations.len()
    }
}
