// src/crawl/budget.rs
// The call budget: every request we send through a proxy costs quota, so a
// crawl gets a fixed number of them and stops when they are used up.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("API call budget exhausted ({used}/{max})")]
pub struct BudgetExceeded {
    pub used: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    used: u32,
    max: u32,
}

impl CrawlBudget {
    pub fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    // Spends one call. Returns the call number (1-based).
    pub fn charge(&mut self) -> Result<u32, BudgetExceeded> {
        if self.used >= self.max {
            return Err(BudgetExceeded {
                used: self.used,
                max: self.max,
            });
        }
        self.used += 1;
        Ok(self.used)
    }

    pub fn has_remaining(&self) -> bool {
        self.used < self.max
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}
