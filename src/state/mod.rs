//! State module for crawl records and the shared request budget
//!
//! # Components
//!
//! - `LinkRecord`: a unit of crawl work with its two phase flags
//! - `ContentRecord`: the extracted result for one page
//! - `Phase`: names a processing step for failure reporting
//! - `RateBudget`: three-tier token counts behind the global rate limiter

mod rate_budget;
mod records;

// Re-export main types
pub use rate_budget::{BudgetSnapshot, RateBudget, Window};
pub use records::{ContentRecord, LinkRecord, Phase};
