//! Speed classification and loading plans.
//!
//! Turns a throughput estimate into the shape of a loading session:
//!
//! ```text
//! throughput (Mbps) ──► SpeedTier::classify ──► PlanCalculator::plan ──► BatchPlan
//!                                                        │
//!                          total / loaded items ─────────┴──► LoadingPlan
//! ```
//!
//! | Tier      | Throughput    | Batch size | Parallelism |
//! |-----------|---------------|------------|-------------|
//! | very-slow | < 0.5 Mbps    | 5          | 1           |
//! | slow      | 0.5 - 1 Mbps  | 5          | 1           |
//! | medium    | 1 - 5 Mbps    | 15         | 2           |
//! | fast      | 5 - 10 Mbps   | 30         | 3           |
//! | very-fast | >= 10 Mbps    | 50         | 4           |

mod calculator;
mod tier;

pub use calculator::{BatchPlan, LoadingPlan, PlanCalculator};
pub use tier::SpeedTier;
