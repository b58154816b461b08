//! # Plans
//!
//! A plan is one pass worth of work, built on the owner thread and run to
//! completion by an [`Executor`]. Plans compose:
//!
//! ```text
//! tick_plan.then(upload_plan)       // sequential
//! tick_plan.and(frame_plan)         // independent halves, may run concurrently
//! ```
//!
//! There is no cancellation: skipping a pass means not building its plan.

mod executor;
mod plan;

pub use executor::Executor;
pub use plan::{And, InSpan, Plan, RunOnAll, SimplePlan, Then, UnitPlan};
