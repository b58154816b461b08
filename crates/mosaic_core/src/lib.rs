//! # MOSAIC Core Engine
//!
//! Instance lifecycle and update scheduling for instanced rendering:
//! - Thousands of small instances, each updated at most once per tick/frame
//! - Far-away instances throttled onto co-prime cadences
//! - Per-instance work packaged as plans for serial or parallel execution
//!
//! ## Architecture
//!
//! ```text
//! producer threads ──queue_add/queue_update/queue_remove──┐
//!                                                         ▼
//!                                              TransactionQueue (MPSC)
//!                                                         │ drained at the top of
//!                                                         ▼ every plan_this_*
//! owner thread ── plan_this_tick / plan_this_frame ──► Storage ──► Plan ──► Executor
//!                        │                                             (serial / rayon)
//!                        └── DistanceUpdateLimiter::tick
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mosaic_core::{Executor, InstanceManager, MosaicConfig, Plan};
//!
//! let config = MosaicConfig::load("mosaic.toml")?;
//! let mut manager = InstanceManager::new(storage, &config);
//! manager.queue_add(chest);
//! manager.plan_this_tick([0.0, 64.0, 0.0]).execute(&Executor::Serial);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod culling;
pub mod error;
pub mod instancing;
pub mod task;

pub use config::{BackendType, MosaicConfig};
pub use culling::{BoundingSphere, Frustum, Plane};
pub use error::{MosaicError, MosaicResult};
pub use instancing::{
    BandedPrimeLimiter, DistanceUpdateLimiter, DynamicInstance, Instance, InstanceFactory,
    InstanceManager, InstanceStorage, NonLimiter, Positioned, Storage, TickableInstance,
    Transaction, TransactionSender,
};
pub use task::{And, Executor, InSpan, Plan, RunOnAll, SimplePlan, Then, UnitPlan};
