//! # Instance Lifecycle
//!
//! Live instances sit in a [`Storage`]. All mutation goes through the
//! [`InstanceManager`], either directly from the owner thread or as queued
//! [`Transaction`]s from any thread. Once per tick and once per frame the
//! manager drains the queue and hands back a plan over the instances that
//! want that update, throttled by a [`DistanceUpdateLimiter`].

mod instance;
mod manager;
mod ratelimit;
mod storage;
mod transaction;

pub use instance::{DynamicInstance, Instance, Positioned, TickableInstance};
pub use manager::InstanceManager;
pub use ratelimit::{
    limiter_for, BandedPrimeLimiter, DistanceUpdateLimiter, NonLimiter, BAND_WIDTH_SQUARED,
    DIVISOR_SEQUENCE,
};
pub use storage::{InstanceFactory, InstanceStorage, Storage};
pub use transaction::{Transaction, TransactionQueue, TransactionSender};
