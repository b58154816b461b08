//! The instance manager.

use std::fmt;

use tracing::{debug, debug_span};

use super::instance::{DynamicInstance, TickableInstance};
use super::ratelimit::{limiter_for, DistanceUpdateLimiter};
use super::storage::Storage;
use super::transaction::{Transaction, TransactionQueue, TransactionSender};
use crate::config::MosaicConfig;
use crate::culling::Frustum;
use crate::task::{Plan, RunOnAll};

/// Owns a [`Storage`] and schedules its instances.
///
/// Single writer: the owner thread calls the `&mut self` methods. Other
/// threads mutate through [`queue_add`](Self::queue_add) and friends, or
/// through a [`TransactionSender`] from [`producer`](Self::producer).
///
/// A manager built for [`BackendType::Off`](crate::BackendType::Off) keeps
/// no instances and its plans visit nothing.
pub struct InstanceManager<T, S> {
    enabled: bool,
    storage: S,
    queue: TransactionQueue<T>,
    tick_limiter: Box<dyn DistanceUpdateLimiter>,
    frame_limiter: Box<dyn DistanceUpdateLimiter>,
}

impl<T, S: Storage<T>> InstanceManager<T, S> {
    /// Creates a manager, picking the limiters from `config`.
    pub fn new(storage: S, config: &MosaicConfig) -> Self {
        debug!(
            limit_updates = config.limit_updates,
            backend = %config.backend,
            "creating instance manager"
        );
        let mut manager = Self::with_limiters(
            storage,
            limiter_for(config.limit_updates),
            limiter_for(config.limit_updates),
        );
        manager.enabled = config.backend.is_enabled();
        manager
    }

    /// Creates a manager with explicit tick and frame limiters.
    pub fn with_limiters(
        storage: S,
        tick_limiter: Box<dyn DistanceUpdateLimiter>,
        frame_limiter: Box<dyn DistanceUpdateLimiter>,
    ) -> Self {
        Self {
            enabled: true,
            storage,
            queue: TransactionQueue::new(),
            tick_limiter,
            frame_limiter,
        }
    }

    /// Returns false if the manager was built for
    /// [`BackendType::Off`](crate::BackendType::Off).
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn accepts(&self, obj: &T) -> bool {
        self.enabled && self.storage.will_accept(obj)
    }

    /// Adds `obj` right away, if the storage accepts it.
    pub fn add(&mut self, obj: T) {
        if self.accepts(&obj) {
            self.storage.add(obj);
        }
    }

    /// Removes `obj` right away, if the storage accepts it.
    pub fn remove(&mut self, obj: &T) {
        if self.accepts(obj) {
            self.storage.remove(obj);
        }
    }

    /// Updates `obj` right away, if the storage accepts it.
    pub fn update(&mut self, obj: &T) {
        if self.accepts(obj) {
            self.storage.update(obj);
        }
    }

    /// Queues an add for the next plan.
    pub fn queue_add(&self, obj: T) {
        self.enqueue(Transaction::Add(obj));
    }

    /// Queues a removal for the next plan.
    pub fn queue_remove(&self, obj: T) {
        self.enqueue(Transaction::Remove(obj));
    }

    /// Queues an update for the next plan.
    pub fn queue_update(&self, obj: T) {
        self.enqueue(Transaction::Update(obj));
    }

    fn enqueue(&self, transaction: Transaction<T>) {
        if self.accepts(transaction.object()) {
            self.queue.push(transaction);
        }
    }

    /// A producer handle for threads that cannot borrow the manager.
    #[must_use]
    pub fn producer(&self) -> TransactionSender<T> {
        self.queue.sender()
    }

    /// Applies the queued transactions. Returns how many were applied.
    ///
    /// A disabled manager discards them instead.
    pub fn process_queue(&mut self) -> usize {
        if self.queue.is_empty() {
            return 0;
        }
        if !self.enabled {
            let discarded = self.queue.discard();
            debug!(discarded, "discarded transactions, instancing is off");
            return 0;
        }
        let (applied, dropped) = self.queue.drain_into(&mut self.storage);
        debug!(applied, dropped, "drained transaction queue");
        applied
    }

    /// Builds this tick's plan.
    ///
    /// Advances the tick limiter, drains the queue, then visits every
    /// tickable instance the limiter lets through.
    pub fn plan_this_tick(&mut self, camera: [f64; 3]) -> impl Plan + '_ {
        self.process_queue();
        let instances = if self.enabled {
            self.tick_limiter.tick();
            self.storage.tickable_instances()
        } else {
            Vec::new()
        };

        let limiter = &*self.tick_limiter;
        let span = debug_span!("plan_tick", instances = instances.len());
        RunOnAll::new(instances, move |instance| {
            tick_instance(instance, limiter, camera);
        })
        .in_span(span)
    }

    /// Builds this frame's plan.
    ///
    /// Like [`plan_this_tick`](Self::plan_this_tick) over the dynamic
    /// instances, additionally skipping anything outside `frustum`.
    pub fn plan_this_frame(&mut self, camera: [f64; 3], frustum: &Frustum) -> impl Plan + '_ {
        self.process_queue();
        let instances = if self.enabled {
            self.frame_limiter.tick();
            self.storage.dynamic_instances()
        } else {
            Vec::new()
        };

        let limiter = &*self.frame_limiter;
        let frustum = *frustum;
        let span = debug_span!("plan_frame", instances = instances.len());
        RunOnAll::new(instances, move |instance| {
            frame_instance(instance, limiter, camera, &frustum);
        })
        .in_span(span)
    }

    /// Live instances in the storage.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.storage.instance_count()
    }

    /// Transactions waiting for the next plan.
    #[must_use]
    pub fn pending_transactions(&self) -> usize {
        self.queue.len()
    }

    /// Rebuilds every instance.
    pub fn recreate_all(&mut self) {
        self.storage.recreate_all();
    }

    /// Drops every instance.
    pub fn invalidate(&mut self) {
        self.storage.invalidate();
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The backing storage, mutably.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

fn tick_instance(
    instance: &mut (dyn TickableInstance + '_),
    limiter: &dyn DistanceUpdateLimiter,
    camera: [f64; 3],
) {
    if !instance.decrease_tick_rate_with_distance()
        || limiter.should_update(instance.distance_squared(camera))
    {
        instance.tick();
    }
}

fn frame_instance(
    instance: &mut (dyn DynamicInstance + '_),
    limiter: &dyn DistanceUpdateLimiter,
    camera: [f64; 3],
    frustum: &Frustum,
) {
    let eligible = !instance.decrease_framerate_with_distance()
        || limiter.should_update(instance.distance_squared(camera));
    if eligible && instance.is_visible(frustum) {
        instance.begin_frame();
    }
}

impl<T, S: fmt::Debug> fmt::Debug for InstanceManager<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceManager")
            .field("enabled", &self.enabled)
            .field("storage", &self.storage)
            .field("pending", &self.queue.len())
            .field("tick_limiter", &self.tick_limiter)
            .field("frame_limiter", &self.frame_limiter)
            .finish()
    }
}
