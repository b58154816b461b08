//! Instance registries.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use super::instance::{DynamicInstance, Instance, TickableInstance};

/// Registry of live instances, keyed by the objects they represent.
///
/// Implementations swallow requests they cannot honour (removing or updating
/// an unknown object); the manager keeps draining its queue regardless.
pub trait Storage<T> {
    /// Returns true if `obj` can be represented by this storage.
    fn will_accept(&self, obj: &T) -> bool;

    /// Starts tracking `obj`.
    fn add(&mut self, obj: T);

    /// Stops tracking `obj`.
    fn remove(&mut self, obj: &T);

    /// Tells the instance for `obj` that its object changed.
    fn update(&mut self, obj: &T);

    /// Number of live instances.
    fn instance_count(&self) -> usize;

    /// Every instance with the tick capability.
    fn tickable_instances(&mut self) -> Vec<&mut (dyn TickableInstance + '_)>;

    /// Every instance with the per-frame capability.
    fn dynamic_instances(&mut self) -> Vec<&mut (dyn DynamicInstance + '_)>;

    /// Tears down and rebuilds every instance.
    fn recreate_all(&mut self);

    /// Drops every instance and all derived state.
    fn invalidate(&mut self);
}

/// Builds instances for [`InstanceStorage`].
pub trait InstanceFactory<T> {
    /// Returns true if [`create`](Self::create) can handle `obj`.
    fn will_accept(&self, _obj: &T) -> bool {
        true
    }

    /// Creates an uninitialized instance for `obj`.
    fn create(&self, obj: &T) -> Box<dyn Instance>;
}

/// One instance per object.
pub struct InstanceStorage<T, F> {
    factory: F,
    instances: HashMap<T, Box<dyn Instance>>,
}

impl<T, F> InstanceStorage<T, F>
where
    T: Eq + Hash,
    F: InstanceFactory<T>,
{
    /// Creates an empty storage.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            instances: HashMap::new(),
        }
    }

    /// Returns true if `obj` has a live instance.
    #[must_use]
    pub fn contains(&self, obj: &T) -> bool {
        self.instances.contains_key(obj)
    }

    /// The factory instances are built with.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn spawn(factory: &F, obj: &T) -> Box<dyn Instance> {
        let mut instance = factory.create(obj);
        instance.init();
        instance
    }
}

impl<T, F> Storage<T> for InstanceStorage<T, F>
where
    T: Eq + Hash,
    F: InstanceFactory<T>,
{
    fn will_accept(&self, obj: &T) -> bool {
        self.factory.will_accept(obj)
    }

    fn add(&mut self, obj: T) {
        if self.instances.contains_key(&obj) {
            return;
        }
        let instance = Self::spawn(&self.factory, &obj);
        self.instances.insert(obj, instance);
    }

    fn remove(&mut self, obj: &T) {
        if let Some(mut instance) = self.instances.remove(obj) {
            instance.delete();
        }
    }

    fn update(&mut self, obj: &T) {
        let Some(instance) = self.instances.get_mut(obj) else {
            return;
        };
        if instance.should_reset() {
            instance.delete();
            *instance = Self::spawn(&self.factory, obj);
        } else {
            instance.update();
        }
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn tickable_instances(&mut self) -> Vec<&mut (dyn TickableInstance + '_)> {
        self.instances
            .values_mut()
            .filter_map(|instance| instance.as_tickable())
            .collect()
    }

    fn dynamic_instances(&mut self) -> Vec<&mut (dyn DynamicInstance + '_)> {
        self.instances
            .values_mut()
            .filter_map(|instance| instance.as_dynamic())
            .collect()
    }

    fn recreate_all(&mut self) {
        let factory = &self.factory;
        for (obj, instance) in &mut self.instances {
            instance.delete();
            *instance = Self::spawn(factory, obj);
        }
    }

    fn invalidate(&mut self) {
        for instance in self.instances.values_mut() {
            instance.delete();
        }
        self.instances.clear();
    }
}

impl<T, F> fmt::Debug for InstanceStorage<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceStorage")
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::Frustum;
    use crate::instancing::Positioned;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        initialized: AtomicUsize,
        deleted: AtomicUsize,
        updated: AtomicUsize,
        reset_next: AtomicBool,
    }

    struct Lamp {
        counters: Arc<Counters>,
    }

    impl Positioned for Lamp {
        fn distance_squared(&self, _camera: [f64; 3]) -> f64 {
            0.0
        }
    }

    impl DynamicInstance for Lamp {
        fn begin_frame(&mut self) {}

        fn is_visible(&self, _frustum: &Frustum) -> bool {
            true
        }
    }

    impl Instance for Lamp {
        fn init(&mut self) {
            self.counters.initialized.fetch_add(1, Ordering::Relaxed);
        }

        fn update(&mut self) {
            self.counters.updated.fetch_add(1, Ordering::Relaxed);
        }

        fn should_reset(&self) -> bool {
            self.counters.reset_next.swap(false, Ordering::Relaxed)
        }

        fn delete(&mut self) {
            self.counters.deleted.fetch_add(1, Ordering::Relaxed);
        }

        fn as_dynamic(&mut self) -> Option<&mut dyn DynamicInstance> {
            Some(self)
        }
    }

    /// Accepts even ids only.
    struct LampFactory(Arc<Counters>);

    impl InstanceFactory<u32> for LampFactory {
        fn will_accept(&self, obj: &u32) -> bool {
            obj % 2 == 0
        }

        fn create(&self, _obj: &u32) -> Box<dyn Instance> {
            self.0.created.fetch_add(1, Ordering::Relaxed);
            Box::new(Lamp {
                counters: Arc::clone(&self.0),
            })
        }
    }

    fn storage() -> (InstanceStorage<u32, LampFactory>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (InstanceStorage::new(LampFactory(Arc::clone(&counters))), counters)
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut storage, counters) = storage();
        storage.add(2);
        storage.add(2);
        assert_eq!(storage.instance_count(), 1);
        assert_eq!(counters.created.load(Ordering::Relaxed), 1);
        assert_eq!(counters.initialized.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_will_accept_delegates_to_factory() {
        let (storage, _) = storage();
        assert!(storage.will_accept(&4));
        assert!(!storage.will_accept(&3));
    }

    #[test]
    fn test_update_in_place_or_reset() {
        let (mut storage, counters) = storage();
        storage.add(2);

        storage.update(&2);
        assert_eq!(counters.updated.load(Ordering::Relaxed), 1);
        assert_eq!(counters.created.load(Ordering::Relaxed), 1);

        counters.reset_next.store(true, Ordering::Relaxed);
        storage.update(&2);
        assert_eq!(counters.updated.load(Ordering::Relaxed), 1);
        assert_eq!(counters.created.load(Ordering::Relaxed), 2);
        assert_eq!(counters.deleted.load(Ordering::Relaxed), 1);
        assert_eq!(storage.instance_count(), 1);
    }

    #[test]
    fn test_unknown_objects_are_ignored() {
        let (mut storage, counters) = storage();
        storage.update(&8);
        storage.remove(&8);
        assert_eq!(storage.instance_count(), 0);
        assert_eq!(counters.deleted.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_remove_deletes() {
        let (mut storage, counters) = storage();
        storage.add(2);
        storage.add(4);
        storage.remove(&2);
        assert!(!storage.contains(&2));
        assert!(storage.contains(&4));
        assert_eq!(counters.deleted.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_capability_views() {
        let (mut storage, _) = storage();
        storage.add(2);
        storage.add(4);
        assert_eq!(storage.dynamic_instances().len(), 2);
        assert!(storage.tickable_instances().is_empty());
    }

    #[test]
    fn test_recreate_all_and_invalidate() {
        let (mut storage, counters) = storage();
        for id in [2, 4, 6] {
            storage.add(id);
        }

        storage.recreate_all();
        assert_eq!(storage.instance_count(), 3);
        assert_eq!(counters.created.load(Ordering::Relaxed), 6);
        assert_eq!(counters.initialized.load(Ordering::Relaxed), 6);
        assert_eq!(counters.deleted.load(Ordering::Relaxed), 3);

        storage.invalidate();
        assert_eq!(storage.instance_count(), 0);
        assert_eq!(counters.deleted.load(Ordering::Relaxed), 6);
    }
}
