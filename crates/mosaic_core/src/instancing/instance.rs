//! Instance capabilities.
//!
//! An instance declares what it wants updated through
//! [`Instance::as_tickable`] and [`Instance::as_dynamic`]; the storage never
//! inspects concrete types.

use crate::culling::Frustum;

/// Something with a world position the update limiters can measure.
pub trait Positioned {
    /// Squared distance from `camera` to this instance.
    fn distance_squared(&self, camera: [f64; 3]) -> f64;
}

/// A live instance of some externally owned object.
///
/// Every hook has a no-op default. Capabilities are opt-in:
///
/// ```rust,ignore
/// impl Instance for ChestInstance {
///     fn as_dynamic(&mut self) -> Option<&mut dyn DynamicInstance> {
///         Some(self)
///     }
/// }
/// ```
pub trait Instance: Send {
    /// Called once after creation, before the instance is stored.
    fn init(&mut self) {}

    /// Called when the backing object changed in a way the instance can
    /// absorb in place.
    fn update(&mut self) {}

    /// Returns true if the next update must rebuild the instance from
    /// scratch instead of calling [`update`](Self::update).
    fn should_reset(&self) -> bool {
        false
    }

    /// Releases anything the instance holds. The instance is dropped after.
    fn delete(&mut self) {}

    /// Tick capability.
    fn as_tickable(&mut self) -> Option<&mut dyn TickableInstance> {
        None
    }

    /// Per-frame capability.
    fn as_dynamic(&mut self) -> Option<&mut dyn DynamicInstance> {
        None
    }
}

/// An instance with periodic simulation updates.
pub trait TickableInstance: Positioned + Send {
    /// Runs one simulation step. Must only touch the instance's own state.
    fn tick(&mut self);

    /// Whether distant copies may tick less often.
    fn decrease_tick_rate_with_distance(&self) -> bool {
        true
    }
}

/// An instance with per-frame pose or visibility updates.
pub trait DynamicInstance: Positioned + Send {
    /// Prepares the instance for the frame about to be drawn. Must only touch
    /// the instance's own state.
    fn begin_frame(&mut self);

    /// Visibility against the camera frustum. Only queried for instances the
    /// limiter already let through.
    fn is_visible(&self, frustum: &Frustum) -> bool;

    /// Whether distant copies may update less often than every frame.
    fn decrease_framerate_with_distance(&self) -> bool {
        true
    }
}
