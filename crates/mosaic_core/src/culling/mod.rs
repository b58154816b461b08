//! Culling math shared by instances and meshes.
//!
//! Visibility tests are sphere-vs-frustum only: every mesh carries a
//! bounding sphere, and dynamic instances test it before their frame update.

mod bounds;
mod frustum;

pub use bounds::BoundingSphere;
pub use frustum::{Frustum, Plane};
