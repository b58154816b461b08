//! Frustum culling for view-dependent updates.
//!
//! Extracts frustum planes from the view-projection matrix and tests
//! bounding spheres against them.

use super::BoundingSphere;

/// A plane in 3D space (Ax + By + Cz + D = 0).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Distance from origin.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Normalizes the plane.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        if len > 0.0 {
            Self {
                a: self.a / len,
                b: self.b / len,
                c: self.c / len,
                d: self.d / len,
            }
        } else {
            self
        }
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: [f32; 3]) -> f32 {
        self.a * p[0] + self.b * p[1] + self.c * p[2] + self.d
    }
}

/// View frustum for culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Left plane index.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Near plane index.
    pub const NEAR: usize = 4;
    /// Far plane index.
    pub const FAR: usize = 5;

    /// A frustum that contains everything.
    ///
    /// Degenerate planes with a positive offset: every point is inside.
    pub const EVERYTHING: Self = Self {
        planes: [Plane::new(0.0, 0.0, 0.0, 1.0); 6],
    };

    /// Extracts frustum planes from a view-projection matrix.
    ///
    /// The matrix should be in column-major order (OpenGL/WGPU convention).
    #[must_use]
    pub fn from_view_projection(m: &[[f32; 4]; 4]) -> Self {
        let row = |r: usize| [m[0][r], m[1][r], m[2][r], m[3][r]];
        let combine = |x: [f32; 4], y: [f32; 4], sign: f32| {
            Plane::new(
                x[0] + sign * y[0],
                x[1] + sign * y[1],
                x[2] + sign * y[2],
                x[3] + sign * y[3],
            )
            .normalized()
        };

        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let mut planes = [Plane::default(); 6];
        planes[Self::LEFT] = combine(r3, r0, 1.0);
        planes[Self::RIGHT] = combine(r3, r0, -1.0);
        planes[Self::BOTTOM] = combine(r3, r1, 1.0);
        planes[Self::TOP] = combine(r3, r1, -1.0);
        planes[Self::NEAR] = combine(r3, r2, 1.0);
        planes[Self::FAR] = combine(r3, r2, -1.0);

        Self { planes }
    }

    /// Tests if a sphere is visible (intersects the frustum).
    #[must_use]
    pub fn test_sphere(&self, center: [f32; 3], radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Tests a bounding sphere.
    #[inline]
    #[must_use]
    pub fn test_bounds(&self, bounds: &BoundingSphere) -> bool {
        self.test_sphere(bounds.center, bounds.radius)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::EVERYTHING
    }
}
