//! Bounding volumes.

/// A sphere enclosing a mesh or an instance, in the owner's space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center.
    pub center: [f32; 3],
    /// Sphere radius. Zero for degenerate (empty) geometry.
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new sphere.
    #[must_use]
    pub const fn new(center: [f32; 3], radius: f32) -> Self {
        Self { center, radius }
    }

    /// Computes a sphere enclosing every given point.
    ///
    /// Centered on the AABB midpoint, which is cheap and never more than
    /// `sqrt(3)` times the optimal radius.
    #[must_use]
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let mut min = *first;
        let mut max = *first;
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        let center = [
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        ];
        let radius_sq = points
            .iter()
            .map(|p| distance_squared(center, *p))
            .fold(0.0f32, f32::max);

        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }
}

fn distance_squared(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
