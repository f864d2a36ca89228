//! Rays and implicit raycast primitives
//!
//! Primitives live in a fixed local unit space (`[-0.5, 0.5]³`) and know
//! nothing about where they are placed. Callers move the ray into local space
//! with the inverse of the placement transform, query, and move the results
//! back. Because [`Ray::transformed`] does not renormalize the direction, the
//! ray parameter `t` means the same point in both spaces.

pub mod primitives;

use crate::bounds::Aabb;
use crate::{Error, Result};
use glam::{Mat4, Vec3};

pub use primitives::{UnitBox, UnitCylinder, unit_box, unit_cylinder};

/// Directions components smaller than this count as parallel to a slab
pub(crate) const PARALLEL_EPSILON: f32 = 1e-7;

/// A half-line `origin + t * direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray with a unit direction, so `t` is a distance
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        let direction = direction.try_normalize().ok_or_else(|| {
            Error::InvalidParameter(format!("ray direction {direction:?} cannot be normalized"))
        })?;
        Ok(Self { origin, direction })
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Move the ray into another space. `t` keeps its meaning for affine `m`.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }
}

/// Where a ray crosses a primitive's surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Ray parameter of the crossing
    pub t: f32,
    /// Outward surface normal at the crossing, in the primitive's space
    pub normal: Vec3,
}

impl Boundary {
    pub fn new(t: f32, normal: Vec3) -> Self {
        Self { t, normal }
    }
}

/// An implicit solid that answers ray queries in local unit space
pub trait RaycastGeometry: Send + Sync {
    /// Entry and exit crossings of the ray through the solid.
    ///
    /// Returns `None` for misses, for tangent rays, and for rays that only
    /// touch an edge. Crossings may lie behind the origin (negative `t`);
    /// callers that combine solids need the whole interval.
    fn intersect(&self, ray: &Ray) -> Option<[Boundary; 2]>;

    /// Whether a local-space point is inside the solid (boundary included)
    fn contains(&self, p: Vec3) -> bool;

    /// Local bounding box
    fn bounds(&self) -> Aabb {
        Aabb::unit()
    }

    /// Short name for diagnostics
    fn name(&self) -> &'static str;
}
