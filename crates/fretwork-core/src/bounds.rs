//! Axis-aligned bounding boxes shared by meshes and CSG trees

use crate::raycast::Ray;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The local space of every raycast primitive: `[-0.5, 0.5]³`
    pub fn unit() -> Self {
        Self::new(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    /// Tightest box around a set of points, `None` when there are none
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |b, p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    /// Merge two bounding boxes
    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Overlap of two boxes, `None` when they are disjoint
    pub fn intersection(&self, other: &Aabb) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.cmple(max).all()).then(|| Self::new(min, max))
    }

    /// Get the size of the bounding box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Box around the eight transformed corners
    pub fn transformed(&self, m: &Mat4) -> Self {
        let b = self;
        let corners = [
            Vec3::new(b.min.x, b.min.y, b.min.z),
            Vec3::new(b.max.x, b.min.y, b.min.z),
            Vec3::new(b.min.x, b.max.y, b.min.z),
            Vec3::new(b.max.x, b.max.y, b.min.z),
            Vec3::new(b.min.x, b.min.y, b.max.z),
            Vec3::new(b.max.x, b.min.y, b.max.z),
            Vec3::new(b.min.x, b.max.y, b.max.z),
            Vec3::new(b.max.x, b.max.y, b.max.z),
        ];

        let mut new_min = Vec3::splat(f32::MAX);
        let mut new_max = Vec3::splat(f32::MIN);

        for corner in corners {
            let p = m.project_point3(corner);
            new_min = new_min.min(p);
            new_max = new_max.max(p);
        }

        Aabb::new(new_min, new_max)
    }

    /// Parameter range `[t_enter, t_exit]` over which `ray` is inside the box
    ///
    /// Directions parallel to a slab only pass when the origin lies within it,
    /// so the result never contains NaN.
    pub fn ray_interval(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < crate::raycast::PARALLEL_EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, t_exit))
    }
}
