//! Unit raycast primitives
//!
//! Both primitives fill the unit cube: the box is the cube itself, the
//! cylinder stands on the Z axis with radius 0.5 and height 1. Scale and place
//! them with the leaf transform of a CSG node.

use super::{Boundary, PARALLEL_EPSILON, Ray, RaycastGeometry};
use glam::Vec3;

// ============================================================================
// Constructor functions
// ============================================================================

/// The unit cube `[-0.5, 0.5]³`
pub fn unit_box() -> UnitBox {
    UnitBox
}

/// Z-aligned cylinder of radius 0.5 spanning `z ∈ [-0.5, 0.5]`
pub fn unit_cylinder() -> UnitCylinder {
    UnitCylinder
}

const HALF: f32 = 0.5;

/// What one bounding surface pair does to a ray
#[derive(Debug, Clone, Copy)]
enum Constraint {
    /// The ray never gets inside
    Miss,
    /// The ray runs parallel and stays inside; no limit on `t`
    Unbounded,
    /// Inside between these two crossings
    Between([Boundary; 2]),
}

/// Intersect a ray with the slab `lo <= o + t d <= hi` on one axis
fn slab(o: f32, d: f32, lo: f32, hi: f32, axis: Vec3) -> Constraint {
    if d.abs() < PARALLEL_EPSILON {
        return if o < lo || o > hi {
            Constraint::Miss
        } else {
            Constraint::Unbounded
        };
    }
    let t_lo = (lo - o) / d;
    let t_hi = (hi - o) / d;
    // Crossing the low plane exits through -axis, the high plane through +axis
    let at_lo = Boundary::new(t_lo, -axis);
    let at_hi = Boundary::new(t_hi, axis);
    Constraint::Between(if t_lo <= t_hi { [at_lo, at_hi] } else { [at_hi, at_lo] })
}

/// Narrow `[enter, exit]` with another constraint; `false` once the ray
/// can no longer be inside
fn clip(current: &mut Option<[Boundary; 2]>, constraint: Constraint) -> bool {
    let other = match constraint {
        Constraint::Miss => return false,
        Constraint::Unbounded => return true,
        Constraint::Between(other) => other,
    };
    *current = Some(match *current {
        None => other,
        Some([enter, exit]) => [
            if other[0].t > enter.t { other[0] } else { enter },
            if other[1].t < exit.t { other[1] } else { exit },
        ],
    });
    true
}

fn non_empty(interval: Option<[Boundary; 2]>) -> Option<[Boundary; 2]> {
    interval.filter(|[enter, exit]| enter.t < exit.t)
}

/// Unit cube centered at the origin
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitBox;

impl RaycastGeometry for UnitBox {
    fn intersect(&self, ray: &Ray) -> Option<[Boundary; 2]> {
        let mut interval = None;
        for (axis, unit) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
            if !clip(&mut interval, slab(ray.origin[axis], ray.direction[axis], -HALF, HALF, unit)) {
                return None;
            }
        }
        non_empty(interval)
    }

    fn contains(&self, p: Vec3) -> bool {
        p.abs().max_element() <= HALF
    }

    fn name(&self) -> &'static str {
        "box"
    }
}

/// Z-aligned unit cylinder centered at the origin
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCylinder;

impl UnitCylinder {
    const RADIUS: f32 = HALF;

    /// Entry/exit of the infinite lateral surface
    fn lateral(ray: &Ray) -> Constraint {
        let (o, d) = (ray.origin, ray.direction);
        let a = d.x * d.x + d.y * d.y;
        let c = o.x * o.x + o.y * o.y - Self::RADIUS * Self::RADIUS;

        if a < PARALLEL_EPSILON * PARALLEL_EPSILON {
            return if c > 0.0 {
                Constraint::Miss
            } else {
                Constraint::Unbounded
            };
        }

        // a t² + 2 b t + c = 0
        let b = o.x * d.x + o.y * d.y;
        let discriminant = b * b - a * c;
        // Tangent rays touch the surface at one point and do not enter
        if discriminant <= 0.0 || discriminant.is_nan() {
            return Constraint::Miss;
        }
        let root = discriminant.sqrt();
        let t0 = (-b - root) / a;
        let t1 = (-b + root) / a;

        let radial = |t: f32| {
            let p = ray.at(t);
            Vec3::new(p.x, p.y, 0.0).normalize_or_zero()
        };
        Constraint::Between([Boundary::new(t0, radial(t0)), Boundary::new(t1, radial(t1))])
    }
}

impl RaycastGeometry for UnitCylinder {
    fn intersect(&self, ray: &Ray) -> Option<[Boundary; 2]> {
        let mut interval = None;
        if !clip(&mut interval, Self::lateral(ray))
            || !clip(&mut interval, slab(ray.origin.z, ray.direction.z, -HALF, HALF, Vec3::Z))
        {
            return None;
        }
        non_empty(interval)
    }

    fn contains(&self, p: Vec3) -> bool {
        p.z.abs() <= HALF && p.x * p.x + p.y * p.y <= Self::RADIUS * Self::RADIUS
    }

    fn name(&self) -> &'static str {
        "cylinder"
    }
}
