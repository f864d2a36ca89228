//! Constructive solid geometry resolved per ray
//!
//! A [`CsgNode`] is an immutable tree of placed unit primitives combined with
//! booleans. The tree is never tessellated: a query walks it, collects the
//! inside intervals of every leaf along the ray, and combines them bottom-up
//! with the interval algebra in [`SpanSet`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use fretwork_core::prelude::*;
//!
//! let body = CsgNode::leaf(unit_box(), Mat4::from_scale(Vec3::new(4.0, 1.0, 2.0)))?;
//! let hole = CsgNode::leaf(unit_cylinder(), Mat4::from_scale(Vec3::new(0.8, 0.8, 3.0)))?;
//! let part = body - hole;
//!
//! if let Some(hit) = part.raycast(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)?) {
//!     println!("hit leaf {} at {}", hit.leaf, hit.distance);
//! }
//! ```

mod interval;

use crate::bounds::Aabb;
use crate::material::MaterialId;
use crate::raycast::{Boundary, Ray, RaycastGeometry};
use crate::transform;
use crate::{Error, Result};
use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use interval::{Crossing, Span, SpanSet};

/// Depth-first position of a leaf in its tree, counted from zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafId(pub usize);

impl std::fmt::Display for LeafId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boolean combining two solids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

impl BooleanOp {
    fn apply(self, left: &SpanSet, right: &SpanSet) -> SpanSet {
        match self {
            BooleanOp::Union => left.union(right),
            BooleanOp::Intersection => left.intersection(right),
            BooleanOp::Difference => left.difference(right),
        }
    }
}

/// Nearest surface a ray meets on a CSG solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgHit {
    /// Distance from the ray origin
    pub distance: f32,
    pub position: Vec3,
    /// Outward normal of the solid at the hit, in world space
    pub normal: Vec3,
    /// The leaf whose surface was hit
    pub leaf: LeafId,
    pub material: Option<MaterialId>,
    /// The ray enters the solid here; `false` when it starts inside
    pub front_face: bool,
}

#[derive(Clone)]
struct Leaf {
    geometry: Arc<dyn RaycastGeometry>,
    transform: Mat4,
    inverse: Mat4,
    material: Option<MaterialId>,
}

impl Leaf {
    fn spans(&self, ray: &Ray, id: LeafId) -> SpanSet {
        let local = ray.transformed(&self.inverse);
        let Some([enter, exit]) = self.geometry.intersect(&local) else {
            return SpanSet::empty();
        };
        let crossing = |b: Boundary| Crossing {
            t: b.t,
            normal: transform::transform_normal(&self.inverse, b.normal),
            leaf: id,
            material: self.material,
        };
        SpanSet::single(Span::new(crossing(enter), crossing(exit)))
    }
}

#[derive(Clone)]
enum Node {
    Empty,
    Leaf(Leaf),
    Composite {
        op: BooleanOp,
        left: Arc<CsgNode>,
        right: Arc<CsgNode>,
    },
}

/// An immutable CSG tree
#[derive(Clone)]
pub struct CsgNode {
    node: Node,
    bounds: Option<Aabb>,
    leaf_count: usize,
}

impl std::fmt::Debug for CsgNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node {
            Node::Empty => f.write_str("Empty"),
            Node::Leaf(leaf) => f
                .debug_struct("Leaf")
                .field("geometry", &leaf.geometry.name())
                .field("transform", &leaf.transform)
                .field("material", &leaf.material)
                .finish(),
            Node::Composite { op, left, right } => f
                .debug_struct("Composite")
                .field("op", op)
                .field("left", left)
                .field("right", right)
                .finish(),
        }
    }
}

impl Default for CsgNode {
    fn default() -> Self {
        Self::empty()
    }
}

impl CsgNode {
    /// The empty solid
    pub fn empty() -> Self {
        Self {
            node: Node::Empty,
            bounds: None,
            leaf_count: 0,
        }
    }

    /// Place a unit primitive with an affine, invertible transform
    pub fn leaf<G: RaycastGeometry + 'static>(geometry: G, transform: Mat4) -> Result<Self> {
        Self::from_leaf(Arc::new(geometry), transform, None)
    }

    /// Like [`CsgNode::leaf`], tagging every hit on this leaf with `material`
    pub fn leaf_with_material<G: RaycastGeometry + 'static>(
        geometry: G,
        transform: Mat4,
        material: MaterialId,
    ) -> Result<Self> {
        Self::from_leaf(Arc::new(geometry), transform, Some(material))
    }

    fn from_leaf(
        geometry: Arc<dyn RaycastGeometry>,
        transform: Mat4,
        material: Option<MaterialId>,
    ) -> Result<Self> {
        if !transform.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "{} leaf transform is not finite",
                geometry.name()
            )));
        }
        if !transform.row(3).abs_diff_eq(Vec4::W, 1e-6) {
            return Err(Error::InvalidParameter(format!(
                "{} leaf transform is projective; CSG leaves need affine placements",
                geometry.name()
            )));
        }
        if transform.determinant().abs() <= f32::EPSILON {
            return Err(Error::DegenerateGeometry(format!(
                "{} leaf transform is singular and would flatten the solid",
                geometry.name()
            )));
        }

        let bounds = geometry.bounds().transformed(&transform);
        Ok(Self {
            node: Node::Leaf(Leaf {
                geometry,
                inverse: transform.inverse(),
                transform,
                material,
            }),
            bounds: Some(bounds),
            leaf_count: 1,
        })
    }

    fn composite(op: BooleanOp, left: CsgNode, right: CsgNode) -> Self {
        let bounds = match op {
            BooleanOp::Union => match (left.bounds, right.bounds) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            },
            BooleanOp::Intersection => left
                .bounds
                .zip(right.bounds)
                .and_then(|(a, b)| a.intersection(&b)),
            BooleanOp::Difference => left.bounds,
        };
        Self {
            leaf_count: left.leaf_count + right.leaf_count,
            bounds,
            node: Node::Composite {
                op,
                left: Arc::new(left),
                right: Arc::new(right),
            },
        }
    }

    /// Solid inside either operand
    pub fn union(self, other: CsgNode) -> Self {
        Self::composite(BooleanOp::Union, self, other)
    }

    /// Solid inside both operands
    pub fn intersect(self, other: CsgNode) -> Self {
        Self::composite(BooleanOp::Intersection, self, other)
    }

    /// Solid inside `self` and outside `other`
    pub fn subtract(self, other: CsgNode) -> Self {
        Self::composite(BooleanOp::Difference, self, other)
    }

    /// Combine with any operator
    pub fn combine(self, op: BooleanOp, other: CsgNode) -> Self {
        Self::composite(op, self, other)
    }

    /// Move the whole tree: every leaf transform becomes `m * transform`
    pub fn transformed(&self, m: Mat4) -> Result<Self> {
        match &self.node {
            Node::Empty => Ok(Self::empty()),
            Node::Leaf(leaf) => {
                Self::from_leaf(leaf.geometry.clone(), m * leaf.transform, leaf.material)
            }
            Node::Composite { op, left, right } => Ok(Self::composite(
                *op,
                left.transformed(m)?,
                right.transformed(m)?,
            )),
        }
    }

    /// World bounds, `None` when the solid is provably empty
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Point membership in world space, boundaries included
    pub fn contains(&self, p: Vec3) -> bool {
        if !self.bounds.is_some_and(|b| b.contains(p)) {
            return false;
        }
        match &self.node {
            Node::Empty => false,
            Node::Leaf(leaf) => leaf.geometry.contains(leaf.inverse.transform_point3(p)),
            Node::Composite { op, left, right } => match op {
                BooleanOp::Union => left.contains(p) || right.contains(p),
                BooleanOp::Intersection => left.contains(p) && right.contains(p),
                BooleanOp::Difference => left.contains(p) && !right.contains(p),
            },
        }
    }

    /// Inside intervals of the whole line through `ray`, behind the origin
    /// included
    pub fn spans(&self, ray: &Ray) -> SpanSet {
        self.spans_from(ray, 0)
    }

    fn spans_from(&self, ray: &Ray, first_leaf: usize) -> SpanSet {
        let Some(bounds) = self.bounds else {
            return SpanSet::empty();
        };
        if bounds.ray_interval(ray).is_none() {
            return SpanSet::empty();
        }
        match &self.node {
            Node::Empty => SpanSet::empty(),
            Node::Leaf(leaf) => leaf.spans(ray, LeafId(first_leaf)),
            Node::Composite { op, left, right } => {
                let a = left.spans_from(ray, first_leaf);
                if a.is_empty() && *op != BooleanOp::Union {
                    return a;
                }
                let b = right.spans_from(ray, first_leaf + left.leaf_count);
                op.apply(&a, &b)
            }
        }
    }

    /// Nearest surface in front of the ray origin
    pub fn raycast(&self, ray: &Ray) -> Option<CsgHit> {
        self.raycast_within(ray, 0.0, f32::INFINITY)
    }

    /// Nearest surface with `t_min < t <= t_max`
    pub fn raycast_within(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<CsgHit> {
        let spans = self.spans(ray);
        let (crossing, entering) = spans
            .crossings()
            .find(|(c, _)| c.t > t_min)
            .filter(|(c, _)| c.t <= t_max)?;

        Some(CsgHit {
            distance: crossing.t * ray.direction.length(),
            position: ray.at(crossing.t),
            normal: crossing.normal,
            leaf: crossing.leaf,
            material: crossing.material,
            front_face: entering,
        })
    }
}

impl std::ops::BitOr for CsgNode {
    type Output = CsgNode;

    fn bitor(self, rhs: CsgNode) -> CsgNode {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for CsgNode {
    type Output = CsgNode;

    fn bitand(self, rhs: CsgNode) -> CsgNode {
        self.intersect(rhs)
    }
}

impl std::ops::Sub for CsgNode {
    type Output = CsgNode;

    fn sub(self, rhs: CsgNode) -> CsgNode {
        self.subtract(rhs)
    }
}
