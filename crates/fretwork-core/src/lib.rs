//! # Fretwork Core
//!
//! Procedural solid modeling through code.
//!
//! Fretwork builds geometry two ways:
//!
//! - **Manifolds**: parametric functions sampled into regular triangle grids,
//!   then shaped with an immutable mesh algebra (transform, concatenate,
//!   weld, convert topology, split by material).
//! - **CSG**: implicit unit primitives placed with matrices and combined with
//!   union, intersection and difference. Booleans are never tessellated;
//!   they are resolved per ray with interval algebra.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fretwork_core::prelude::*;
//!
//! // A half-pipe swept around Z
//! let pipe = manifold::revolution(16, 8, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, PI)?;
//!
//! // A slab with two slots cut through it
//! let slab = CsgNode::leaf(unit_box(), Mat4::from_scale(Vec3::new(2.0, 0.5, 4.0)))?;
//! let slot = CsgNode::leaf(unit_box(), Mat4::from_scale(Vec3::new(0.3, 1.0, 3.0)))?;
//! let headstock = slab.subtract(slot.transformed(Mat4::from_translation(Vec3::X * 0.5))?);
//!
//! let hit = headstock.raycast(&Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y)?);
//! ```
//!
//! ## Units and Conventions
//!
//! - **Angles**: radians
//! - **Precision**: `f32` throughout
//! - **Matrices**: column vectors, `glam` conventions; transform lists are
//!   applied first to last
//! - **Winding**: a face's geometric normal is `(p1 - p0) × (p2 - p0)`

pub mod bounds;
pub mod csg;
pub mod manifold;
pub mod material;
pub mod mesh;
pub mod raycast;
pub mod scene;
pub mod shapes;
pub mod transform;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Bounding volumes
    pub use crate::bounds::Aabb;

    // Manifold generators
    pub use crate::manifold::{self, Separation};

    // Mesh algebra
    pub use crate::mesh::{MaterialPart, Mesh, MeshHit, Segment, Topology, Vertex};

    // Ray queries and CSG
    pub use crate::csg::{BooleanOp, Crossing, CsgHit, CsgNode, LeafId, Span, SpanSet};
    pub use crate::raycast::{Boundary, Ray, RaycastGeometry, UnitBox, UnitCylinder};
    pub use crate::raycast::{unit_box, unit_cylinder};

    // Materials and assembly
    pub use crate::material::{MaterialCatalog, MaterialId, MaterialSpec, UvMapping};
    pub use crate::scene::{SceneEntry, SceneHit, SceneShape};
    pub use crate::shapes::{BoxFace, BoxShape, CylinderShape, FaceSpec};

    // Transform builders
    pub use crate::transform::compose;

    // Math (re-export glam)
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
    pub use std::f32::consts::{PI, TAU};

    // Error handling
    pub use crate::{Error, Result};
}
