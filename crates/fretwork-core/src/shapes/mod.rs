//! Ready-made unit shapes assembled from manifolds
//!
//! Builders produce triangle meshes centred on the origin inside `[-0.5, 0.5]³`,
//! with outward-facing triangles, per-part normal overrides and one material
//! segment per part. Scale and place them like any other mesh.

mod cylinder;

use crate::manifold::{self, Separation};
use crate::material::MaterialCatalog;
use crate::mesh::{MaterialPart, Mesh};
use crate::Result;
use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub use cylinder::CylinderShape;

fn default_material() -> String {
    MaterialCatalog::DEFAULT.to_string()
}

fn default_resolution() -> u32 {
    8
}

/// The six faces of the unit box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFace {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::NegX,
        BoxFace::PosX,
        BoxFace::NegY,
        BoxFace::PosY,
        BoxFace::NegZ,
        BoxFace::PosZ,
    ];

    pub fn outward(self) -> Vec3 {
        match self {
            BoxFace::NegX => Vec3::NEG_X,
            BoxFace::PosX => Vec3::X,
            BoxFace::NegY => Vec3::NEG_Y,
            BoxFace::PosY => Vec3::Y,
            BoxFace::NegZ => Vec3::NEG_Z,
            BoxFace::PosZ => Vec3::Z,
        }
    }

    /// Places an XY unit patch on this face of `[0, 1]³`
    fn placement(self) -> Mat4 {
        // Columns say where the patch's x, y and z axes go
        let (x, y, z) = match self {
            BoxFace::NegX | BoxFace::PosX => (Vec4::Y, Vec4::Z, Vec4::X),
            BoxFace::NegY | BoxFace::PosY => (Vec4::X, Vec4::Z, Vec4::Y),
            BoxFace::NegZ | BoxFace::PosZ => (Vec4::X, Vec4::Y, Vec4::Z),
        };
        let lift = self.outward().max(Vec3::ZERO);
        Mat4::from_translation(lift) * Mat4::from_cols(x, y, z, Vec4::W)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// How one face of a [`BoxShape`] is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSpec {
    pub enabled: bool,
    /// Cut an opening inside these margins
    pub hole: Option<Separation>,
    /// Material name in the catalog
    pub material: String,
}

impl Default for FaceSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            hole: None,
            material: default_material(),
        }
    }
}

impl FaceSpec {
    pub fn solid(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            ..Self::default()
        }
    }

    pub fn holed(material: impl Into<String>, hole: Separation) -> Self {
        Self {
            hole: Some(hole),
            ..Self::solid(material)
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Unit box with individually configurable faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    #[serde(default = "default_resolution")]
    pub slices: u32,
    #[serde(default = "default_resolution")]
    pub stacks: u32,
    /// Indexed in [`BoxFace::ALL`] order
    #[serde(default)]
    pub faces: [FaceSpec; 6],
}

impl Default for BoxShape {
    fn default() -> Self {
        Self {
            slices: default_resolution(),
            stacks: default_resolution(),
            faces: Default::default(),
        }
    }
}

impl BoxShape {
    pub fn new(slices: u32, stacks: u32) -> Self {
        Self {
            slices,
            stacks,
            ..Self::default()
        }
    }

    /// Replace one face
    pub fn with_face(mut self, face: BoxFace, spec: FaceSpec) -> Self {
        self.faces[face.index()] = spec;
        self
    }

    /// Give every face the same material
    pub fn with_material(mut self, material: &str) -> Self {
        for face in &mut self.faces {
            face.material = material.to_string();
        }
        self
    }

    pub fn face(&self, face: BoxFace) -> &FaceSpec {
        &self.faces[face.index()]
    }

    /// Build the mesh, one material segment per enabled face in
    /// [`BoxFace::ALL`] order
    pub fn build(&self, catalog: &MaterialCatalog) -> Result<Mesh> {
        let mut parts = Vec::with_capacity(6);
        for face in BoxFace::ALL {
            let spec = self.face(face);
            if !spec.enabled {
                continue;
            }
            let id = catalog.id(&spec.material)?;
            let patch = match spec.hole {
                Some(separation) => manifold::middle_hole_surface(self.slices, self.stacks, separation)?,
                None => manifold::surface(self.slices, self.stacks, |u, v| Vec3::new(u, v, 0.0))?,
            };
            let outward = face.outward();
            let placed = patch
                .transform(&face.placement())?
                .orient_towards(outward)
                .with_normal(outward);
            parts.push(MaterialPart::new(id, catalog.paint(&placed, &spec.material)?));
        }

        let mesh = Mesh::recombine(parts)?.transform(&Mat4::from_translation(Vec3::splat(-0.5)))?;
        tracing::debug!(
            faces = mesh.material_segments().map_or(0, <[_]>::len),
            vertices = mesh.vertex_count(),
            "built box shape"
        );
        Ok(mesh)
    }
}
