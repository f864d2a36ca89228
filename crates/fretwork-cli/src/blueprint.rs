//! JSON scene descriptions
//!
//! ```json
//! {
//!   "materials": { "materials": [{ "name": "maple", "id": 1, "color": [0.9, 0.8, 0.6] }] },
//!   "camera": { "center": [0, 0, 10], "extent": [6, 6] },
//!   "solids": [{
//!     "name": "plate",
//!     "shape": { "csg": { "op": "difference",
//!       "left":  { "op": "box", "material": "maple", "transform": [{ "scale": [4, 4, 0.5] }] },
//!       "right": { "op": "cylinder", "transform": [{ "scale": [1, 1, 2] }] } } },
//!     "transform": [{ "rotate_z": 0.3 }]
//!   }]
//! }
//! ```

use anyhow::{Context, Result, bail};
use fretwork_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One step of a transform list, applied in list order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStep {
    Translate(Vec3),
    Scale(Vec3),
    RotateX(f32),
    RotateY(f32),
    RotateZ(f32),
    Rotate { axis: Vec3, angle: f32 },
}

impl TransformStep {
    pub fn matrix(&self) -> Result<Mat4> {
        Ok(match *self {
            TransformStep::Translate(offset) => Mat4::from_translation(offset),
            TransformStep::Scale(factors) => Mat4::from_scale(factors),
            TransformStep::RotateX(angle) => Mat4::from_rotation_x(angle),
            TransformStep::RotateY(angle) => Mat4::from_rotation_y(angle),
            TransformStep::RotateZ(angle) => Mat4::from_rotation_z(angle),
            TransformStep::Rotate { axis, angle } => {
                let Some(axis) = axis.try_normalize() else {
                    bail!("rotation axis {axis:?} has no direction");
                };
                Mat4::from_axis_angle(axis, angle)
            }
        })
    }
}

fn compose_steps(steps: &[TransformStep]) -> Result<Mat4> {
    let matrices = steps.iter().map(TransformStep::matrix).collect::<Result<Vec<_>>>()?;
    Ok(compose(&matrices))
}

/// A CSG tree as written in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NodeBlueprint {
    Box {
        #[serde(default)]
        material: Option<String>,
        #[serde(default)]
        transform: Vec<TransformStep>,
    },
    Cylinder {
        #[serde(default)]
        material: Option<String>,
        #[serde(default)]
        transform: Vec<TransformStep>,
    },
    Union {
        left: Box<NodeBlueprint>,
        right: Box<NodeBlueprint>,
    },
    Intersection {
        left: Box<NodeBlueprint>,
        right: Box<NodeBlueprint>,
    },
    Difference {
        left: Box<NodeBlueprint>,
        right: Box<NodeBlueprint>,
    },
}

impl NodeBlueprint {
    pub fn build(&self, catalog: &MaterialCatalog) -> Result<CsgNode> {
        let leaf = |geometry: &dyn Fn(Mat4, Option<MaterialId>) -> fretwork_core::Result<CsgNode>,
                    material: &Option<String>,
                    steps: &[TransformStep]|
         -> Result<CsgNode> {
            let id = material.as_deref().map(|name| catalog.id(name)).transpose()?;
            Ok(geometry(compose_steps(steps)?, id)?)
        };

        match self {
            NodeBlueprint::Box { material, transform } => leaf(
                &|m, id| match id {
                    Some(id) => CsgNode::leaf_with_material(unit_box(), m, id),
                    None => CsgNode::leaf(unit_box(), m),
                },
                material,
                transform,
            ),
            NodeBlueprint::Cylinder { material, transform } => leaf(
                &|m, id| match id {
                    Some(id) => CsgNode::leaf_with_material(unit_cylinder(), m, id),
                    None => CsgNode::leaf(unit_cylinder(), m),
                },
                material,
                transform,
            ),
            NodeBlueprint::Union { left, right } => Ok(left.build(catalog)? | right.build(catalog)?),
            NodeBlueprint::Intersection { left, right } => {
                Ok(left.build(catalog)? & right.build(catalog)?)
            }
            NodeBlueprint::Difference { left, right } => Ok(left.build(catalog)? - right.build(catalog)?),
        }
    }
}

/// Geometry of a solid: a ray-queried CSG tree or a generated mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeBlueprint {
    Csg(NodeBlueprint),
    BoxShape(BoxShape),
    CylinderShape(CylinderShape),
}

/// A named, placed shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidBlueprint {
    pub name: String,
    pub shape: ShapeBlueprint,
    /// Fallback material for surfaces that carry none
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub transform: Vec<TransformStep>,
}

/// Orthographic view used by `probe`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraBlueprint {
    /// Centre of the image plane
    pub center: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    /// World-space width and height covered by the image
    pub extent: Vec2,
}

impl Default for CameraBlueprint {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            extent: Vec2::splat(4.0),
        }
    }
}

/// A whole scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBlueprint {
    #[serde(default)]
    pub materials: MaterialCatalog,
    #[serde(default)]
    pub camera: CameraBlueprint,
    pub solids: Vec<SolidBlueprint>,
}

/// A built solid, ready to be probed
pub struct NamedEntry {
    pub name: String,
    pub entry: SceneEntry,
}

impl SceneBlueprint {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        let scene: SceneBlueprint = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse scene {}", path.display()))?;
        tracing::info!(path = %path.display(), solids = scene.solids.len(), "loaded scene");
        Ok(scene)
    }

    pub fn build(&self) -> Result<Vec<NamedEntry>> {
        self.solids
            .iter()
            .map(|solid| {
                let shape = match &solid.shape {
                    ShapeBlueprint::Csg(node) => SceneShape::Csg(node.build(&self.materials)?),
                    ShapeBlueprint::BoxShape(shape) => SceneShape::Mesh(shape.build(&self.materials)?),
                    ShapeBlueprint::CylinderShape(shape) => {
                        SceneShape::Mesh(shape.build(&self.materials)?)
                    }
                };
                let mut entry = SceneEntry::new(shape, compose_steps(&solid.transform)?)
                    .with_context(|| format!("cannot place solid {:?}", solid.name))?;
                if let Some(name) = &solid.material {
                    entry = entry.with_material(self.materials.id(name)?);
                }
                Ok(NamedEntry {
                    name: solid.name.clone(),
                    entry,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE: &str = r#"{
        "materials": { "materials": [
            { "name": "default", "id": 0, "color": [0.8, 0.8, 0.8] },
            { "name": "maple", "id": 1, "color": [0.9, 0.8, 0.6] }
        ] },
        "solids": [{
            "name": "plate",
            "shape": { "csg": { "op": "difference",
                "left": { "op": "box", "material": "maple", "transform": [{ "scale": [4, 4, 0.5] }] },
                "right": { "op": "cylinder", "transform": [{ "scale": [1, 1, 2] }] } } },
            "transform": [{ "translate": [0, 0, 1] }]
        }, {
            "name": "cup",
            "shape": { "cylinder_shape": { "segments": 12, "thickness": 0.1, "top": false } },
            "transform": [{ "translate": [5, 0, 0] }]
        }]
    }"#;

    #[test]
    fn parses_and_builds() {
        let scene: SceneBlueprint = serde_json::from_str(PLATE).unwrap();
        assert_eq!(scene.camera, CameraBlueprint::default());
        let entries = scene.build().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[1].entry.shape, SceneShape::Mesh(_)));

        let down = Ray::new(Vec3::new(1.5, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        let hit = entries[0].entry.raycast(&down).unwrap();
        assert!((hit.position.z - 1.25).abs() < 1e-5);
        assert_eq!(hit.material, Some(MaterialId(1)));

        let through_hole = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert!(entries[0].entry.raycast(&through_hole).is_none());
    }

    #[test]
    fn unknown_material_fails() {
        let json = r#"{ "solids": [{ "name": "x", "shape": { "csg": { "op": "box", "material": "teak" } } }] }"#;
        let scene: SceneBlueprint = serde_json::from_str(json).unwrap();
        assert!(scene.build().is_err());
    }

    #[test]
    fn transform_steps_apply_in_order() {
        let steps = [
            TransformStep::Scale(Vec3::splat(2.0)),
            TransformStep::Translate(Vec3::X),
        ];
        let m = compose_steps(&steps).unwrap();
        assert_eq!(m.transform_point3(Vec3::X), Vec3::new(3.0, 0.0, 0.0));
        assert!(TransformStep::Rotate { axis: Vec3::ZERO, angle: 1.0 }.matrix().is_err());
    }
}
