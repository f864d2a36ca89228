//! Unit cylinder built from revolutions

use super::default_material;
use crate::manifold;
use crate::material::MaterialCatalog;
use crate::mesh::{MaterialPart, Mesh};
use crate::{Error, Result};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

const RADIUS: f32 = 0.5;

fn default_segments() -> u32 {
    24
}

fn default_rings() -> u32 {
    1
}

fn full_turn() -> f32 {
    TAU
}

fn yes() -> bool {
    true
}

/// Z-aligned cylinder of radius 0.5 spanning `z ∈ [-0.5, 0.5]`.
///
/// With a `thickness` the cylinder becomes a tube: an inner wall faces the
/// axis and the caps become rings. A sweep `angle` below a full turn cuts a
/// wedge and closes it with two flat end walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderShape {
    /// Divisions around the axis
    #[serde(default = "default_segments")]
    pub segments: u32,
    /// Divisions along the axis
    #[serde(default = "default_rings")]
    pub rings: u32,
    #[serde(default = "full_turn")]
    pub angle: f32,
    #[serde(default)]
    pub thickness: Option<f32>,
    #[serde(default = "yes")]
    pub top: bool,
    #[serde(default = "yes")]
    pub bottom: bool,
    #[serde(default = "default_material")]
    pub outer_material: String,
    #[serde(default = "default_material")]
    pub inner_material: String,
    #[serde(default = "default_material")]
    pub cap_material: String,
}

impl Default for CylinderShape {
    fn default() -> Self {
        Self {
            segments: default_segments(),
            rings: default_rings(),
            angle: full_turn(),
            thickness: None,
            top: true,
            bottom: true,
            outer_material: default_material(),
            inner_material: default_material(),
            cap_material: default_material(),
        }
    }
}

impl CylinderShape {
    pub fn new(segments: u32) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn with_caps(mut self, top: bool, bottom: bool) -> Self {
        self.top = top;
        self.bottom = bottom;
        self
    }

    /// Same material on every part
    pub fn with_material(mut self, material: &str) -> Self {
        self.outer_material = material.to_string();
        self.inner_material = material.to_string();
        self.cap_material = material.to_string();
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.angle > 0.0 && self.angle <= TAU) {
            return Err(Error::InvalidParameter(format!(
                "cylinder sweep {} is outside (0, 2π]",
                self.angle
            )));
        }
        if let Some(t) = self.thickness
            && !(t > 0.0 && t < RADIUS)
        {
            return Err(Error::InvalidParameter(format!(
                "cylinder thickness {t} is outside (0, {RADIUS})"
            )));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        (self.angle - TAU).abs() <= 1e-6
    }

    /// Wall at `radius`, facing away from the axis
    fn wall(&self, radius: f32) -> Result<Mesh> {
        let wall = manifold::revolution(
            self.rings,
            self.segments,
            |u| Vec3::new(radius, 0.0, u - 0.5),
            Vec3::Z,
            self.angle,
        )?;
        Ok(wall.map_vertices(|v| {
            let radial = Vec3::new(v.position.x, v.position.y, 0.0).normalize_or_zero();
            v.with_normal(radial)
        }))
    }

    /// Flat ring or disc at height `z` between `inner` and the rim
    fn cap(&self, inner: f32, z: f32) -> Result<Mesh> {
        let facing = Vec3::Z * z.signum();
        let cap = manifold::revolution(
            1,
            self.segments,
            |u| Vec3::new(inner + u * (RADIUS - inner), 0.0, z),
            Vec3::Z,
            self.angle,
        )?;
        Ok(cap.orient_towards(facing).with_normal(facing))
    }

    /// Flat wall closing the wedge at angle `at`
    fn end(&self, inner: f32, at: f32, facing: Vec3) -> Result<Mesh> {
        let turn = Quat::from_rotation_z(at);
        let end = manifold::surface(1, self.rings, |u, v| {
            turn * Vec3::new(inner + u * (RADIUS - inner), 0.0, v - 0.5)
        })?;
        Ok(end.orient_towards(facing).with_normal(facing))
    }

    /// Build the mesh. Material segments come in the order outer wall, inner
    /// wall, bottom, top, wedge ends.
    pub fn build(&self, catalog: &MaterialCatalog) -> Result<Mesh> {
        self.validate()?;
        let inner = self.thickness.map_or(0.0, |t| RADIUS - t);
        let paint = |mesh: Mesh, material: &str| -> Result<MaterialPart> {
            Ok(MaterialPart::new(catalog.id(material)?, catalog.paint(&mesh, material)?))
        };

        let mut parts = vec![paint(self.wall(RADIUS)?, &self.outer_material)?];
        if self.thickness.is_some() {
            parts.push(paint(self.wall(inner)?.flip_winding(), &self.inner_material)?);
        }
        if self.bottom {
            parts.push(paint(self.cap(inner, -0.5)?, &self.cap_material)?);
        }
        if self.top {
            parts.push(paint(self.cap(inner, 0.5)?, &self.cap_material)?);
        }
        if !self.is_closed() {
            let start = self.end(inner, 0.0, Vec3::NEG_Y)?;
            let stop_facing = Quat::from_rotation_z(self.angle) * Vec3::Y;
            let stop = self.end(inner, self.angle, stop_facing)?;
            parts.push(paint(start, &self.cap_material)?);
            parts.push(paint(stop, &self.cap_material)?);
        }

        let mesh = Mesh::recombine(parts)?;
        tracing::debug!(
            segments = self.segments,
            angle = self.angle,
            tube = self.thickness.is_some(),
            vertices = mesh.vertex_count(),
            "built cylinder shape"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::Ray;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn build(shape: CylinderShape) -> Mesh {
        shape.build(&MaterialCatalog::default()).unwrap()
    }

    #[test]
    fn solid_cylinder_fills_unit_cube() {
        let mesh = build(CylinderShape::new(16));
        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.min.z, -0.5);
        assert_relative_eq!(bounds.max.z, 0.5);
        assert_relative_eq!(bounds.max.x, 0.5, epsilon = 1e-6);
        assert_eq!(mesh.material_segments().unwrap().len(), 3);
    }

    #[test]
    fn walls_and_caps_face_out() {
        let mesh = build(CylinderShape::new(16));
        let side = Ray::new(Vec3::new(-3.0, 0.01, 0.1), Vec3::X).unwrap();
        let hit = mesh.raycast(&side).unwrap();
        assert!(hit.front_face);
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-2);

        let top = Ray::new(Vec3::new(0.1, 0.2, 3.0), Vec3::NEG_Z).unwrap();
        let hit = mesh.raycast(&top).unwrap();
        assert!(hit.front_face);
        assert_relative_eq!(hit.position.z, 0.5, epsilon = 1e-6);

        let bottom = Ray::new(Vec3::new(0.1, 0.2, -3.0), Vec3::Z).unwrap();
        assert!(mesh.raycast(&bottom).unwrap().front_face);
    }

    #[test]
    fn tube_has_open_core() {
        let mesh = build(CylinderShape::new(16).with_thickness(0.1));
        assert_eq!(mesh.material_segments().unwrap().len(), 4);

        let down_core = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z).unwrap();
        assert!(mesh.raycast(&down_core).is_none());

        // From the axis outwards the first surface is the inner wall, facing us
        let outwards = Ray::new(Vec3::new(0.0, 0.0, 0.1), Vec3::new(1.0, 0.03, 0.0)).unwrap();
        let hit = mesh.raycast(&outwards).unwrap();
        assert!(hit.front_face);
        assert!(hit.distance < 0.45);
    }

    #[test]
    fn half_pipe_is_closed_by_end_walls() {
        let mesh = build(CylinderShape::new(12).with_angle(PI));
        assert_eq!(mesh.material_segments().unwrap().len(), 5);
        let bounds = mesh.bounds().unwrap();
        assert!(bounds.min.y > -1e-5);

        let into_cut = Ray::new(Vec3::new(0.1, -3.0, 0.0), Vec3::Y).unwrap();
        let hit = mesh.raycast(&into_cut).unwrap();
        assert!(hit.front_face);
        assert_relative_eq!(hit.position.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn inner_normals_point_at_axis() {
        let mesh = build(CylinderShape::new(8).with_thickness(0.2).with_caps(false, false));
        let parts = mesh.material_decompose().unwrap();
        let inner = &parts[1].mesh;
        for v in inner.vertices() {
            let n = v.normal.unwrap();
            assert!(n.dot(v.position.truncate().extend(0.0)) < 0.0);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let catalog = MaterialCatalog::default();
        assert!(CylinderShape::new(8).with_angle(0.0).build(&catalog).is_err());
        assert!(CylinderShape::new(8).with_angle(7.0).build(&catalog).is_err());
        assert!(CylinderShape::new(8).with_thickness(0.5).build(&catalog).is_err());
        assert!(CylinderShape::new(0).build(&catalog).is_err());
        assert!(matches!(
            CylinderShape::new(8).with_material("brass").build(&catalog),
            Err(Error::UnknownMaterial(_))
        ));
    }
}
