//! Unit patch with an opening in the middle
//!
//! The opening is carved by projecting grid samples that fall inside a circle
//! onto its rim. Two mirrored half patches, each bitten by its own circle,
//! meet along the middle row and leave a rounded opening between them. The
//! combined patch is stretched onto the inner rectangle given by the
//! [`Separation`] margins, and eight flat strips fill the margins.

use super::surface;
use crate::bounds::Aabb;
use crate::mesh::Mesh;
use crate::{Error, Result};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Distances from the patch borders to the opening, as fractions of the unit
/// square
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Separation {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Separation {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Same margin on all four sides
    pub fn uniform(margin: f32) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// Every margin in `[0, 1)` and some room left for the opening on both axes
    pub fn validate(&self) -> Result<()> {
        let margins = [
            ("left", self.left),
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
        ];
        for (side, m) in margins {
            if !(0.0..1.0).contains(&m) {
                return Err(Error::InvalidParameter(format!(
                    "{side} separation {m} is outside [0, 1)"
                )));
            }
        }
        if self.left + self.right >= 1.0 {
            return Err(Error::InvalidParameter(format!(
                "left + right separation {} leaves no room for the opening",
                self.left + self.right
            )));
        }
        if self.top + self.bottom >= 1.0 {
            return Err(Error::InvalidParameter(format!(
                "top + bottom separation {} leaves no room for the opening",
                self.top + self.bottom
            )));
        }
        Ok(())
    }

    /// The rectangle the opening is fitted into
    pub fn inner(&self) -> Aabb {
        Aabb::new(
            Vec3::new(self.left, self.bottom, 0.0),
            Vec3::new(1.0 - self.right, 1.0 - self.top, 0.0),
        )
    }
}

const PIVOT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const RADIUS: f32 = 1.0;
/// Half patches are squashed towards their outer edge, so every grid sample
/// stays at least `1 - SQUASH` away from the pivot row
const SQUASH: f32 = 0.8;
const PIVOT_GUARD: f32 = 1e-5;
const PIVOT_NUDGE: f32 = 1e-3;

/// Push a point that lies inside the circle around [`PIVOT`] out to its rim.
///
/// A point sitting on the pivot has no direction to be pushed along, so it is
/// first nudged along `away`. Each half patch passes the direction pointing
/// away from the other half. The grids built here never reach the pivot
/// (see [`SQUASH`]); the nudge only guards other callers.
fn push_to_rim(p: Vec3, away: Vec3) -> Vec3 {
    let mut d = p - PIVOT;
    let distance = d.length();
    if distance > RADIUS {
        return p;
    }
    if distance <= PIVOT_GUARD {
        tracing::warn!(?p, "sample on the pivot, nudging before projection");
        d = p + PIVOT_NUDGE * away.normalize_or(Vec3::Y) - PIVOT;
    }
    PIVOT + d * (RADIUS / d.length())
}

/// Unit patch in the XY plane (z = 0, spanning `[0, 1]²`) with an opening
/// inside the `separation` margins.
///
/// The patch faces -Z, like a plain [`surface`] over `(u, v, 0)`.
pub fn middle_hole_surface(slices: u32, stacks: u32, separation: Separation) -> Result<Mesh> {
    if slices == 0 || stacks == 0 {
        return Err(Error::InvalidParameter(format!(
            "hole surface needs at least one slice and one stack, got {slices}×{stacks}"
        )));
    }
    separation.validate()?;

    let half_slices = (slices / 2).max(1);
    let half_stacks = (stacks / 2).max(1);
    let lift = Vec3::Y * (1.0 - SQUASH);

    let lower = surface(half_slices, half_stacks, |u, v| {
        push_to_rim(Vec3::new(2.0 * u, -1.0 + SQUASH * v, 0.0), Vec3::NEG_Y)
    })?
    .transform(&glam::Mat4::from_translation(lift))?;

    // Mirrored sampling reverses the grid's v direction, so it faces +Z
    let upper = surface(half_slices, half_stacks, |u, v| {
        push_to_rim(Vec3::new(2.0 * u, 1.0 - SQUASH * v, 0.0), Vec3::Y)
    })?
    .transform(&glam::Mat4::from_translation(-lift))?
    .flip_winding();

    let unit_square = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
    let inner = separation.inner();
    let rim = (lower + upper)
        .stretch_to(&unit_square)?
        .stretch_to(&inner)?;

    let (lo, hi) = (inner.min.truncate(), inner.max.truncate());
    let columns = [(0.0, lo.x), (lo.x, hi.x), (hi.x, 1.0)];
    let rows = [(0.0, lo.y), (lo.y, hi.y), (hi.y, 1.0)];

    let mut patch = rim;
    for (row, &(y0, y1)) in rows.iter().enumerate() {
        for (column, &(x0, x1)) in columns.iter().enumerate() {
            if row == 1 && column == 1 {
                continue;
            }
            let (width, height) = (x1 - x0, y1 - y0);
            if width <= 0.0 || height <= 0.0 {
                continue;
            }
            let resolution = |count: u32, span: f32| ((count as f32 * span).ceil() as u32).max(1);
            let origin = Vec2::new(x0, y0);
            let strip = surface(resolution(slices, width), resolution(stacks, height), |u, v| {
                (origin + Vec2::new(u * width, v * height)).extend(0.0)
            })?;
            patch = patch + strip;
        }
    }

    tracing::debug!(
        slices,
        stacks,
        ?separation,
        vertices = patch.vertex_count(),
        triangles = patch.triangle_count(),
        "built hole surface"
    );
    Ok(patch)
}
