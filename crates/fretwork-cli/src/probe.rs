//! Orthographic ray grids over a set of placed solids

use crate::blueprint::{CameraBlueprint, NamedEntry};
use anyhow::{Result, bail};
use fretwork_core::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Shading ramp from grazing to head-on
const RAMP: &[u8] = b"-=+*#%@";
const MISS: char = '.';
const BACK_FACE: char = 'x';

/// Nearest hit for one pixel
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// Index of the solid that was hit
    pub solid: usize,
    pub hit: SceneHit,
}

/// Result of probing a scene with a `width × height` grid
#[derive(Debug)]
pub struct ProbeReport {
    pub width: usize,
    pub height: usize,
    pub direction: Vec3,
    /// Row-major, top row first
    pub samples: Vec<Option<Sample>>,
}

/// Cast one ray per pixel through the camera's image plane
pub fn probe(
    entries: &[NamedEntry],
    camera: &CameraBlueprint,
    width: usize,
    height: usize,
) -> Result<ProbeReport> {
    if width == 0 || height == 0 {
        bail!("probe grid must be at least 1×1, got {width}×{height}");
    }
    let Some(direction) = camera.direction.try_normalize() else {
        bail!("camera direction {:?} has no length", camera.direction);
    };
    let Some(right) = direction.cross(camera.up).try_normalize() else {
        bail!("camera up {:?} is parallel to its direction", camera.up);
    };
    let up = right.cross(direction);

    let rows = (0..height)
        .into_par_iter()
        .map(|row| {
            let y = (0.5 - (row as f32 + 0.5) / height as f32) * camera.extent.y;
            (0..width)
                .map(|col| {
                    let x = ((col as f32 + 0.5) / width as f32 - 0.5) * camera.extent.x;
                    let ray = Ray::new(camera.center + right * x + up * y, direction)?;
                    Ok(nearest(entries, &ray))
                })
                .collect::<fretwork_core::Result<Vec<_>>>()
        })
        .collect::<fretwork_core::Result<Vec<_>>>()?;

    let report = ProbeReport {
        width,
        height,
        direction,
        samples: rows.into_iter().flatten().collect(),
    };
    tracing::debug!(width, height, hits = report.hit_count(), "probed scene");
    Ok(report)
}

fn nearest(entries: &[NamedEntry], ray: &Ray) -> Option<Sample> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(solid, named)| named.entry.raycast(ray).map(|hit| Sample { solid, hit }))
        .min_by(|a, b| a.hit.distance.total_cmp(&b.hit.distance))
}

impl ProbeReport {
    pub fn hit_count(&self) -> usize {
        self.samples.iter().flatten().count()
    }

    /// Hit count per solid index
    pub fn hits_per_solid(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for sample in self.samples.iter().flatten() {
            *counts.entry(sample.solid).or_insert(0) += 1;
        }
        counts
    }

    /// Hit count per surface material
    pub fn hits_per_material(&self) -> BTreeMap<Option<MaterialId>, usize> {
        let mut counts = BTreeMap::new();
        for sample in self.samples.iter().flatten() {
            *counts.entry(sample.hit.material).or_insert(0) += 1;
        }
        counts
    }

    /// Nearest and farthest hit distances
    pub fn depth_range(&self) -> Option<(f32, f32)> {
        self.samples.iter().flatten().fold(None, |range, s| {
            let d = s.hit.distance;
            Some(range.map_or((d, d), |(near, far): (f32, f32)| (near.min(d), far.max(d))))
        })
    }

    /// ASCII silhouette shaded by how squarely each surface faces the camera
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.samples.chunks(self.width) {
            for sample in row {
                out.push(match sample {
                    None => MISS,
                    Some(s) if !s.hit.front_face => BACK_FACE,
                    Some(s) => {
                        let facing = (-self.direction).dot(s.hit.normal).clamp(0.0, 1.0);
                        let level = (facing * (RAMP.len() - 1) as f32).round() as usize;
                        RAMP[level.min(RAMP.len() - 1)] as char
                    }
                });
            }
            out.push('\n');
        }
        out
    }

    /// Hit statistics, naming solids and materials
    pub fn summary(&self, entries: &[NamedEntry], catalog: &MaterialCatalog) -> String {
        let total = self.samples.len();
        let hits = self.hit_count();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{hits}/{total} rays hit ({:.1}%)",
            100.0 * hits as f32 / total as f32
        );
        if let Some((near, far)) = self.depth_range() {
            let _ = writeln!(out, "depth: {near:.3} .. {far:.3}");
        }
        for (solid, count) in self.hits_per_solid() {
            let name = entries.get(solid).map_or("?", |e| e.name.as_str());
            let _ = writeln!(out, "  solid {name}: {count}");
        }
        for (material, count) in self.hits_per_material() {
            let name = material
                .and_then(|id| catalog.by_id(id))
                .map_or_else(|| "(none)".to_string(), |m| m.name.clone());
            let _ = writeln!(out, "  material {name}: {count}");
        }
        out
    }
}
