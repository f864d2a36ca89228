//! Fretwork CLI - build parametric surfaces and probe CSG scenes

mod blueprint;
mod probe;

use anyhow::{Result, bail};
use blueprint::{CameraBlueprint, NamedEntry, SceneBlueprint};
use clap::{Parser, Subcommand, ValueEnum};
use fretwork_core::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fretwork")]
#[command(about = "Procedural solid modeling: parametric surfaces and ray-queried CSG", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a parametric surface and print its statistics
    Surface {
        /// Surface to generate
        #[arg(value_enum)]
        kind: SurfaceKind,

        /// Divisions along u
        #[arg(long, default_value = "16")]
        slices: u32,

        /// Divisions along v
        #[arg(long, default_value = "8")]
        stacks: u32,

        /// Merge vertices closer than this distance
        #[arg(long)]
        weld: Option<f32>,

        /// Convert the result to another topology
        #[arg(long, value_enum, default_value = "triangles")]
        topology: TopologyArg,

        /// Margin on every side of the `hole` surface
        #[arg(long, default_value = "0.2")]
        margin: f32,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a JSON scene with an orthographic grid of rays
    Probe {
        /// Scene description
        scene: PathBuf,

        /// Grid columns
        #[arg(short = 'W', long, default_value = "64")]
        width: usize,

        /// Grid rows
        #[arg(short = 'H', long, default_value = "32")]
        height: usize,
    },

    /// Probe a built-in headstock: a slab with two slots and six tuner holes
    Demo {
        /// Grid columns
        #[arg(short = 'W', long, default_value = "48")]
        width: usize,

        /// Grid rows
        #[arg(short = 'H', long, default_value = "32")]
        height: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
enum SurfaceKind {
    /// Flat unit square
    Plane,
    /// Sine-rippled sheet
    Wave,
    /// Closed tube swept around Z
    Tube,
    /// Half a tube
    HalfPipe,
    /// Cone lofted between two circles
    Loft,
    /// Arc pushed along Z
    Extrude,
    /// Twisted ribbon built from a profile and a sweep function
    Twist,
    /// Unit square with a rectangular hole in the middle
    Hole,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TopologyArg {
    Points,
    Lines,
    Triangles,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Points => Topology::Points,
            TopologyArg::Lines => Topology::Lines,
            TopologyArg::Triangles => Topology::Triangles,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Surface {
            kind,
            slices,
            stacks,
            weld,
            topology,
            margin,
            json,
        } => run_surface(kind, slices, stacks, weld, topology.into(), margin, json)?,
        Commands::Probe {
            scene,
            width,
            height,
        } => run_probe(&scene, width, height)?,
        Commands::Demo { width, height } => run_demo(width, height)?,
    }

    Ok(())
}

fn circle(radius: f32, z: f32) -> impl Fn(f32) -> Vec3 {
    move |u| {
        let a = u * TAU;
        Vec3::new(radius * a.cos(), radius * a.sin(), z)
    }
}

fn build_surface(kind: SurfaceKind, slices: u32, stacks: u32, margin: f32) -> Result<Mesh> {
    let mesh = match kind {
        SurfaceKind::Plane => manifold::surface(slices, stacks, |u, v| Vec3::new(u, v, 0.0))?,
        SurfaceKind::Wave => manifold::surface(slices, stacks, |u, v| {
            Vec3::new(u, v, 0.1 * (u * TAU).sin() * (v * PI).sin())
        })?,
        SurfaceKind::Tube => {
            manifold::revolution(stacks, slices, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, TAU)?
        }
        SurfaceKind::HalfPipe => {
            manifold::revolution(stacks, slices, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, PI)?
        }
        SurfaceKind::Loft => manifold::lofted(slices, stacks, circle(1.0, 0.0), circle(0.25, 1.0))?,
        SurfaceKind::Extrude => manifold::extrude(
            slices,
            stacks,
            |u| {
                let a = u * PI;
                Vec3::new(a.cos(), a.sin(), 0.0)
            },
            Vec3::Z * 2.0,
        )?,
        SurfaceKind::Twist => manifold::generative(
            slices,
            stacks,
            |u| Vec3::new(u - 0.5, 0.0, 0.0),
            |p, v| Quat::from_rotation_z(v * PI) * p + Vec3::Z * v,
        )?,
        SurfaceKind::Hole => manifold::middle_hole_surface(slices, stacks, Separation::uniform(margin))?,
    };
    Ok(mesh)
}

#[derive(Serialize)]
struct SurfaceStats {
    kind: SurfaceKind,
    topology: Topology,
    vertices: usize,
    indices: usize,
    primitives: usize,
    /// Vertex count before welding
    #[serde(skip_serializing_if = "Option::is_none")]
    welded_from: Option<usize>,
    bounds: Option<Aabb>,
}

fn run_surface(
    kind: SurfaceKind,
    slices: u32,
    stacks: u32,
    weld: Option<f32>,
    topology: Topology,
    margin: f32,
    json: bool,
) -> Result<()> {
    let mut mesh = build_surface(kind, slices, stacks, margin)?;
    let mut welded_from = None;
    if let Some(epsilon) = weld {
        welded_from = Some(mesh.vertex_count());
        mesh = mesh.weld(epsilon)?;
    }
    let mesh = mesh.convert_to(topology)?;

    let stats = SurfaceStats {
        kind,
        topology: mesh.topology(),
        vertices: mesh.vertex_count(),
        indices: mesh.index_count(),
        primitives: mesh.primitive_count(),
        welded_from,
        bounds: mesh.bounds(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{kind:?} surface ({slices}×{stacks})");
    println!("  topology:   {:?}", stats.topology);
    println!("  vertices:   {}", stats.vertices);
    if let Some(before) = stats.welded_from {
        println!("  welded:     {before} -> {}", stats.vertices);
    }
    println!("  indices:    {}", stats.indices);
    println!("  primitives: {}", stats.primitives);
    if let Some(bounds) = stats.bounds {
        println!("  bounds:     {:?} .. {:?}", bounds.min, bounds.max);
    }
    Ok(())
}

fn run_probe(path: &std::path::Path, width: usize, height: usize) -> Result<()> {
    let scene = SceneBlueprint::load(path)?;
    let entries = scene.build()?;
    if entries.is_empty() {
        bail!("scene {} has no solids", path.display());
    }
    print_probe(&entries, &scene.camera, &scene.materials, width, height)
}

fn print_probe(
    entries: &[NamedEntry],
    camera: &CameraBlueprint,
    catalog: &MaterialCatalog,
    width: usize,
    height: usize,
) -> Result<()> {
    let report = probe::probe(entries, camera, width, height)?;
    print!("{}", report.render());
    println!();
    print!("{}", report.summary(entries, catalog));
    Ok(())
}

/// Slab with two string slots and three tuner holes beside each slot
fn headstock(catalog: &MaterialCatalog) -> Result<CsgNode> {
    let maple = catalog.id("maple")?;
    let slab = CsgNode::leaf_with_material(
        unit_box(),
        Mat4::from_scale(Vec3::new(2.0, 4.0, 0.4)),
        maple,
    )?;

    let slot = CsgNode::leaf(unit_box(), Mat4::from_scale(Vec3::new(0.25, 2.6, 1.0)))?;
    let slots = slot.transformed(Mat4::from_translation(Vec3::X * -0.4))?
        | slot.transformed(Mat4::from_translation(Vec3::X * 0.4))?;

    let peg = CsgNode::leaf(unit_cylinder(), Mat4::from_scale(Vec3::new(0.2, 0.2, 1.0)))?;
    let mut pegs = CsgNode::empty();
    for side in [-0.8, 0.8] {
        for y in [-1.0, 0.0, 1.0] {
            pegs = pegs | peg.transformed(Mat4::from_translation(Vec3::new(side, y, 0.0)))?;
        }
    }

    Ok(slab - slots - pegs)
}

fn run_demo(width: usize, height: usize) -> Result<()> {
    let catalog = MaterialCatalog::default()
        .insert(MaterialSpec::new("maple", MaterialId(1)).with_color(Vec3::new(0.9, 0.8, 0.6)))?;
    let solid = headstock(&catalog)?;
    println!(
        "headstock: {} leaves, bounds {:?}",
        solid.leaf_count(),
        solid.bounds()
    );

    let entries = vec![NamedEntry {
        name: "headstock".to_string(),
        entry: SceneEntry::new(solid, Mat4::IDENTITY)?,
    }];
    let camera = CameraBlueprint {
        extent: Vec2::new(3.0, 5.0),
        ..CameraBlueprint::default()
    };
    print_probe(&entries, &camera, &catalog, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_surface_kind_builds() {
        for kind in SurfaceKind::value_variants() {
            let mesh = build_surface(*kind, 6, 4, 0.2).unwrap();
            assert!(mesh.triangle_count() > 0, "{kind:?}");
        }
    }

    #[test]
    fn headstock_has_slots_and_holes() {
        let catalog = MaterialCatalog::default()
            .insert(MaterialSpec::new("maple", MaterialId(1)))
            .unwrap();
        let solid = headstock(&catalog).unwrap();
        assert_eq!(solid.leaf_count(), 9);

        let down = |x: f32, y: f32| Ray::new(Vec3::new(x, y, 5.0), Vec3::NEG_Z).unwrap();
        assert!(solid.raycast(&down(0.4, 0.0)).is_none(), "slot");
        assert!(solid.raycast(&down(0.8, 1.0)).is_none(), "tuner hole");
        let hit = solid.raycast(&down(0.0, 0.0)).unwrap();
        assert_eq!(hit.material, Some(MaterialId(1)));
        assert!((hit.position.z - 0.2).abs() < 1e-5);
    }
}
