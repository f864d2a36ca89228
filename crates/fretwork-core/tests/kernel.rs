//! Integration tests for the kernel's algebraic laws and ray queries

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use fretwork_core::prelude::*;

fn flat(u: f32, v: f32) -> Vec3 {
    Vec3::new(u, v, 0.0)
}

fn wavy(u: f32, v: f32) -> Vec3 {
    Vec3::new(u * 2.0, v, (u * TAU).sin() * 0.25)
}

#[test]
fn surface_vertex_and_index_counts() {
    for slices in 1..6 {
        for stacks in 1..6 {
            let mesh = manifold::surface(slices, stacks, wavy).expect("surface should build");
            assert_eq!(mesh.vertex_count(), ((slices + 1) * (stacks + 1)) as usize);
            assert_eq!(mesh.index_count(), (slices * stacks * 6) as usize);
            assert_eq!(mesh.topology(), Topology::Triangles);
        }
    }
}

#[test]
fn identity_transform_round_trips() {
    let mesh = manifold::surface(6, 4, wavy).unwrap();
    let same = mesh.transform(&Mat4::IDENTITY).unwrap();
    for (a, b) in mesh.vertices().iter().zip(same.vertices()) {
        assert_relative_eq!(a.position.distance(b.position), 0.0, epsilon = 1e-6);
    }
    assert_eq!(same.indices(), mesh.indices());
}

#[test]
fn apply_transforms_reads_left_to_right() {
    let mesh = manifold::surface(1, 1, flat).unwrap();
    // Scale first, then move: the far corner lands at (2+5, 2, 0)
    let moved = mesh
        .apply_transforms(&[
            Mat4::from_scale(Vec3::splat(2.0)),
            Mat4::from_translation(Vec3::X * 5.0),
        ])
        .unwrap();
    let bounds = moved.bounds().unwrap();
    assert_relative_eq!(bounds.max.x, 7.0);
    assert_relative_eq!(bounds.min.x, 5.0);
}

#[test]
fn projective_transform_divides_by_w() {
    let mesh = manifold::surface(1, 1, |u, v| Vec3::new(u, v, 1.0)).unwrap();
    // w' = 2 everywhere halves every coordinate
    let mut m = Mat4::IDENTITY;
    m.w_axis.w = 2.0;
    let halved = mesh.transform(&m).unwrap();
    assert_relative_eq!(halved.bounds().unwrap().max.z, 0.5);
    assert_eq!(mesh.bounds().unwrap().max.z, 1.0, "input left untouched");
}

#[test]
fn convert_to_same_topology_is_identity() {
    let mesh = manifold::surface(3, 2, wavy).unwrap();
    assert_eq!(mesh.convert_to(Topology::Triangles).unwrap(), mesh);

    let lines = mesh.convert_to(Topology::Lines).unwrap();
    assert_eq!(lines.index_count(), mesh.triangle_count() * 6);
    assert!(matches!(
        lines.convert_to(Topology::Triangles),
        Err(Error::UnsupportedConversion { .. })
    ));
    let points = mesh.convert_to(Topology::Points).unwrap();
    assert_eq!(points.index_count(), mesh.vertex_count());
    assert!(points.convert_to(Topology::Triangles).is_err());
}

#[test]
fn addition_sums_counts() {
    let shapes = [
        manifold::surface(2, 3, wavy).unwrap(),
        manifold::surface(1, 1, flat).unwrap(),
        Mesh::default(),
        manifold::revolution(5, 7, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, PI).unwrap(),
    ];
    for a in &shapes {
        for b in &shapes {
            let sum = a + b;
            assert_eq!(sum.vertex_count(), a.vertex_count() + b.vertex_count());
            assert_eq!(sum.index_count(), a.index_count() + b.index_count());
            assert!(sum.indices().iter().all(|&i| (i as usize) < sum.vertex_count()));
        }
    }
}

#[test]
fn weld_is_idempotent() {
    let closed = manifold::revolution(6, 12, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, TAU).unwrap();
    for epsilon in [1e-4, 1e-2, 0.3] {
        let once = closed.weld(epsilon).unwrap();
        let twice = once.weld(epsilon).unwrap();
        assert_eq!(twice, once);
    }
    // Exact duplicates always share a cell
    let doubled = (&closed + &closed).weld(1e-4).unwrap();
    assert_eq!(doubled.vertex_count(), closed.weld(1e-4).unwrap().vertex_count());
    assert_eq!(doubled.index_count(), closed.index_count() * 2);
}

fn box_at(x: f32) -> CsgNode {
    CsgNode::leaf(unit_box(), Mat4::from_translation(Vec3::X * x)).unwrap()
}

/// Rays from above, from the side and from oblique angles across both boxes
fn probe_rays() -> Vec<Ray> {
    let mut rays = Vec::new();
    for i in 0..=30 {
        let x = -1.0 + i as f32 * 0.1;
        rays.push(Ray::new(Vec3::new(x, 0.1, 5.0), Vec3::NEG_Z).unwrap());
        rays.push(Ray::new(Vec3::new(x, -5.0, 0.2), Vec3::Y).unwrap());
        rays.push(Ray::new(Vec3::new(x, 4.0, 4.0), Vec3::new(0.1, -1.0, -1.0)).unwrap());
    }
    rays.push(Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap());
    rays
}

#[test]
fn union_hits_either_box() {
    let node = box_at(0.0).union(box_at(2.0));
    let hit_a = node.raycast(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap());
    let hit_b = node.raycast(&Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z).unwrap());
    assert_eq!(hit_a.map(|h| h.leaf), Some(LeafId(0)));
    assert_eq!(hit_b.map(|h| h.leaf), Some(LeafId(1)));

    for ray in probe_rays() {
        let single = box_at(0.0).raycast(&ray).or(box_at(2.0).raycast(&ray));
        assert_eq!(node.raycast(&ray).is_some(), single.is_some(), "{ray:?}");
    }
}

#[test]
fn intersection_of_separated_boxes_is_empty() {
    let node = box_at(0.0).intersect(box_at(2.0));
    for ray in probe_rays() {
        assert!(node.raycast(&ray).is_none(), "{ray:?}");
    }
}

#[test]
fn difference_with_itself_is_empty() {
    let node = box_at(0.0).subtract(box_at(0.0));
    for ray in probe_rays() {
        assert!(node.raycast(&ray).is_none(), "{ray:?}");
    }
}

#[test]
fn difference_keeps_what_the_cutter_misses() {
    let cutter = CsgNode::leaf(
        unit_cylinder(),
        Mat4::from_scale(Vec3::new(0.5, 0.5, 2.0)),
    )
    .unwrap();
    let node = box_at(0.0) - cutter;

    // Down the drilled hole
    assert!(node.raycast(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap()).is_none());
    // Beside it
    let hit = node
        .raycast(&Ray::new(Vec3::new(0.4, 0.4, 5.0), Vec3::NEG_Z).unwrap())
        .unwrap();
    assert_relative_eq!(hit.position.z, 0.5, epsilon = 1e-5);
    // Sideways through the hole wall: enter box, exit into the hole
    let hit = node
        .raycast(&Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap())
        .unwrap();
    assert_relative_eq!(hit.position.x, -0.5, epsilon = 1e-5);
    let far = node
        .raycast_within(&Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap(), 4.6, f32::INFINITY)
        .unwrap();
    assert_relative_eq!(far.position.x, -0.25, epsilon = 1e-5);
    assert!(!far.front_face);
    assert_eq!(far.leaf, LeafId(1));
}

#[test]
fn full_revolution_bounding_box() {
    let mesh = manifold::revolution(8, 4, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, TAU).unwrap();
    let bounds = mesh.bounds().unwrap();
    assert!(bounds.min.abs_diff_eq(Vec3::new(-1.0, -1.0, 0.0), 1e-5), "{bounds:?}");
    assert!(bounds.max.abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), 1e-5), "{bounds:?}");
}

#[test]
fn hole_surface_is_open_in_the_middle() {
    let mesh = manifold::middle_hole_surface(20, 20, Separation::uniform(0.2)).unwrap();
    let normal = mesh.area_normal().normalize();

    let center = Ray::new(Vec3::new(0.5, 0.5, 0.0) + normal * 2.0, -normal).unwrap();
    assert!(mesh.raycast(&center).is_none());

    let corner = Ray::new(Vec3::new(0.07, 0.08, 0.0) + normal * 2.0, -normal).unwrap();
    assert!(mesh.raycast(&corner).is_some());
}

#[test]
fn hole_surface_rejects_margins_that_meet() {
    let result = manifold::middle_hole_surface(20, 20, Separation::new(0.5, 0.2, 0.5, 0.2));
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn decompose_then_recombine() {
    let catalog = MaterialCatalog::default()
        .insert(MaterialSpec::new("ebony", MaterialId(1)))
        .unwrap();
    let shape = BoxShape::new(2, 2)
        .with_face(BoxFace::PosZ, FaceSpec::solid("ebony"))
        .with_face(BoxFace::NegZ, FaceSpec::solid("ebony"));
    let mesh = shape.build(&catalog).unwrap();

    let parts = mesh.material_decompose().unwrap();
    assert_eq!(parts.len(), 6);
    assert_eq!(parts.iter().filter(|p| p.material == MaterialId(1)).count(), 2);
    for part in &parts {
        assert!(part.mesh.indices().iter().all(|&i| (i as usize) < part.mesh.vertex_count()));
    }

    let again = Mesh::recombine(parts).unwrap();
    assert_eq!(again.vertex_count(), mesh.vertex_count());
    assert_eq!(again.material_segments(), mesh.material_segments());
}

#[test]
fn straddling_triangle_breaks_decomposition() {
    let mesh = manifold::surface(1, 1, flat).unwrap();
    let table = vec![Segment::new(MaterialId(0), 2), Segment::new(MaterialId(1), 4)];
    let tagged = mesh.with_material_segments(table).unwrap();
    assert!(matches!(
        tagged.material_decompose(),
        Err(Error::MaterialSegmentViolation(_))
    ));
}

#[test]
fn scene_entries_share_one_query() {
    let catalog = MaterialCatalog::default();
    let mesh = CylinderShape::new(24).build(&catalog).unwrap();
    let solid = box_at(0.0) - box_at(0.25);

    let entries = [
        SceneEntry::new(mesh, Mat4::from_translation(Vec3::X * -3.0)).unwrap(),
        SceneEntry::new(solid, Mat4::from_translation(Vec3::X * 3.0)).unwrap(),
    ];
    let ray = Ray::new(Vec3::new(-10.0, 0.05, 0.1), Vec3::X).unwrap();
    let nearest = entries
        .iter()
        .filter_map(|e| e.raycast(&ray))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
        .unwrap();
    assert_relative_eq!(nearest.position.x, -3.5, epsilon = 1e-2);
    assert_eq!(nearest.material, Some(MaterialId(0)));
}
