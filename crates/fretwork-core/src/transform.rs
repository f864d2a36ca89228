//! Transform builders on top of `glam`

use glam::{Mat4, Vec3, Vec4};

/// Compose a list of transforms into one matrix.
///
/// The list is read in application order: the first matrix is applied to a
/// point first, the last one last.
pub fn compose(transforms: &[Mat4]) -> Mat4 {
    transforms
        .iter()
        .fold(Mat4::IDENTITY, |acc, m| *m * acc)
}

/// Apply a homogeneous transform to a point, dividing by `w`.
///
/// Returns `None` when `w` vanishes (the point maps to infinity).
pub fn project(m: &Mat4, p: Vec3) -> Option<Vec3> {
    let h = *m * Vec4::new(p.x, p.y, p.z, 1.0);
    if h.w.abs() <= f32::EPSILON {
        return None;
    }
    Some(h.truncate() / h.w)
}

/// Transform a surface normal with the inverse-transpose of `m`
pub fn transform_normal(inverse: &Mat4, n: Vec3) -> Vec3 {
    inverse.transpose().transform_vector3(n).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compose_applies_in_list_order() {
        let m = compose(&[
            Mat4::from_translation(Vec3::X),
            Mat4::from_scale(Vec3::splat(2.0)),
        ]);
        // Translate first, then scale
        let p = m.transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.x, 2.0);
    }

    #[test]
    fn empty_compose_is_identity() {
        assert_eq!(compose(&[]), Mat4::IDENTITY);
    }

    #[test]
    fn project_divides_by_w() {
        let mut m = Mat4::IDENTITY;
        m.w_axis.w = 2.0;
        let p = project(&m, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(p, Some(Vec3::new(1.0, 2.0, 3.0)));

        m.w_axis.w = 0.0;
        assert_eq!(project(&m, Vec3::ZERO), None);
    }

    #[test]
    fn normals_survive_non_uniform_scale() {
        let m = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let n = transform_normal(&m.inverse(), Vec3::new(1.0, 1.0, 0.0).normalize());
        // Stretching along X flattens the normal toward Y
        assert!(n.y > n.x);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-6);
    }
}
