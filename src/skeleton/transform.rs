use nalgebra::{Matrix3, Matrix4, Translation3, UnitQuaternion, Vector3};

/// Builds `T · R · S` so points are scaled and rotated about the bone origin
/// before being translated.
pub(super) fn compose_trs(
    position: &Vector3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale: &Vector3<f32>,
) -> Matrix4<f32> {
    let translation_matrix = Translation3::from(*position).to_homogeneous();
    let rotation_matrix = rotation.to_homogeneous();
    let scale_matrix = Matrix4::new_nonuniform_scaling(scale);
    translation_matrix * rotation_matrix * scale_matrix
}

/// Per-axis reciprocal of a parent's pose scale.
pub(super) fn inverse_scale(scale: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(&Vector3::new(
        1.0 / scale.x,
        1.0 / scale.y,
        1.0 / scale.z,
    ))
}

/// Rebuilds an inverse bind matrix relative to the skeleton root.
/// Returns `None` when either matrix is singular or the result is not finite.
///
/// # Arguments
///
/// * `root_transform` - Root-level transform of the owning graph.
/// * `world` - Resolved world matrix of the bone.
///
/// # Returns
///
/// `Some(inverse_bind_matrix)` when invertible, otherwise `None`.
pub(super) fn rebuild_inverse_bind_matrix(
    root_transform: &Matrix4<f32>,
    world: &Matrix4<f32>,
) -> Option<Matrix4<f32>> {
    let root_inverse = root_transform.try_inverse()?;
    let inverse = (root_inverse * world).try_inverse()?;
    inverse.iter().all(|value| value.is_finite()).then_some(inverse)
}

/// Rotation part of an affine matrix with scale and mirroring removed.
pub(super) fn extract_rotation(matrix: &Matrix4<f32>) -> UnitQuaternion<f32> {
    let basis_x = Vector3::new(matrix[(0, 0)], matrix[(1, 0)], matrix[(2, 0)]);
    let basis_y = Vector3::new(matrix[(0, 1)], matrix[(1, 1)], matrix[(2, 1)]);
    let basis_z = Vector3::new(matrix[(0, 2)], matrix[(1, 2)], matrix[(2, 2)]);

    let normalize_or = |basis: Vector3<f32>, fallback: Vector3<f32>| {
        let length = basis.norm();
        if length > 1e-8 { basis / length } else { fallback }
    };

    let mut rot_x = normalize_or(basis_x, Vector3::x());
    let rot_y = normalize_or(basis_y, Vector3::y());
    let rot_z = normalize_or(basis_z, Vector3::z());

    if rot_x.cross(&rot_y).dot(&rot_z) < 0.0 {
        rot_x = -rot_x;
    }

    UnitQuaternion::from_matrix(&Matrix3::from_columns(&[rot_x, rot_y, rot_z]))
}
