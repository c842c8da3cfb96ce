use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn inverse_times_matrix_is_identity() {
    let m = Matrix3::translation(Vec2::new(0.3, -1.2))
        * Matrix3::rotation(37.0)
        * Matrix3::scaling(Vec2::new(2.0, 0.25));
    let inv = m.invert().unwrap();
    assert!((inv * m).approx_eq(&Matrix3::IDENTITY, 1e-9));
    assert!((m * inv).approx_eq(&Matrix3::IDENTITY, 1e-9));
}

#[test]
fn composition_applies_inner_first() {
    let t = Matrix3::translation(Vec2::new(1.0, 0.0));
    let r = Matrix3::rotation(90.0);

    let p = (t * r) * Vec3::point(Vec2::new(1.0, 0.0));
    assert!(approx(p.x, 1.0) && approx(p.y, 1.0) && approx(p.z, 1.0));

    let p = (r * t) * Vec3::point(Vec2::new(1.0, 0.0));
    assert!(approx(p.x, 0.0) && approx(p.y, 2.0));
}

#[test]
fn directions_ignore_translation() {
    let t = Matrix3::translation(Vec2::new(5.0, 5.0));
    let d = t * Vec3::direction(Vec2::new(1.0, 2.0));
    assert_eq!(d, Vec3::new(1.0, 2.0, 0.0));
}

#[test]
fn singular_matrix_is_a_geometry_error() {
    let m = Matrix3::scaling(Vec2::new(0.0, 1.0));
    let err = m.invert().unwrap_err();
    assert!(err.to_string().starts_with("geometry error:"));
}

#[test]
fn to_affine_matches_canvas_order() {
    let m = Matrix3::translation(Vec2::new(3.0, 4.0)) * Matrix3::scaling(Vec2::new(2.0, 5.0));
    assert_eq!(m.to_affine().as_coeffs(), [2.0, 0.0, 0.0, 5.0, 3.0, 4.0]);
}

#[test]
fn vec3_length_counts_all_components() {
    assert!(approx(Vec3::new(3.0, 4.0, 0.0).length(), 5.0));
    assert!(approx(Vec3::new(0.0, 0.0, 1.0).length(), 1.0));
    assert!(approx(Vec3::new(1.0, 2.0, 3.0).dot(Vec3::UNIT_Y), 2.0));
}
