use super::*;

fn at_angle(deg: f64, len: f64) -> Vec3 {
    let r = deg.to_radians();
    Vec3::new(len * r.cos(), len * r.sin(), 1.0)
}

#[test]
fn unit_square_boundary_is_inclusive() {
    assert!(unit_square_contains(Vec3::new(0.5, 0.5, 1.0)));
    assert!(unit_square_contains(Vec3::new(-0.5, 0.0, 1.0)));
    assert!(!unit_square_contains(Vec3::new(0.5 + 1e-9, 0.5, 1.0)));
}

#[test]
fn full_circle_matches_whole_disk() {
    let c = Circle::default();
    assert!(c.is_full());
    assert!(c.contains(Vec3::new(0.0, 0.0, 1.0)));
    for deg in [0.0, 45.0, 90.0, 179.0, 180.0, 181.0, 270.0, 359.0] {
        assert!(c.contains(at_angle(deg, 0.9)), "angle {deg}");
    }
    assert!(!c.contains(at_angle(45.0, 1.01)));
    assert!(!c.contains(Vec3::new(1.5, 0.0, 1.0)));
}

#[test]
fn full_turn_from_any_start_matches_whole_disk() {
    for (begin, end) in [(90.0, 450.0), (-180.0, 180.0), (-360.0, 0.0), (360.0, 0.0)] {
        let c = Circle::new(begin, end).unwrap();
        assert!(c.is_full(), "{begin}..{end}");
        for deg in [10.0, 55.0, 100.0, 145.0, 190.0, 235.0, 280.0, 325.0] {
            assert_eq!(
                c.contains(at_angle(deg, 0.5)),
                c.is_full(),
                "{begin}..{end} at {deg}"
            );
        }
        assert!(!c.contains(at_angle(10.0, 1.01)));
    }
}

#[test]
fn angles_wrap_into_one_turn() {
    let c = Circle::new(450.0, -270.0).unwrap();
    let (begin, end) = c.normalized();
    assert!((begin - 90f64.to_radians()).abs() < 1e-9);
    assert!((end - 90f64.to_radians()).abs() < 1e-9);
    assert!(!c.is_full());

    // 400..500 is the 40..140 sector.
    let c = Circle::new(400.0, 500.0).unwrap();
    assert!(!c.is_full());
    assert!(c.contains(at_angle(90.0, 0.5)));
    assert!(!c.contains(at_angle(10.0, 0.5)));
    assert!(!c.contains(at_angle(200.0, 0.5)));
}

#[test]
fn half_sector_selects_upper_half() {
    let c = Circle::new(0.0, 180.0).unwrap();
    assert!(!c.is_full());
    assert!(c.contains(at_angle(90.0, 0.5)));
    assert!(!c.contains(at_angle(270.0, 0.5)));
    assert!(c.contains(Vec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn wrapping_sector_uses_either_side() {
    let c = Circle::new(-45.0, 45.0).unwrap();
    assert!(c.contains(at_angle(0.0, 0.5)));
    assert!(c.contains(at_angle(30.0, 0.5)));
    assert!(c.contains(at_angle(-30.0, 0.5)));
    assert!(!c.contains(at_angle(180.0, 0.5)));
    assert!((c.begin_degrees() + 45.0).abs() < 1e-9);
}

#[test]
fn circle_rejects_non_finite_angles() {
    let mut c = Circle::default();
    assert!(c.set_end_degrees(f64::INFINITY).is_err());
    assert!(c.is_full());
}

#[test]
fn unit_square_polygon_agrees_with_rectangle() {
    let p = Polygon::new(vec![
        Vec2::new(-0.5, -0.5),
        Vec2::new(0.5, -0.5),
        Vec2::new(0.5, 0.5),
        Vec2::new(-0.5, 0.5),
    ])
    .unwrap();
    for v in [
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.25, -0.4, 1.0),
        Vec3::new(-0.7, 0.1, 1.0),
    ] {
        assert_eq!(p.contains(v), unit_square_contains(v), "{v:?}");
    }
    assert!(p.contains(Vec3::new(0.5, 0.0, 1.0)));
}

#[test]
fn concave_polygon_excludes_notch() {
    // "U" shape opening upwards.
    let p = Polygon::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(3.0, 0.0),
        Vec2::new(3.0, 3.0),
        Vec2::new(2.0, 3.0),
        Vec2::new(2.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 3.0),
        Vec2::new(0.0, 3.0),
    ])
    .unwrap();
    assert!(p.contains(Vec3::new(0.5, 2.0, 1.0)));
    assert!(p.contains(Vec3::new(2.5, 2.0, 1.0)));
    assert!(!p.contains(Vec3::new(1.5, 2.0, 1.0)));
    assert!(p.contains(Vec3::new(1.5, 0.5, 1.0)));
}

#[test]
fn degenerate_polygons_never_match() {
    assert!(!Polygon::default().contains(Vec3::new(0.0, 0.0, 1.0)));
    let p = Polygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]).unwrap();
    assert!(!p.contains(Vec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn test_edge_classification() {
    let a = Vec2::new(0.0, 0.0);
    assert_eq!(test_edge(a, Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)), 0.0);
    assert_eq!(test_edge(a, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)), 1.0);
    assert_eq!(test_edge(a, a, Vec2::new(1.0, 1.0)), 0.0);
    assert_eq!(test_edge(a, Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0)), -1.0);
    assert_eq!(test_edge(a, Vec2::new(-1.0, -1.0), Vec2::new(-1.0, 1.0)), 1.0);
}

#[test]
fn path_data_is_validated() {
    let p = PathShape::parse("M0,0 L1,0 L1,1 Z").unwrap();
    assert_eq!(p.data(), "M0,0 L1,0 L1,1 Z");
    assert_eq!(p.path().elements().len(), 4);
    assert!(PathShape::parse("M0,0 X 1").is_err());
}
