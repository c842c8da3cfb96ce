use super::*;

#[test]
fn scene_square_covers_the_surface() {
    let vp = Viewport::new(200, 100);
    assert_eq!(vp.scene_point_to_surface(Vec2::new(-1.0, -1.0)), Point::new(0.0, 0.0));
    assert_eq!(vp.scene_point_to_surface(Vec2::new(1.0, 1.0)), Point::new(200.0, 100.0));
    assert_eq!(vp.scene_point_to_surface(Vec2::ZERO), Point::new(100.0, 50.0));
}

#[test]
fn pointer_maps_through_the_bounding_box() {
    let vp = Viewport::new(400, 400);
    assert_eq!(vp.surface_point_to_scene(200.0, 100.0), Some(Vec2::new(0.0, -0.5)));

    let hidpi = vp.with_bbox(200.0, 200.0);
    assert_eq!(hidpi.surface_point_to_scene(200.0, 100.0), Some(Vec2::new(1.0, 0.0)));
}

#[test]
fn empty_bounding_box_has_no_scene_point() {
    assert_eq!(Viewport::new(0, 10).surface_point_to_scene(1.0, 1.0), None);
    let mut vp = Viewport::new(10, 10);
    vp.set_bbox(Some((10.0, 0.0)));
    assert_eq!(vp.surface_point_to_scene(1.0, 1.0), None);
}
