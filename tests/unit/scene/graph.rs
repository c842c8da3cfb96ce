use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn approx(a: Vec2, b: Vec2) -> bool {
    (a - b).hypot() < 1e-9
}

fn recorder(scene: &mut Scene) -> Rc<RefCell<Vec<(NodeId, Property)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    scene.subscribe(move |id, p| sink.borrow_mut().push((id, p)));
    log
}

#[test]
fn add_sets_parent_and_keeps_order() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_rectangle();
    let b = scene.create_circle();
    scene.add(root, a).unwrap();
    scene.add(root, b).unwrap();

    assert_eq!(scene.children(root).unwrap(), &[a, b]);
    assert_eq!(scene.parent(a).unwrap(), Some(root));
    assert!(scene.is_dirty());
}

#[test]
fn add_rejects_reparenting_and_cycles() {
    let mut scene = Scene::new();
    let root = scene.root();
    let outer = scene.create_group();
    let inner = scene.create_group();
    scene.add(root, outer).unwrap();
    scene.add(outer, inner).unwrap();

    assert!(scene.add(root, inner).is_err());
    let detached = scene.create_group();
    let child = scene.create_group();
    scene.add(detached, child).unwrap();
    assert!(scene.add(child, detached).is_err());
    assert!(scene.add(inner, inner).is_err());
    assert!(scene.add(inner, root).is_err());

    let rect = scene.create_rectangle();
    let other = scene.create_rectangle();
    let err = scene.add(rect, other).unwrap_err();
    assert!(err.to_string().contains("not a group"));
}

#[test]
fn remove_drops_subtree() {
    let mut scene = Scene::new();
    let root = scene.root();
    let g = scene.create_group();
    let leaf = scene.create_rectangle();
    scene.add(root, g).unwrap();
    scene.add(g, leaf).unwrap();
    assert_eq!(scene.len(), 3);

    scene.take_dirty();
    scene.remove(g).unwrap();
    assert!(scene.children(root).unwrap().is_empty());
    assert!(!scene.contains(g));
    assert!(!scene.contains(leaf));
    assert!(scene.is_dirty());
    assert!(scene.remove(root).is_err());
    assert!(scene.set_location(leaf, Vec2::ZERO).is_err());
}

#[test]
fn setters_notify_property_then_matrix() {
    let mut scene = Scene::new();
    let r = scene.create_rectangle();
    let log = recorder(&mut scene);

    scene.set_location(r, Vec2::new(0.5, 0.0)).unwrap();
    scene.set_color(r, Color::WHITE).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            (r, Property::Location),
            (r, Property::Matrix),
            (r, Property::Color)
        ]
    );
}

#[test]
fn invalidation_bubbles_only_when_attached() {
    let mut scene = Scene::new();
    let root = scene.root();
    let g = scene.create_group();
    let r = scene.create_rectangle();
    scene.add(g, r).unwrap();

    scene.set_rotation_angle(r, 10.0).unwrap();
    assert!(!scene.is_dirty());

    scene.add(root, g).unwrap();
    assert!(scene.take_dirty());
    assert!(!scene.is_dirty());

    let before = scene.invalidation_count();
    scene.set_scale(r, Vec2::new(2.0, 2.0)).unwrap();
    assert!(scene.is_dirty());
    assert_eq!(scene.invalidation_count(), before + 1);
}

#[test]
fn singular_scale_is_rejected_without_side_effects() {
    let mut scene = Scene::new();
    let r = scene.create_rectangle();
    scene.add(scene.root(), r).unwrap();
    scene.take_dirty();
    let log = recorder(&mut scene);

    assert!(scene.set_scale(r, Vec2::new(0.0, 1.0)).is_err());
    assert!(log.borrow().is_empty());
    assert!(!scene.is_dirty());
    assert_eq!(scene.entity(r).unwrap().scale(), Vec2::new(1.0, 1.0));
}

#[test]
fn move_by_follows_local_axes() {
    let mut scene = Scene::new();
    let r = scene.create_rectangle();
    scene.set_location(r, Vec2::new(1.0, 1.0)).unwrap();
    scene.set_rotation_angle(r, 90.0).unwrap();
    scene.move_by(r, Vec2::new(0.5, 0.0)).unwrap();
    assert!(approx(scene.entity(r).unwrap().location(), Vec2::new(1.0, 1.5)));
}

#[test]
fn world_conversion_round_trips_at_depth() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_group();
    let b = scene.create_group();
    let leaf = scene.create_rectangle();
    scene.add(root, a).unwrap();
    scene.add(a, b).unwrap();
    scene.add(b, leaf).unwrap();
    scene.set_location(a, Vec2::new(0.25, -0.5)).unwrap();
    scene.set_rotation_angle(a, 33.0).unwrap();
    scene.set_scale(b, Vec2::new(2.0, 0.5)).unwrap();
    scene.set_location(b, Vec2::new(-0.1, 0.3)).unwrap();
    scene.set_rotation_angle(root, -12.0).unwrap();

    for p in [Vec2::new(0.0, 0.0), Vec2::new(0.7, -0.2), Vec2::new(-3.0, 4.0)] {
        let world = scene.to_world(leaf, p).unwrap();
        assert!(approx(scene.from_world(leaf, world).unwrap(), p));
    }

    // The node's own transform is not part of the mapping.
    scene.set_location(leaf, Vec2::new(5.0, 5.0)).unwrap();
    let world = scene.to_world(leaf, Vec2::ZERO).unwrap();
    let expected = scene.to_world(b, Vec2::new(-0.1, 0.3)).unwrap();
    assert!(approx(world, expected));
}

#[test]
fn kind_specific_setters_check_the_kind() {
    let mut scene = Scene::new();
    let g = scene.create_group();
    let c = scene.create_circle();
    assert!(scene.set_begin(g, 10.0).is_err());
    assert!(scene.set_color(g, Color::BLACK).is_err());
    scene.set_begin(c, 90.0).unwrap();
    assert!((scene.circle(c).unwrap().begin_degrees() - 90.0).abs() < 1e-9);

    let p = scene.create_path("M0,0 L1,1").unwrap();
    assert!(scene.set_path_data(p, "M0,0 X 1").is_err());
    assert!(scene.create_path("nonsense X").is_err());
}

#[test]
fn text_setters_clear_layout_except_alignment() {
    let mut scene = Scene::new();
    let t = scene.create_text("hello");
    scene.set_width(t, 4.0).unwrap();
    scene.set_horizontal_alignment(t, HorizontalAlignment::Center).unwrap();
    assert_eq!(scene.text(t).unwrap().alignment(), HorizontalAlignment::Center);
    assert_eq!(scene.text(t).unwrap().width(), 4.0);
    assert!(scene.set_width(t, f64::NAN).is_err());
}

#[test]
fn image_without_loader_errors_and_notifies() {
    let mut scene = Scene::new();
    let img = scene.create_image();
    let log = recorder(&mut scene);

    scene.set_source(img, "missing.png").unwrap();
    assert_eq!(scene.image(img).unwrap().status(), ImageStatus::Error);
    assert_eq!(
        *log.borrow(),
        vec![(img, Property::Source), (img, Property::Status)]
    );
}

#[test]
fn image_load_goes_through_loading_to_success() {
    let loader: Arc<dyn BitmapLoader> = Arc::new(|_: &str| Bitmap::solid(3, 2, [1, 2, 3, 255]));
    let mut scene = Scene::new().with_loader(loader);
    let img = scene.create_image();
    scene.add(scene.root(), img).unwrap();
    scene.take_dirty();

    scene.set_source(img, "a.png").unwrap();
    assert_eq!(scene.image(img).unwrap().status(), ImageStatus::Loading);
    assert!(!scene.is_dirty());

    assert_eq!(scene.await_images(), 1);
    let image = scene.image(img).unwrap();
    assert_eq!(image.status(), ImageStatus::Success);
    assert_eq!(image.original_size(), Some((3, 2)));
    assert!(scene.take_dirty());
    assert_eq!(scene.poll_images(), 0);
}

#[test]
fn image_load_failure_does_not_invalidate() {
    let loader: Arc<dyn BitmapLoader> =
        Arc::new(|_: &str| Err(SceneError::asset("boom")));
    let mut scene = Scene::new().with_loader(loader);
    let img = scene.create_image();
    scene.add(scene.root(), img).unwrap();
    scene.take_dirty();

    scene.set_source(img, "a.png").unwrap();
    assert_eq!(scene.await_images(), 1);
    assert_eq!(scene.image(img).unwrap().status(), ImageStatus::Error);
    assert!(!scene.is_dirty());
}

#[test]
fn test_collision_checks_membership() {
    let mut scene = Scene::new();
    let a = scene.create_rectangle();
    let b = scene.create_rectangle();
    assert!(scene.test_collision(a, &[b, a]));
    assert!(!scene.test_collision(a, &[b]));
}

#[test]
fn unsubscribe_stops_notifications() {
    let mut scene = Scene::new();
    let r = scene.create_rectangle();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let sub = scene.subscribe(move |_, _| *sink.borrow_mut() += 1);
    scene.set_visible(r, false).unwrap();
    assert!(scene.unsubscribe(sub));
    scene.set_visible(r, true).unwrap();
    assert_eq!(*count.borrow(), 1);
    assert!(!scene.unsubscribe(sub));
}

#[test]
fn removed_slots_are_reused_without_reviving_old_ids() {
    let mut scene = Scene::new();
    let root = scene.root();
    let group = scene.create_group();
    let leaf = scene.create_rectangle();
    scene.add(root, group).unwrap();
    scene.add(group, leaf).unwrap();
    let capacity = scene.capacity();

    scene.remove(group).unwrap();
    assert_eq!(scene.len(), 1);

    for _ in 0..100 {
        let id = scene.create_circle();
        scene.add(root, id).unwrap();
        scene.remove(id).unwrap();
    }
    assert_eq!(scene.capacity(), capacity);

    let reused = scene.create_rectangle();
    assert!(reused.index() == group.index() || reused.index() == leaf.index());
    assert_ne!(reused, group);
    assert_ne!(reused, leaf);
    assert!(!scene.contains(group));
    assert!(!scene.contains(leaf));
    assert!(scene.set_visible(leaf, false).is_err());
    assert!(scene.contains(reused));
    assert!(reused.to_string().contains('v'));
}
