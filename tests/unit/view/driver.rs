use super::*;
use crate::foundation::core::Affine;
use crate::render::{DrawCommand, RecordingCanvas};
use crate::view::scheduler::ManualFrames;

fn view_with_scene() -> (View<RecordingCanvas>, ManualFrames) {
    let frames = ManualFrames::new();
    let mut view = View::new(RecordingCanvas::new(100, 50), frames.clone());
    view.set_scene(Some(Scene::new()));
    (view, frames)
}

fn run_frames(view: &mut View<RecordingCanvas>, frames: &ManualFrames) -> usize {
    let mut drawn = 0;
    while let Some(token) = frames.next_frame() {
        if view.on_frame(token).unwrap() {
            drawn += 1;
        }
        view.pump();
    }
    drawn
}

#[test]
fn opts_load_from_json() {
    let opts = ViewOpts::from_json_str(r##"{"background": "#ff0000", "resolve_probes": false}"##)
        .unwrap();
    assert_eq!(opts.background, Some(Color::rgb(1.0, 0.0, 0.0)));
    assert!(!opts.resolve_probes);
    assert_eq!(ViewOpts::from_json_str("{}").unwrap(), ViewOpts::default());

    let err = ViewOpts::from_json_str(r#"{"backdrop": "red"}"#).unwrap_err();
    assert!(err.to_string().starts_with("validation error:"));
}

#[test]
fn setting_a_scene_requests_one_frame() {
    let (mut view, frames) = view_with_scene();
    assert_eq!(frames.queued().len(), 1);
    view.pump();
    assert_eq!(frames.queued().len(), 1);

    assert_eq!(run_frames(&mut view, &frames), 1);
    let commands = view.canvas().commands();
    assert_eq!(
        commands[0],
        DrawCommand::SetTransform(Affine::new([50.0, 0.0, 0.0, 25.0, 50.0, 25.0]))
    );
    assert_eq!(commands[1], DrawCommand::Clear);
    assert_eq!(commands.last(), Some(&DrawCommand::Flush));
}

#[test]
fn invalidations_between_frames_coalesce() {
    let (mut view, frames) = view_with_scene();
    run_frames(&mut view, &frames);

    let scene = view.scene_mut().unwrap();
    let rect = scene.create_rectangle();
    scene.add(scene.root(), rect).unwrap();
    for x in [0.1, 0.2, 0.3] {
        scene.set_location(rect, Vec2::new(x, 0.0)).unwrap();
    }
    view.pump();
    view.pump();
    assert_eq!(frames.queued().len(), 1);
    assert_eq!(run_frames(&mut view, &frames), 1);
    assert_eq!(view.stats().frames_rendered, 2);
}

#[test]
fn collision_change_schedules_exactly_one_more_frame() {
    let (mut view, frames) = view_with_scene();
    let scene = view.scene_mut().unwrap();
    let rect = scene.create_rectangle();
    let collider = scene.create_collider();
    scene.add(scene.root(), rect).unwrap();
    scene.add(scene.root(), collider).unwrap();

    assert_eq!(run_frames(&mut view, &frames), 2);
    let scene = view.scene().unwrap();
    assert_eq!(scene.collisions(collider).unwrap(), &[rect]);
    assert_eq!(view.stats().probes_resolved, 2);
    assert!(frames.queued().is_empty());
}

#[test]
fn probes_can_be_switched_off() {
    let frames = ManualFrames::new();
    let mut view = View::new(RecordingCanvas::new(10, 10), frames.clone())
        .with_opts(ViewOpts::default().with_resolve_probes(false));
    let mut scene = Scene::new();
    let rect = scene.create_rectangle();
    let collider = scene.create_collider();
    scene.add(scene.root(), rect).unwrap();
    scene.add(scene.root(), collider).unwrap();
    view.set_scene(Some(scene));

    assert_eq!(run_frames(&mut view, &frames), 1);
    assert!(view.scene().unwrap().collisions(collider).unwrap().is_empty());
}

#[test]
fn superseded_tokens_are_stale() {
    let (mut view, frames) = view_with_scene();
    let old = frames.queued()[0];
    view.resize(200, 100).unwrap();
    assert_eq!(view.viewport().width(), 200);

    assert!(!view.on_frame(old).unwrap());
    assert_eq!(view.stats().stale_frames, 1);
    assert_eq!(run_frames(&mut view, &frames), 1);
}

#[test]
fn removing_the_scene_cancels_the_frame() {
    let (mut view, frames) = view_with_scene();
    assert!(view.set_scene(None).is_some());
    assert!(frames.queued().is_empty());
    assert_eq!(view.frame_state(), FrameState::Idle);
    assert!(view.surface_point_to_scene(1.0, 1.0).is_none());
}

#[test]
fn background_is_filled_before_nodes() {
    let frames = ManualFrames::new();
    let bg = Color::rgb(0.0, 0.0, 1.0);
    let mut view = View::new(RecordingCanvas::new(10, 10), frames.clone())
        .with_opts(ViewOpts::default().with_background(bg));
    let mut scene = Scene::new();
    let rect = scene.create_rectangle();
    scene.add(scene.root(), rect).unwrap();
    scene.set_color(rect, Color::WHITE).unwrap();
    view.set_scene(Some(scene));
    run_frames(&mut view, &frames);

    assert_eq!(view.canvas().fill_colors(), vec![bg, Color::WHITE]);
    assert_eq!(view.canvas().depth(), 0);
}

#[test]
fn hidden_root_draws_nothing() {
    let (mut view, frames) = view_with_scene();
    let scene = view.scene_mut().unwrap();
    let root = scene.root();
    scene.set_visible(root, false).unwrap();
    run_frames(&mut view, &frames);
    assert!(view.canvas().commands().is_empty());
}

#[test]
fn surface_hits_go_through_the_viewport() {
    let (mut view, _frames) = view_with_scene();
    let scene = view.scene_mut().unwrap();
    let rect = scene.create_rectangle();
    scene.add(scene.root(), rect).unwrap();

    assert_eq!(view.surface_point_to_scene(50.0, 25.0), Some(Vec2::ZERO));
    assert_eq!(view.hit_test_surface(50.0, 25.0), vec![rect]);
    assert!(view.hit_test_surface(0.0, 0.0).is_empty());
}

#[test]
fn overlays_paint_after_the_scene_in_order() {
    let frames = ManualFrames::new();
    let mut view = View::new(RecordingCanvas::new(10, 10), frames.clone());
    let mut scene = Scene::new();
    let rect = scene.create_rectangle();
    scene.add(scene.root(), rect).unwrap();
    scene.set_color(rect, Color::WHITE).unwrap();
    view.set_scene(Some(scene));
    assert_eq!(run_frames(&mut view, &frames), 1);

    let red = Color::rgb(1.0, 0.0, 0.0);
    let green = Color::rgb(0.0, 1.0, 0.0);
    for color in [red, green] {
        view.add_overlay(move |canvas: &mut dyn Canvas| {
            canvas.set_fill(color);
            canvas.begin_path();
            canvas.rect(Rect::new(-1.0, -1.0, 0.0, 0.0));
            canvas.fill();
            Ok(())
        });
    }
    view.canvas_mut().take_commands();
    assert_eq!(run_frames(&mut view, &frames), 1);

    assert_eq!(view.canvas().fill_colors(), vec![Color::WHITE, red, green]);
    assert_eq!(view.canvas().depth(), 0);

    view.clear_overlays();
    view.canvas_mut().take_commands();
    assert_eq!(run_frames(&mut view, &frames), 1);
    assert_eq!(view.canvas().fill_colors(), vec![Color::WHITE]);
}

#[test]
fn failing_overlay_fails_the_frame_with_balanced_state() {
    let (mut view, frames) = view_with_scene();
    view.add_overlay(|canvas: &mut dyn Canvas| {
        canvas.set_line_width(3.0);
        Err(SceneError::render("overlay failed"))
    });
    let token = frames.next_frame().unwrap();
    let err = view.on_frame(token).unwrap_err();
    assert!(err.to_string().starts_with("render error:"));
    assert_eq!(view.canvas().depth(), 0);
    assert_eq!(view.stats().frames_rendered, 0);
}
