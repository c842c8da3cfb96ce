use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scene2d::view::ManualFrames;
use scene2d::{
    Color, CpuCanvas, CpuCanvasOpts, FsBitmapLoader, HorizontalAlignment, NodeId,
    Overflow, RecordingCanvas, Scene, Vec2, View, ViewOpts,
};

/// Upper bound on frames drawn while the demo scene settles.
const MAX_SETTLE_FRAMES: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "scene2d", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the demo scene as a PNG.
    Frame(FrameArgs),
    /// Print the demo-scene nodes under a surface pixel.
    Hit(HitArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,

    /// View options JSON (`background`, `resolve_probes`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Font file for the caption. Without it the caption is left out.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Image file shown in the lower-right quadrant.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct HitArgs {
    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Hit(args) => cmd_hit(args),
    }
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<ViewOpts> {
    let Some(path) = path else {
        return Ok(ViewOpts::default().with_background(Color::rgb(0.07, 0.08, 0.11)));
    };
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read view options '{}'", path.display()))?;
    Ok(ViewOpts::from_json_str(&s)?)
}

/// Nodes the demo scene exposes for hit-test output.
struct Demo {
    scene: Scene,
    names: Vec<(NodeId, &'static str)>,
}

fn build_demo(caption: Option<&str>, image: Option<&Path>) -> anyhow::Result<Demo> {
    let mut scene = Scene::new();
    let root = scene.root();
    let mut names = Vec::new();

    let board = scene.create_group();
    scene.add(root, board)?;
    scene.set_scale(board, Vec2::new(0.9, 0.9))?;
    names.push((board, "board"));

    let square = scene.create_rectangle();
    scene.add(board, square)?;
    scene.set_location(square, Vec2::new(-0.5, -0.5))?;
    scene.set_rotation_angle(square, 20.0)?;
    scene.set_scale(square, Vec2::new(0.6, 0.6))?;
    scene.set_color(square, "#e4572e".parse()?)?;
    names.push((square, "square"));

    let pie = scene.create_circle();
    scene.add(board, pie)?;
    scene.set_location(pie, Vec2::new(0.5, -0.5))?;
    scene.set_scale(pie, Vec2::new(0.35, 0.35))?;
    scene.set_begin(pie, 30.0)?;
    scene.set_end(pie, 330.0)?;
    scene.set_color(pie, "#ffc914".parse()?)?;
    names.push((pie, "pie"));

    let triangle = scene.create_polygon(vec![
        Vec2::new(0.0, -0.5),
        Vec2::new(0.5, 0.5),
        Vec2::new(-0.5, 0.5),
    ])?;
    scene.add(board, triangle)?;
    scene.set_location(triangle, Vec2::new(-0.5, 0.5))?;
    scene.set_scale(triangle, Vec2::new(0.7, 0.7))?;
    scene.set_color(triangle, "#17bebb".parse()?)?;
    scene.set_border_color(triangle, Color::WHITE)?;
    names.push((triangle, "triangle"));

    let wave = scene.create_path("M-0.4,0 C-0.2,-0.3 0,0.3 0.2,0 C0.3,-0.15 0.4,-0.2 0.5,0")?;
    scene.add(board, wave)?;
    scene.set_border_color(wave, Color::WHITE)?;
    scene.set_border_width(wave, 0.03)?;
    names.push((wave, "wave"));

    if let Some(path) = image {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file = path
            .file_name()
            .and_then(|f| f.to_str())
            .context("image path has no usable file name")?;
        scene.set_loader(Arc::new(FsBitmapLoader::new(dir)));
        let picture = scene.create_image();
        scene.add(board, picture)?;
        scene.set_location(picture, Vec2::new(0.5, 0.5))?;
        scene.set_scale(picture, Vec2::new(0.7, 0.7))?;
        scene.set_source(picture, file)?;
        names.push((picture, "picture"));
    }

    if let Some(caption) = caption {
        let text = scene.create_text(caption);
        scene.add(root, text)?;
        scene.set_location(text, Vec2::new(-0.9, -0.98))?;
        scene.set_scale(text, Vec2::new(0.09, 0.09))?;
        scene.set_width(text, 20.0)?;
        scene.set_overflow(text, Overflow::Ellipsis)?;
        scene.set_horizontal_alignment(text, HorizontalAlignment::Center)?;
        scene.set_color(text, Color::WHITE)?;
        scene.set_border_width(text, 0.0)?;
        names.push((text, "caption"));
    }

    let probe = scene.create_collider();
    scene.add(board, probe)?;
    scene.set_location(probe, Vec2::new(-0.5, -0.5))?;
    names.push((probe, "probe"));

    Ok(Demo { scene, names })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let opts = read_opts(args.config.as_deref())?;
    let mut canvas = CpuCanvas::new(args.width, args.height, CpuCanvasOpts::default())?;

    let family = match &args.font {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            Some(canvas.register_font(bytes)?)
        }
        None => None,
    };
    let caption = family.as_ref().map(|f| format!("scene2d demo in {f}"));
    let mut demo = build_demo(caption.as_deref(), args.image.as_deref())?;
    let loaded = demo.scene.await_images();
    tracing::debug!(loaded, "images ready");

    let frames = ManualFrames::new();
    let mut view = View::new(canvas, frames.clone()).with_opts(opts);
    view.set_scene(Some(demo.scene));

    let mut drawn = 0;
    while let Some(token) = frames.next_frame() {
        if drawn == MAX_SETTLE_FRAMES {
            break;
        }
        if view.on_frame(token)? {
            drawn += 1;
        }
        view.pump();
    }
    anyhow::ensure!(drawn > 0, "no frame was drawn");

    if let Some(scene) = view.scene()
        && let Some((probe, _)) = demo.names.iter().find(|(_, n)| *n == "probe")
    {
        for hit in scene.collisions(*probe)? {
            eprintln!("probe touches {}", name_of(&demo.names, *hit));
        }
    }

    let frame = view.canvas().frame();
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} ({drawn} frames)", args.out.display());
    Ok(())
}

fn cmd_hit(args: HitArgs) -> anyhow::Result<()> {
    let demo = build_demo(None, None)?;
    let canvas = RecordingCanvas::new(args.width, args.height);
    let mut view = View::new(canvas, ManualFrames::new());
    view.set_scene(Some(demo.scene));

    let scene_point = view
        .surface_point_to_scene(args.x, args.y)
        .context("surface has an empty bounding box")?;
    println!("scene point ({:.4}, {:.4})", scene_point.x, scene_point.y);
    for id in view.hit_test_surface(args.x, args.y) {
        println!("{id} {}", name_of(&demo.names, id));
    }
    Ok(())
}

fn name_of(names: &[(NodeId, &'static str)], id: NodeId) -> &'static str {
    names
        .iter()
        .find(|(n, _)| *n == id)
        .map(|(_, name)| *name)
        .unwrap_or("?")
}
