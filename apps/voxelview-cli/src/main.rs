use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{IVec3, Vec3};
use parking_lot::RwLock;
use tracing_subscriber::EnvFilter;
use voxelview_common::ViewerConfig;
use voxelview_render::{
    BackendCall, Camera, ChunkMesher, RecordingBackend, ShaderSources, VoxelScene,
};
use voxelview_tools::{ChunkInfo, WorldInspector};
use voxelview_world::{PregenBounds, World, spawn_pregeneration};

#[derive(Parser)]
#[command(name = "voxelview-cli", about = "Headless voxelview operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Pregenerate the world in the background and summarize it
    Pregen {
        /// Chunks per axis (odd); defaults to the configured size
        #[arg(short, long)]
        size: Option<i32>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Also describe every generated chunk
        #[arg(long)]
        chunks: bool,
    },
    /// Dry-run the draw loop on the recording backend
    Frames {
        /// Number of frames to draw
        #[arg(short = 'n', long, default_value = "60")]
        count: u32,
        /// Yaw change per frame in degrees
        #[arg(long, default_value = "1.0")]
        yaw_step: f32,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ViewerConfig> {
    let config = match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn pregen(
    config: &ViewerConfig,
    size: Option<i32>,
    json: bool,
    chunks: bool,
) -> anyhow::Result<()> {
    let size = size.map_or(IVec3::from_array(config.world.pregen_size), IVec3::splat);
    let bounds = PregenBounds::from_size(size)?;
    let world = Arc::new(RwLock::new(World::new()));

    let start = Instant::now();
    let handle = spawn_pregeneration(Arc::clone(&world), bounds)?;
    while !handle.is_finished() {
        let (done, total) = handle.progress();
        tracing::debug!(done, total, "pregeneration progress");
        std::thread::sleep(Duration::from_millis(10));
    }
    let created = handle.join()?;
    let elapsed = start.elapsed();

    let world = world.read();
    let summary = WorldInspector::summary(&world);
    let infos: Vec<ChunkInfo> = if chunks {
        WorldInspector::list_chunks(&world)
            .into_iter()
            .filter_map(|coord| WorldInspector::inspect_chunk(&world, coord))
            .collect()
    } else {
        Vec::new()
    };

    if json {
        let mut report = serde_json::Map::new();
        report.insert("summary".into(), serde_json::to_value(&summary)?);
        if chunks {
            report.insert("chunks".into(), serde_json::to_value(&infos)?);
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pregenerated {created} chunks in {elapsed:?}");
        println!("{summary}");
        for info in &infos {
            println!("  {info}");
        }
    }
    Ok(())
}

fn frames(config: &ViewerConfig, count: u32, yaw_step: f32) -> anyhow::Result<()> {
    let mut world = World::new();
    world.pregenerate(&PregenBounds::from_size(IVec3::from_array(
        config.world.pregen_size,
    ))?);
    let vertices = ChunkMesher::default().mesh_world(&world);

    anyhow::ensure!(
        config.camera.sensitivity > 0.0,
        "camera sensitivity must be positive to convert the yaw step"
    );
    let aspect = config.window.width as f32 / config.window.height as f32;
    let mut camera = Camera::from_config(&config.camera, aspect);
    let mut backend = RecordingBackend::new();
    // The recording backend never parses shader text.
    let sources = ShaderSources::single_module("recording");
    let mut scene = VoxelScene::new(&mut backend, &sources, &mut camera)?;
    scene.upload_mesh(&mut backend, &vertices)?;
    backend.take_calls();

    let mut visible_frames = 0;
    for _ in 0..count {
        camera.rotate(yaw_step / camera.sensitivity(), 0.0);
        if camera.is_point_in_fov(Vec3::ZERO) {
            visible_frames += 1;
        }
        scene.draw(&mut backend, &mut camera)?;
    }

    let calls = backend.calls();
    let uniform_updates = calls
        .iter()
        .filter(|c| matches!(c, BackendCall::SetUniform { .. }))
        .count();
    println!("Frames: {count}, yaw step {yaw_step} deg");
    println!("Mesh: {} vertices", scene.vertex_count());
    println!("Draw calls: {}", backend.draw_count());
    println!("Uniform updates: {uniform_updates}");
    println!("Frames facing origin: {visible_frames}");
    println!(
        "Final camera: yaw={:.1} pitch={:.1} front=({:.2}, {:.2}, {:.2})",
        camera.yaw(),
        camera.pitch(),
        camera.front().x,
        camera.front().y,
        camera.front().z
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("voxelview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("world: {}", voxelview_world::crate_info());
            println!("render: {}", voxelview_render::crate_info());
            println!("tools: {}", voxelview_tools::crate_info());
            println!(
                "chunk size: {}, default pregen size: {:?}",
                voxelview_common::CHUNK_SIZE,
                config.world.pregen_size
            );
        }
        Commands::Pregen { size, json, chunks } => pregen(&config, size, json, chunks)?,
        Commands::Frames { count, yaw_step } => frames(&config, count, yaw_step)?,
    }

    Ok(())
}
