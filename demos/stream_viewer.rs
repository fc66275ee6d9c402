//! Streaming viewer demo
//!
//! A publisher thread sends synthetic point frames over an in-process channel
//! while the viewer decodes and renders them headlessly. Run with
//! `RUST_LOG=debug` to see every applied frame.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use livecloud_core::{Point3d, PointSet};
use livecloud_io::{channel, ChannelPublisher};
use livecloud_visualization::{HeadlessRenderer, StopToken, StreamViewer, ViewerConfig};
use rand::Rng;

#[derive(Parser, Debug, Clone)]
#[command(name = "stream_viewer", about = "Render a synthetic point stream as instanced spheres")]
struct Args {
    /// Number of frames to render
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Points per published frame
    #[arg(long, default_value_t = 500)]
    points: usize,

    /// Viewer configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between published frames
    #[arg(long, default_value_t = 33)]
    publish_interval_ms: u64,

    /// Vary the point count between frames
    #[arg(long)]
    vary_cardinality: bool,

    /// Add uniform noise to every point
    #[arg(long, default_value_t = 0.0)]
    noise: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    println!("Streaming viewer demo");
    println!("=====================");
    println!("Topic: {}", config.topic);
    println!("Frames: {}", args.frames);
    println!("Points per frame: {}", args.points);
    println!();

    let (publisher, source) = channel();
    let topic = config.topic.clone();
    let mut viewer = StreamViewer::new(config, source, HeadlessRenderer::new())?;

    let stop = viewer.stop_token();
    let publisher_thread = {
        let stop = stop.clone();
        let args = args.clone();
        thread::spawn(move || publish_frames(publisher, &topic, &args, &stop))
    };

    let frames = viewer.run(Some(args.frames))?;
    stop.stop();

    let published = publisher_thread
        .join()
        .map_err(|_| anyhow::anyhow!("Publisher thread panicked"))??;

    let uploads = viewer.renderer().uploads();
    let uploaded_bytes = viewer.renderer().uploaded_bytes();
    let bounds = viewer.view_bounds();
    let report = viewer.shutdown();

    println!("Rendered {} frames", frames);
    println!("Published {} messages, received {}", published, report.viewer.messages);
    println!(
        "Applied {} frames, skipped {}",
        report.viewer.applied, report.viewer.skipped
    );
    println!(
        "In-place updates: {}, recreations: {}, disposals: {}",
        report.sync.updates, report.sync.recreations, report.sync.disposals
    );
    println!("Uploads: {} ({} bytes)", uploads, uploaded_bytes);
    println!("Scene allocations: {}", report.scene.allocations);
    if let Some(bounds) = bounds {
        println!(
            "Last frame centered at ({:.2}, {:.2}, {:.2})",
            bounds.center.x, bounds.center.y, bounds.center.z
        );
    }
    if report.viewer.transport_errors > 0 {
        println!("Transport errors: {}", report.viewer.transport_errors);
    }

    Ok(())
}

fn publish_frames(
    publisher: ChannelPublisher,
    topic: &str,
    args: &Args,
    stop: &StopToken,
) -> anyhow::Result<u64> {
    let mut rng = rand::thread_rng();
    let mut published = 0;

    while !stop.is_stopped() {
        let count = if args.vary_cardinality {
            rng.gen_range(args.points / 2..=args.points.max(1))
        } else {
            args.points
        };

        let points = helix(count, published as f64 * 0.05, args.noise, &mut rng);
        if publisher.publish_points(topic, &points).is_err() {
            log::info!("Viewer went away after {} messages", published);
            break;
        }
        published += 1;

        thread::sleep(Duration::from_millis(args.publish_interval_ms));
    }

    Ok(published)
}

fn helix<R: Rng>(count: usize, phase: f64, noise: f64, rng: &mut R) -> PointSet {
    (0..count)
        .map(|i| {
            let t = i as f64 * 0.1 + phase;
            let jitter = |rng: &mut R| if noise > 0.0 { rng.gen_range(-noise..noise) } else { 0.0 };
            Point3d::new(
                t.cos() * 2.0 + jitter(rng),
                t.sin() * 2.0 + jitter(rng),
                i as f64 * 0.01 + jitter(rng),
            )
        })
        .collect()
}
