use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn, LevelFilter};

use resonance::{
    controls::Command,
    engine::SystemRunReport,
    sensors::{
        node::{EmulatedBoard, SensorNode, READ_INTERVAL_MS},
        LiveSource, SensorSource, SimulatedSource,
    },
    sketch::{Sketch, SketchLoader, Variant},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ecosystem of Resonance sketch runner")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run a sketch headless for a fixed number of frames
    Run {
        /// Path to the sketch YAML file
        #[arg(long, default_value = "sketches/live.yaml")]
        config: PathBuf,

        /// Override frame count (uses the sketch default when omitted)
        #[arg(long)]
        ticks: Option<u64>,

        /// Sensor line source for live sketches: a file path, or `-` for stdin
        #[arg(long)]
        sensor: Option<String>,

        /// Override the sketch seed
        #[arg(long)]
        seed: Option<u64>,

        /// Start running immediately instead of waiting on the start toggle
        #[arg(long)]
        start: bool,

        /// Pace frames at the sketch frame rate
        #[arg(long)]
        realtime: bool,
    },
    /// Print sensor node records as the firmware would
    Emulate {
        /// Number of records to print (runs until interrupted when omitted)
        #[arg(long)]
        readings: Option<u64>,

        #[arg(long, default_value_t = READ_INTERVAL_MS)]
        interval_ms: u64,

        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Serve the browser viewer
    Serve {
        #[arg(long, default_value = "sketches/live.yaml")]
        config: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        port: u16,

        #[arg(long)]
        sensor: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Mode::Run {
            config,
            ticks,
            sensor,
            seed,
            start,
            realtime,
        } => {
            let mut sketch = load_sketch(&config)?;
            init_logging(&sketch.logging.level);
            if let Some(seed) = seed {
                sketch.seed = seed;
            }
            run_headless(&sketch, ticks, sensor.as_deref(), start, realtime)
        }
        Mode::Emulate {
            readings,
            interval_ms,
            seed,
        } => {
            init_logging("warn");
            emulate(readings, Duration::from_millis(interval_ms), seed)
        }
        Mode::Serve {
            config,
            host,
            port,
            sensor,
        } => {
            let sketch = load_sketch(&config)?;
            init_logging(&sketch.logging.level);
            let source = sensor_source(&sketch, sensor.as_deref());
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(web::run(WebServerConfig {
                sketch,
                source,
                host,
                port,
            }))
        }
    }
}

fn load_sketch(path: &Path) -> Result<Sketch> {
    SketchLoader::new(".").load(path)
}

/// `RUST_LOG` wins over the sketch's configured level.
fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::builder()
        .filter_level(filter)
        .parse_default_env()
        .init();
}

fn sensor_source(sketch: &Sketch, sensor: Option<&str>) -> Box<dyn SensorSource> {
    match sketch.variant {
        Variant::Simulated => Box::new(SimulatedSource::default()),
        Variant::Live => match sensor {
            Some("-") => Box::new(LiveSource::spawn_reader(BufReader::new(io::stdin()))),
            Some(path) => match File::open(path) {
                Ok(file) => Box::new(LiveSource::spawn_reader(BufReader::new(file))),
                Err(err) => {
                    warn!("sensor connection failed ({path}: {err}); running on defaults");
                    Box::new(LiveSource::disconnected())
                }
            },
            None => {
                warn!("no sensor attached; running on defaults");
                Box::new(LiveSource::disconnected())
            }
        },
    }
}

fn run_headless(
    sketch: &Sketch,
    ticks: Option<u64>,
    sensor: Option<&str>,
    start: bool,
    realtime: bool,
) -> Result<()> {
    let mut world = sketch.build_world();
    let mut engine = sketch.build_engine(sensor_source(sketch, sensor));
    if start && !world.active {
        engine.submit(Command::ToggleActive);
    }
    let ticks = sketch.ticks(ticks);
    let interval = sketch.frame_interval();
    let report_every = (sketch.frame_rate.round() as u64).max(1);

    info!(
        "sketch '{}' ({:?}) running {} frames with systems {:?}",
        sketch.name,
        sketch.variant,
        ticks,
        engine.system_names()
    );

    let mut motion_events = 0;
    engine.run_with_hook(&mut world, ticks, interval, |summary| {
        motion_events += summary.motion_events;
        if summary.tick > 0 && summary.tick % report_every == 0 && summary.simulated {
            let stats = &summary.frame.stats;
            info!(
                "tick {}: {} particles, {} waves, {:.1}°C, {:.1}% humidity",
                stats.tick, stats.particles, stats.waves, stats.temperature, stats.humidity
            );
            debug!("tick {} timings: {}", stats.tick, timing_line(&summary.system_reports));
        }
        if realtime {
            thread::sleep(interval);
        }
    })?;

    println!(
        "Sketch '{}' completed for {} frames. Motion events: {}, particles alive: {}, \
         waves alive: {}",
        sketch.name,
        ticks,
        motion_events,
        world.particles.len(),
        world.waves.len()
    );
    Ok(())
}

fn timing_line(reports: &[SystemRunReport]) -> String {
    reports
        .iter()
        .map(|report| format!("{}={:.3}ms", report.name, report.duration_ms))
        .collect::<Vec<_>>()
        .join(" ")
}

fn emulate(readings: Option<u64>, interval: Duration, seed: u64) -> Result<()> {
    let mut node = SensorNode::new();
    let mut board = EmulatedBoard::new(seed);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Ecosystem of Resonance sensor node")?;
    writeln!(out, "Warming up sensors...")?;

    let mut printed = 0;
    while readings.map_or(true, |limit| printed < limit) {
        let climate = board.read_climate();
        let pir = board.read_pir();
        let timestamp = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        match node.cycle(climate, pir, timestamp) {
            Some(sample) => {
                writeln!(out, "{}", serde_json::to_string(&sample)?)?;
                printed += 1;
            }
            None => writeln!(out, "Error reading DHT22 sensor")?,
        }
        out.flush()?;
        thread::sleep(interval);
    }
    Ok(())
}
