use std::{sync::mpsc::Sender, time::Duration};

use resonance::{
    audio::AudioStyle,
    controls::{ClickAction, Command},
    engine::{Engine, EngineBuilder, EngineSettings},
    render::FrameBuilder,
    sensors::{LiveSource, SensorSource, SimulatedSource},
    sketch::{Sketch, Variant},
    systems::{
        AudioDirector, EventDispatcher, ParticleSystem, SensorStateTracker, SpawnCountFormula,
        WaveSystem, DEFAULT_MOTION_TIMEOUT,
    },
    world::{Canvas, World},
};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn build_engine(seed: u64, source: Box<dyn SensorSource>) -> EngineBuilder {
    let settings = EngineSettings {
        sketch_name: "engine_tests".into(),
        seed,
        click_action: ClickAction::Burst,
        frames: FrameBuilder {
            halo: true,
            double_ring: true,
            full_panel: true,
        },
    };
    EngineBuilder::new(settings)
        .with_system(SensorStateTracker::new(source, DEFAULT_MOTION_TIMEOUT))
        .with_system(EventDispatcher::new(SpawnCountFormula::Scaled, AudioStyle::Full))
        .with_system(ParticleSystem::new(true, true))
        .with_system(WaveSystem::new())
        .with_system(AudioDirector::new(AudioStyle::Full))
}

fn live_engine(seed: u64) -> (Sender<String>, Engine) {
    let (tx, source) = LiveSource::channel();
    (tx, build_engine(seed, Box::new(source)).build())
}

fn world() -> World {
    World::new(Canvas::new(1280.0, 720.0))
}

fn motion_line(count: u64) -> String {
    format!(r#"{{"temperature": 24.0, "humidity": 55.0, "motion": 1, "count": {count}}}"#)
}

fn still_line(count: u64) -> String {
    format!(r#"{{"temperature": 24.0, "humidity": 55.0, "motion": 0, "count": {count}}}"#)
}

#[test]
fn engine_runs_hook_each_tick() {
    let sketch = Sketch::preset(Variant::Simulated);
    let mut world = sketch.build_world();
    let mut engine = sketch.build_engine(Box::new(SimulatedSource::default()));

    let mut ticks = Vec::new();
    let mut timed = Vec::new();
    engine
        .run_with_hook(&mut world, 6, sketch.frame_interval(), |summary| {
            ticks.push(summary.tick);
            timed = summary
                .system_reports
                .iter()
                .map(|report| report.name.clone())
                .collect();
            assert!(summary.system_reports.iter().all(|r| r.duration_ms >= 0.0));
        })
        .expect("run succeeds");

    assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(timed, vec!["sensors", "dispatch", "particles", "waves", "audio"]);
    assert_eq!(
        engine.system_names(),
        vec!["sensors", "dispatch", "particles", "waves", "audio"]
    );
}

#[test]
fn same_seed_gives_identical_frames() {
    let run = |seed: u64| {
        let mut sketch = Sketch::preset(Variant::Simulated);
        sketch.seed = seed;
        let mut world = sketch.build_world();
        let mut engine = sketch.build_engine(Box::new(SimulatedSource::default()));
        let mut frames = Vec::new();
        engine
            .run_with_hook(&mut world, 400, sketch.frame_interval(), |summary| {
                frames.push(serde_json::to_string(&summary.frame).expect("frame serializes"));
            })
            .expect("run succeeds");
        frames
    };

    assert_eq!(run(11), run(11));
    assert_ne!(run(11), run(12));
}

#[test]
fn paused_world_renders_without_simulating() {
    let (tx, mut engine) = live_engine(3);
    let mut world = world();
    world.active = false;

    tx.send(motion_line(3)).unwrap();
    let summary = engine.tick(&mut world, ms(16)).unwrap();
    assert!(!summary.simulated);
    assert_eq!(summary.tick, 0);
    assert!(world.particles.is_empty());
    assert!(summary.frame.texts().any(|t| t == "ECOSYSTEM OF RESONANCE"));

    // The buffered line is picked up once the sketch starts.
    engine.submit(Command::ToggleActive);
    let summary = engine.tick(&mut world, ms(32)).unwrap();
    assert!(summary.simulated);
    assert_eq!(summary.tick, 1);
    assert_eq!(summary.motion_events, 1);
    assert!(world.audio_enabled);
    // floor(10 × 1.0) + 3 mod 5
    assert_eq!(world.particles.len(), 13);
    assert_eq!(world.waves.len(), 1);
    assert!(summary.frame.cues.len() >= 5);
}

#[test]
fn motion_flag_lapses_just_after_timeout() {
    let (tx, mut engine) = live_engine(5);
    let mut world = world();

    tx.send(motion_line(1)).unwrap();
    let first = engine.tick(&mut world, ms(0)).unwrap();
    assert_eq!(first.motion_events, 1);
    assert!(world.sensors.motion_active);

    // Still high: no second edge.
    tx.send(motion_line(1)).unwrap();
    assert_eq!(engine.tick(&mut world, ms(500)).unwrap().motion_events, 0);

    engine.tick(&mut world, ms(999)).unwrap();
    assert!(world.sensors.motion_active);
    engine.tick(&mut world, ms(1001)).unwrap();
    assert!(!world.sensors.motion_active);

    tx.send(still_line(1)).unwrap();
    assert_eq!(engine.tick(&mut world, ms(1050)).unwrap().motion_events, 0);
    tx.send(motion_line(2)).unwrap();
    assert_eq!(engine.tick(&mut world, ms(1100)).unwrap().motion_events, 1);
    assert_eq!(world.sensors.motion_count, 2);
}

#[test]
fn malformed_lines_leave_state_untouched() {
    let (tx, mut engine) = live_engine(5);
    let mut world = world();
    tx.send("Ecosystem of Resonance sensor node".into()).unwrap();
    tx.send(r#"{"temperature": 31.0, "humid"#.into()).unwrap();
    let summary = engine.tick(&mut world, ms(16)).unwrap();
    assert_eq!(summary.motion_events, 0);
    assert_eq!(world.sensors.temperature, 22.0);
    assert_eq!(world.sensors.humidity, 50.0);
    assert_eq!(world.sensors.motion_count, 0);
}

#[test]
fn reset_clears_everything_on_the_next_tick() {
    let (tx, mut engine) = live_engine(8);
    let mut world = world();
    tx.send(motion_line(4)).unwrap();
    engine.tick(&mut world, ms(16)).unwrap();
    assert!(!world.particles.is_empty());
    assert_eq!(world.sensors.motion_count, 4);

    engine.submit(Command::Reset);
    engine.tick(&mut world, ms(32)).unwrap();
    assert!(world.particles.is_empty());
    assert!(world.waves.is_empty());
    assert_eq!(world.sensors.motion_count, 0);
}

#[test]
fn pointer_press_bursts_under_the_pointer() {
    let (_tx, mut engine) = live_engine(9);
    let mut world = world();
    engine.submit(Command::PointerDown { x: 100.0, y: 100.0 });
    let summary = engine.tick(&mut world, ms(16)).unwrap();

    assert_eq!(summary.motion_events, 0);
    // floor(10 × 1.0) + floor(5 × 1.0) mod 5
    assert_eq!(world.particles.len(), 10);
    assert_eq!(world.waves.len(), 1);
    assert_eq!(world.waves[0].origin.x, 100.0);
    assert_eq!(world.waves[0].origin.y, 100.0);
    assert!(world.pointer.pressed);

    engine.submit(Command::PointerUp);
    engine.tick(&mut world, ms(32)).unwrap();
    assert!(!world.pointer.pressed);
}

#[test]
fn test_detection_runs_the_motion_handler() {
    let (_tx, mut engine) = live_engine(10);
    let mut world = world();
    engine.submit(Command::TestDetection);
    let summary = engine.tick(&mut world, ms(16)).unwrap();
    assert_eq!(summary.motion_events, 1);
    assert_eq!(world.particles.len(), 10);
    assert_eq!(world.waves.len(), 1);
}

#[test]
fn intensity_steps_stay_in_range() {
    let (_tx, mut engine) = live_engine(1);
    let mut world = world();
    for _ in 0..20 {
        engine.submit(Command::IntensityUp);
    }
    engine.tick(&mut world, ms(16)).unwrap();
    assert_eq!(world.intensity, 2.0);

    for _ in 0..20 {
        engine.submit(Command::IntensityDown);
    }
    engine.tick(&mut world, ms(32)).unwrap();
    assert_eq!(world.intensity, 0.5);

    engine.submit(Command::IntensityUp);
    engine.tick(&mut world, ms(48)).unwrap();
    assert_eq!(world.intensity, 0.6);
}

#[test]
fn hidden_layers_freeze_their_collection() {
    let (tx, mut engine) = live_engine(2);
    let mut world = world();
    tx.send(motion_line(1)).unwrap();
    engine.tick(&mut world, ms(16)).unwrap();
    let radius = world.waves[0].radius;

    engine.submit(Command::ToggleWaves);
    engine.tick(&mut world, ms(32)).unwrap();
    engine.tick(&mut world, ms(48)).unwrap();
    assert!(!world.show_waves);
    assert_eq!(world.waves[0].radius, radius);
}

#[test]
fn idle_engine_keeps_collections_empty() {
    let mut engine = build_engine(4, Box::new(LiveSource::disconnected())).build();
    let mut world = world();
    engine
        .run(&mut world, 30, Duration::from_millis(16))
        .expect("run succeeds");
    assert!(world.particles.is_empty());
    assert!(world.waves.is_empty());
    assert_eq!(world.tick(), 30);
}
