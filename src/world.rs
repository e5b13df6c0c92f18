use std::time::Duration;

use glam::Vec2;
use serde::Serialize;

use crate::{
    audio::AudioCue,
    sensors::{MotionEvent, SensorState},
    systems::{EnergyWave, Particle},
};

pub const INTENSITY_MIN: f32 = 0.5;
pub const INTENSITY_MAX: f32 = 2.0;
pub const INTENSITY_STEP: f32 = 0.1;

/// Intensity as a whole number of tenths. Every reachable intensity is a
/// multiple of 0.1, and this stays exact where `10.0 * intensity` would not.
pub fn intensity_tenths(intensity: f32) -> u64 {
    (intensity * 10.0).round().max(0.0) as u64
}

/// Rounds to the nearest tenth.
pub fn snap_intensity(intensity: f32) -> f32 {
    intensity_tenths(intensity) as f32 / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Closed rectangle [0,width]×[0,height].
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    pub position: Vec2,
    pub pressed: bool,
}

/// Counts reported alongside each frame.
#[derive(Debug, Clone, Serialize)]
pub struct WorldStats {
    pub tick: u64,
    pub particles: usize,
    pub waves: usize,
    pub motion_count: u64,
    pub motion_active: bool,
    pub temperature: f32,
    pub humidity: f32,
    pub intensity: f32,
    pub active: bool,
}

/// The whole mutable simulation state. One driver owns it and lends it to the
/// engine for each tick.
pub struct World {
    tick: u64,
    elapsed: Duration,
    motion_events: u64,
    pub canvas: Canvas,
    pub intensity: f32,
    pub particles: Vec<Particle>,
    pub waves: Vec<EnergyWave>,
    pub sensors: SensorState,
    pub active: bool,
    pub show_waves: bool,
    pub show_particles: bool,
    pub audio_enabled: bool,
    pub pointer: PointerState,
    pub(crate) pending_motion: Vec<MotionEvent>,
    pub(crate) pending_bursts: Vec<Vec2>,
    pub(crate) cues: Vec<AudioCue>,
}

impl World {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            tick: 0,
            elapsed: Duration::ZERO,
            motion_events: 0,
            canvas,
            intensity: 1.0,
            particles: Vec::new(),
            waves: Vec::new(),
            sensors: SensorState::default(),
            active: true,
            show_waves: true,
            show_particles: true,
            audio_enabled: false,
            pointer: PointerState::default(),
            pending_motion: Vec::new(),
            pending_bursts: Vec::new(),
            cues: Vec::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Motion events dispatched since the world was created.
    pub fn motion_events(&self) -> u64 {
        self.motion_events
    }

    pub fn advance_time(&mut self, now: Duration) {
        self.tick += 1;
        self.elapsed = now;
    }

    pub(crate) fn record_motion_event(&mut self) {
        self.motion_events += 1;
    }

    /// Queues a motion event built from the current sensor state, as if the
    /// sensor had just fired.
    pub fn queue_motion(&mut self, now: Duration) {
        let event = MotionEvent::from_state(&self.sensors, now);
        self.pending_motion.push(event);
    }

    pub fn queue_burst(&mut self, at: Vec2) {
        self.pending_bursts.push(at);
    }

    /// Steps intensity by `delta`, clamped and snapped to one decimal so
    /// repeated steps do not drift.
    pub fn adjust_intensity(&mut self, delta: f32) {
        let next = (self.intensity + delta).clamp(INTENSITY_MIN, INTENSITY_MAX);
        self.intensity = snap_intensity(next);
    }

    /// Clears particles, waves and the motion counter.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.waves.clear();
        self.pending_motion.clear();
        self.pending_bursts.clear();
        self.sensors.motion_count = 0;
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            tick: self.tick,
            particles: self.particles.len(),
            waves: self.waves.len(),
            motion_count: self.sensors.motion_count,
            motion_active: self.sensors.motion_active,
            temperature: self.sensors.temperature,
            humidity: self.sensors.humidity,
            intensity: self.intensity,
            active: self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_steps_are_clamped() {
        let mut world = World::new(Canvas::new(100.0, 100.0));
        for _ in 0..30 {
            world.adjust_intensity(INTENSITY_STEP);
        }
        assert_eq!(world.intensity, INTENSITY_MAX);
        for _ in 0..30 {
            world.adjust_intensity(-INTENSITY_STEP);
        }
        assert_eq!(world.intensity, INTENSITY_MIN);
    }

    #[test]
    fn intensity_steps_do_not_drift() {
        let mut world = World::new(Canvas::new(100.0, 100.0));
        for _ in 0..3 {
            world.adjust_intensity(-INTENSITY_STEP);
        }
        assert_eq!(world.intensity, 0.7);
        assert_eq!(intensity_tenths(world.intensity), 7);
    }

    #[test]
    fn tenths_are_exact_for_every_step() {
        let mut world = World::new(Canvas::new(100.0, 100.0));
        world.intensity = INTENSITY_MIN;
        for expected in 5..=20 {
            assert_eq!(intensity_tenths(world.intensity), expected);
            world.adjust_intensity(INTENSITY_STEP);
        }
        assert_eq!(snap_intensity(1.56), 1.6);
    }

    #[test]
    fn canvas_bounds_are_inclusive() {
        let canvas = Canvas::new(200.0, 100.0);
        assert!(canvas.contains(Vec2::new(0.0, 0.0)));
        assert!(canvas.contains(Vec2::new(200.0, 100.0)));
        assert!(!canvas.contains(Vec2::new(-0.1, 50.0)));
        assert!(!canvas.contains(Vec2::new(50.0, 100.1)));
        assert_eq!(canvas.center(), Vec2::new(100.0, 50.0));
    }
}
