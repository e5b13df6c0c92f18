use anyhow::Result;
use glam::Vec2;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    audio::{self, AudioStyle},
    engine::{System, SystemContext},
    palette::select_palette,
    rng::SystemRng,
    sensors::MotionEvent,
    systems::{ParticleSystem, WaveSystem},
    world::{intensity_tenths, World},
};

/// Maximum offset of a motion burst from the canvas center, per axis.
pub const ORIGIN_JITTER: f32 = 100.0;
/// Count fed to the particle spawner for a pointer burst, before scaling.
pub const BURST_COUNT: u64 = 5;

/// How the motion count becomes the `count` argument of a particle spawn.
///
/// The live and simulated sketches disagree here; both behaviours are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCountFormula {
    /// `floor(motion_count × intensity)`, computed in tenths.
    Scaled,
    /// `motion_count` as is.
    Raw,
}

impl SpawnCountFormula {
    pub fn count(self, motion_count: u64, intensity: f32) -> u64 {
        match self {
            SpawnCountFormula::Scaled => motion_count * intensity_tenths(intensity) / 10,
            SpawnCountFormula::Raw => motion_count,
        }
    }
}

/// Turns queued motion events and pointer bursts into particles, waves and
/// audio cues.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    formula: SpawnCountFormula,
    audio_style: AudioStyle,
}

impl EventDispatcher {
    pub fn new(formula: SpawnCountFormula, audio_style: AudioStyle) -> Self {
        Self {
            formula,
            audio_style,
        }
    }

    pub fn handle_motion<R: Rng + ?Sized>(
        &self,
        world: &mut World,
        event: &MotionEvent,
        rng: &mut R,
    ) {
        let center = world.canvas.center();
        let origin = Vec2::new(
            center.x + rng.gen_range(-ORIGIN_JITTER..=ORIGIN_JITTER),
            center.y + rng.gen_range(-ORIGIN_JITTER..=ORIGIN_JITTER),
        );
        let palette = select_palette(event.temperature);
        let count = self.formula.count(event.count, world.intensity);
        let spawned = ParticleSystem::spawn(
            &mut world.particles,
            origin,
            count,
            world.intensity,
            &palette,
            rng,
        );
        WaveSystem::spawn(&mut world.waves, origin, world.intensity, &palette, rng);
        if world.audio_enabled {
            let cues = audio::motion_cue(event.temperature, self.audio_style, rng);
            world.cues.extend(cues);
        }
        world.record_motion_event();
        debug!(
            "motion #{} at ({:.0}, {:.0}): {} particles, {:?} palette",
            event.count, origin.x, origin.y, spawned, palette.kind
        );
    }

    /// Pointer-triggered burst: particles and one ring exactly at `at`.
    pub fn burst<R: Rng + ?Sized>(&self, world: &mut World, at: Vec2, rng: &mut R) {
        let palette = select_palette(world.sensors.temperature);
        let count = BURST_COUNT * intensity_tenths(world.intensity) / 10;
        ParticleSystem::spawn(&mut world.particles, at, count, world.intensity, &palette, rng);
        WaveSystem::spawn(&mut world.waves, at, world.intensity, &palette, rng);
    }
}

impl System for EventDispatcher {
    fn name(&self) -> &str {
        "dispatch"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let events = std::mem::take(&mut world.pending_motion);
        for event in &events {
            self.handle_motion(world, event, rng);
        }
        let bursts = std::mem::take(&mut world.pending_bursts);
        for at in bursts {
            self.burst(world, at, rng);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Canvas;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn event(count: u64, temperature: f32) -> MotionEvent {
        MotionEvent {
            at: Duration::ZERO,
            count,
            temperature,
        }
    }

    #[test]
    fn formulas_differ_only_when_scaled() {
        assert_eq!(SpawnCountFormula::Scaled.count(7, 1.0), 7);
        assert_eq!(SpawnCountFormula::Raw.count(7, 1.0), 7);
        assert_eq!(SpawnCountFormula::Scaled.count(7, 1.5), 10);
        assert_eq!(SpawnCountFormula::Raw.count(7, 1.5), 7);
        assert_eq!(SpawnCountFormula::Scaled.count(3, 0.5), 1);
    }

    #[test]
    fn scaled_count_is_exact_at_stepped_intensities() {
        let mut world = World::new(Canvas::new(640.0, 480.0));
        for _ in 0..3 {
            world.adjust_intensity(-crate::world::INTENSITY_STEP);
        }
        assert_eq!(SpawnCountFormula::Scaled.count(10, world.intensity), 7);
        assert_eq!(ParticleSystem::spawn_count(7, world.intensity), 9);

        for (intensity, expected) in [(0.9, 9), (1.3, 13), (1.4, 14), (1.8, 18), (1.9, 19)] {
            assert_eq!(SpawnCountFormula::Scaled.count(10, intensity), expected);
        }
        assert_eq!(SpawnCountFormula::Scaled.count(20, 0.7), 14);
        assert_eq!(SpawnCountFormula::Scaled.count(7, 1.3), 9);
    }

    #[test]
    fn motion_spawns_near_center() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut world = World::new(Canvas::new(1000.0, 800.0));
        let dispatcher = EventDispatcher::new(SpawnCountFormula::Scaled, AudioStyle::Full);
        dispatcher.handle_motion(&mut world, &event(7, 22.0), &mut rng);
        assert_eq!(world.particles.len(), 12);
        assert_eq!(world.waves.len(), 1);
        let origin = world.waves[0].origin;
        assert!((400.0..=600.0).contains(&origin.x));
        assert!((300.0..=500.0).contains(&origin.y));
        assert!(world.particles.iter().all(|p| p.position == origin));
        assert_eq!(world.motion_events(), 1);
    }

    #[test]
    fn scaled_and_raw_counts_diverge_with_intensity() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut scaled = World::new(Canvas::new(1000.0, 800.0));
        scaled.intensity = 1.5;
        let mut raw = World::new(Canvas::new(1000.0, 800.0));
        raw.intensity = 1.5;
        EventDispatcher::new(SpawnCountFormula::Scaled, AudioStyle::Full).handle_motion(
            &mut scaled,
            &event(7, 22.0),
            &mut rng,
        );
        EventDispatcher::new(SpawnCountFormula::Raw, AudioStyle::Simple).handle_motion(
            &mut raw,
            &event(7, 22.0),
            &mut rng,
        );
        // floor(10×1.5) + floor(7×1.5) mod 5 versus floor(10×1.5) + 7 mod 5
        assert_eq!(scaled.particles.len(), 15);
        assert_eq!(raw.particles.len(), 17);
    }

    #[test]
    fn audio_cue_only_when_enabled() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let dispatcher = EventDispatcher::new(SpawnCountFormula::Scaled, AudioStyle::Full);
        let mut world = World::new(Canvas::new(640.0, 480.0));
        dispatcher.handle_motion(&mut world, &event(1, 30.0), &mut rng);
        assert!(world.cues.is_empty());
        world.audio_enabled = true;
        dispatcher.handle_motion(&mut world, &event(2, 30.0), &mut rng);
        assert_eq!(world.cues.len(), 2);
    }

    #[test]
    fn palette_follows_event_temperature() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let dispatcher = EventDispatcher::new(SpawnCountFormula::Raw, AudioStyle::Simple);
        let mut world = World::new(Canvas::new(640.0, 480.0));
        dispatcher.handle_motion(&mut world, &event(0, 16.0), &mut rng);
        let cool = crate::palette::COOL;
        assert!(world.particles.iter().all(|p| cool.colors.contains(&p.color)));
        assert!(cool.colors.contains(&world.waves[0].color));
    }

    #[test]
    fn burst_lands_on_pointer() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let dispatcher = EventDispatcher::new(SpawnCountFormula::Scaled, AudioStyle::Full);
        let mut world = World::new(Canvas::new(640.0, 480.0));
        let at = Vec2::new(50.0, 60.0);
        dispatcher.burst(&mut world, at, &mut rng);
        // floor(10) + floor(5×1.0) mod 5
        assert_eq!(world.particles.len(), 10);
        assert_eq!(world.waves[0].origin, at);
        assert_eq!(world.motion_events(), 0);
    }
}
