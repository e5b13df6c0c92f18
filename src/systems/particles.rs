use std::f32::consts::TAU;

use anyhow::Result;
use glam::Vec2;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    palette::{Palette, Rgb},
    rng::SystemRng,
    world::{intensity_tenths, Canvas, World},
};

pub const INITIAL_LIFE: i32 = 255;
pub const LIFE_DECAY: i32 = 2;
pub const DRAG: f32 = 0.98;
pub const ATTRACTION_FORCE: f32 = 0.1;
pub const MAX_PARTICLES: usize = 800;
pub const EVICTION_BATCH: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub life: i32,
    pub size: f32,
    pub color: Rgb,
}

impl Particle {
    fn step(&mut self, attractor: Option<Vec2>) {
        if let Some(target) = attractor {
            self.acceleration += (target - self.position).normalize_or_zero() * ATTRACTION_FORCE;
        }
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
        self.velocity *= DRAG;
        self.life -= LIFE_DECAY;
    }

    fn alive_in(&self, canvas: &Canvas) -> bool {
        self.life > 0 && canvas.contains(self.position)
    }
}

/// Particle bursts: spawning and per-tick physics for `World::particles`.
///
/// The collection is ordered by spawn time, so the front holds the oldest
/// particles. Both pointer attraction and the population cap are optional.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pointer_attraction: bool,
    capacity_cap: bool,
}

impl ParticleSystem {
    pub fn new(pointer_attraction: bool, capacity_cap: bool) -> Self {
        Self {
            pointer_attraction,
            capacity_cap,
        }
    }

    /// `floor(10 × intensity) + (count mod 5)`.
    pub fn spawn_count(count: u64, intensity: f32) -> usize {
        (intensity_tenths(intensity) + count % 5) as usize
    }

    /// Adds a radial burst at `origin` and returns how many particles it made.
    pub fn spawn<R: Rng + ?Sized>(
        particles: &mut Vec<Particle>,
        origin: Vec2,
        count: u64,
        intensity: f32,
        palette: &Palette,
        rng: &mut R,
    ) -> usize {
        let n = Self::spawn_count(count, intensity);
        particles.reserve(n);
        for _ in 0..n {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(2.0..8.0) * intensity;
            particles.push(Particle {
                position: origin,
                velocity: Vec2::from_angle(angle) * speed,
                acceleration: Vec2::ZERO,
                life: INITIAL_LIFE,
                size: rng.gen_range(5.0..20.0) * intensity,
                color: palette.choose(rng),
            });
        }
        n
    }

    /// Advances every particle one tick. `pointer` is the attraction target
    /// while the pointer is held down; it is ignored unless attraction is on.
    pub fn update(&self, particles: &mut Vec<Particle>, canvas: &Canvas, pointer: Option<Vec2>) {
        if self.capacity_cap {
            while particles.len() > MAX_PARTICLES {
                let batch = EVICTION_BATCH.min(particles.len());
                particles.drain(..batch);
            }
        }
        let attractor = pointer.filter(|_| self.pointer_attraction);
        for particle in particles.iter_mut() {
            particle.step(attractor);
        }
        particles.retain(|p| p.alive_in(canvas));
    }
}

impl System for ParticleSystem {
    fn name(&self) -> &str {
        "particles"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.show_particles {
            return Ok(());
        }
        let pointer = world.pointer.pressed.then_some(world.pointer.position);
        self.update(&mut world.particles, &world.canvas, pointer);
        Ok(())
    }
}
