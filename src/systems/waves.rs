use anyhow::Result;
use glam::Vec2;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    palette::{Palette, Rgb},
    rng::SystemRng,
    world::World,
};

pub const INITIAL_ALPHA: f32 = 255.0;
pub const ALPHA_DECAY: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyWave {
    pub origin: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub alpha: f32,
    pub color: Rgb,
    pub speed: f32,
}

impl EnergyWave {
    fn expired(&self) -> bool {
        self.alpha <= 0.0 || self.radius >= self.max_radius
    }
}

/// Expanding rings that fade as they grow.
#[derive(Debug, Clone, Default)]
pub struct WaveSystem;

impl WaveSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn spawn<R: Rng + ?Sized>(
        waves: &mut Vec<EnergyWave>,
        origin: Vec2,
        intensity: f32,
        palette: &Palette,
        rng: &mut R,
    ) {
        let max_radius = rng.gen_range(200.0..400.0) * intensity;
        let color = palette.choose(rng);
        let speed = rng.gen_range(3.0..6.0) * intensity;
        waves.push(EnergyWave {
            origin,
            radius: 0.0,
            max_radius,
            alpha: INITIAL_ALPHA,
            color,
            speed,
        });
    }

    pub fn update(waves: &mut Vec<EnergyWave>) {
        for wave in waves.iter_mut() {
            wave.radius += wave.speed;
            wave.alpha -= ALPHA_DECAY;
        }
        waves.retain(|wave| !wave.expired());
    }
}

impl System for WaveSystem {
    fn name(&self) -> &str {
        "waves"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if world.show_waves {
            Self::update(&mut world.waves);
        }
        Ok(())
    }
}
