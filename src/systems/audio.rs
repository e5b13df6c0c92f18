use anyhow::Result;

use crate::{
    audio::{ambient_cues, AudioStyle},
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Emits the ambient bed cues each tick while audio is on.
#[derive(Debug, Clone)]
pub struct AudioDirector {
    style: AudioStyle,
}

impl AudioDirector {
    pub fn new(style: AudioStyle) -> Self {
        Self { style }
    }
}

impl System for AudioDirector {
    fn name(&self) -> &str {
        "audio"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        // The simple style has no ambient layer.
        if !world.audio_enabled || self.style == AudioStyle::Simple {
            return Ok(());
        }
        let cues = ambient_cues(&world.sensors, rng);
        world.cues.extend(cues);
        Ok(())
    }
}
