//! User controls and their keyboard bindings.

use std::time::Duration;

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::world::{Canvas, World, INTENSITY_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ToggleActive,
    Reset,
    ToggleWaves,
    ToggleParticles,
    IntensityUp,
    IntensityDown,
    StartAudio,
    /// Fires the motion handler as if the sensor had tripped.
    TestDetection,
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Resize { width: f32, height: f32 },
}

/// What a pointer press spawns while the sketch is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    /// A small burst right under the pointer.
    Burst,
    /// The full motion response, as if the sensor fired.
    Motion,
}

pub fn command_for_key(key: &str) -> Option<Command> {
    match key {
        "s" | "S" => Some(Command::ToggleActive),
        "r" | "R" => Some(Command::Reset),
        "e" | "E" => Some(Command::ToggleWaves),
        "p" | "P" => Some(Command::ToggleParticles),
        "+" | "=" => Some(Command::IntensityUp),
        "-" | "_" => Some(Command::IntensityDown),
        "t" | "T" => Some(Command::TestDetection),
        _ => None,
    }
}

impl Command {
    pub fn apply(self, world: &mut World, click: ClickAction, now: Duration) {
        match self {
            Command::ToggleActive => {
                world.active = !world.active;
                if world.active && !world.audio_enabled {
                    world.audio_enabled = true;
                }
                info!("system {}", if world.active { "started" } else { "paused" });
            }
            Command::Reset => world.reset(),
            Command::ToggleWaves => world.show_waves = !world.show_waves,
            Command::ToggleParticles => world.show_particles = !world.show_particles,
            Command::IntensityUp => world.adjust_intensity(INTENSITY_STEP),
            Command::IntensityDown => world.adjust_intensity(-INTENSITY_STEP),
            Command::StartAudio => world.audio_enabled = true,
            Command::TestDetection => {
                if world.active {
                    world.queue_motion(now);
                }
            }
            Command::PointerDown { x, y } => {
                let at = Vec2::new(x, y);
                world.pointer.position = at;
                world.pointer.pressed = true;
                if world.active {
                    match click {
                        ClickAction::Burst => world.queue_burst(at),
                        ClickAction::Motion => world.queue_motion(now),
                    }
                }
            }
            Command::PointerMove { x, y } => world.pointer.position = Vec2::new(x, y),
            Command::PointerUp => world.pointer.pressed = false,
            Command::Resize { width, height } => {
                world.canvas = Canvas::new(width.max(1.0), height.max(1.0));
            }
        }
    }
}
