//! Draw directives for the render collaborator.
//!
//! A [`Frame`] is everything a front-end needs to paint one tick: the
//! background fade, circles for particles and waves, and the overlay text.

use serde::Serialize;

use crate::{
    audio::AudioCue,
    palette::Rgb,
    world::{Canvas, World, WorldStats},
};

/// Alpha of the black fill laid over the previous frame; low values leave
/// motion trails.
pub const BACKGROUND_ALPHA: f32 = 20.0;
pub const HALO_SCALE: f32 = 2.0;
pub const HALO_ALPHA: f32 = 0.3;
pub const WAVE_STROKE: f32 = 3.0;
pub const OUTER_RING_GAP: f32 = 10.0;
pub const PANEL_LINE_HEIGHT: f32 = 20.0;
pub const PANEL_TEXT_SIZE: f32 = 12.0;

const TEXT_ALPHA: f32 = 200.0;
const WHITE: Rgb = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawDirective {
    FillCircle {
        x: f32,
        y: f32,
        diameter: f32,
        color: Rgb,
        alpha: f32,
    },
    StrokeCircle {
        x: f32,
        y: f32,
        diameter: f32,
        color: Rgb,
        alpha: f32,
        weight: f32,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        align: TextAlign,
        color: Rgb,
        alpha: f32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub canvas: Canvas,
    pub background_alpha: f32,
    pub directives: Vec<DrawDirective>,
    pub cues: Vec<AudioCue>,
    pub stats: WorldStats,
}

impl Frame {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().filter_map(|d| match d {
            DrawDirective::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FrameBuilder {
    pub halo: bool,
    pub double_ring: bool,
    /// Live sketches show the audio state and key help in the panel.
    pub full_panel: bool,
}

impl FrameBuilder {
    pub fn build(&self, world: &World, cues: Vec<AudioCue>) -> Frame {
        let mut directives = Vec::new();
        if world.active {
            if world.show_waves {
                self.push_waves(world, &mut directives);
            }
            if world.show_particles {
                self.push_particles(world, &mut directives);
            }
            self.push_panel(world, &mut directives);
        } else {
            push_welcome(&world.canvas, &mut directives);
        }
        Frame {
            canvas: world.canvas,
            background_alpha: BACKGROUND_ALPHA,
            directives,
            cues,
            stats: world.stats(),
        }
    }

    fn push_waves(&self, world: &World, out: &mut Vec<DrawDirective>) {
        for wave in &world.waves {
            let diameter = wave.radius * 2.0;
            out.push(DrawDirective::StrokeCircle {
                x: wave.origin.x,
                y: wave.origin.y,
                diameter,
                color: wave.color,
                alpha: wave.alpha,
                weight: WAVE_STROKE,
            });
            if self.double_ring {
                out.push(DrawDirective::StrokeCircle {
                    x: wave.origin.x,
                    y: wave.origin.y,
                    diameter: diameter + OUTER_RING_GAP,
                    color: wave.color,
                    alpha: wave.alpha * 0.5,
                    weight: WAVE_STROKE,
                });
            }
        }
    }

    fn push_particles(&self, world: &World, out: &mut Vec<DrawDirective>) {
        for particle in &world.particles {
            let alpha = particle.life as f32;
            out.push(DrawDirective::FillCircle {
                x: particle.position.x,
                y: particle.position.y,
                diameter: particle.size,
                color: particle.color,
                alpha,
            });
            if self.halo {
                out.push(DrawDirective::FillCircle {
                    x: particle.position.x,
                    y: particle.position.y,
                    diameter: particle.size * HALO_SCALE,
                    color: particle.color,
                    alpha: alpha * HALO_ALPHA,
                });
            }
        }
    }

    fn push_panel(&self, world: &World, out: &mut Vec<DrawDirective>) {
        let sensors = &world.sensors;
        let mut lines = vec![
            format!(
                "PIR sensor: {}",
                if sensors.motion_active { "ACTIVE" } else { "INACTIVE" }
            ),
            format!("Detections: {}", sensors.motion_count),
            format!("Temperature: {:.1}°C", sensors.temperature),
            format!("Humidity: {:.1}%", sensors.humidity),
            format!("Particles: {}", world.particles.len()),
            format!("Waves: {}", world.waves.len()),
        ];
        if self.full_panel {
            lines.push(format!(
                "Audio: {}",
                if world.audio_enabled { "ON" } else { "OFF" }
            ));
        }

        let Canvas { width, height } = world.canvas;
        let top = height - PANEL_LINE_HEIGHT * lines.len() as f32;
        for (i, line) in lines.into_iter().enumerate() {
            out.push(text(
                20.0,
                top + PANEL_LINE_HEIGHT * i as f32,
                line,
                PANEL_TEXT_SIZE,
                TextAlign::Left,
            ));
        }

        if self.full_panel {
            out.push(text(
                width - 20.0,
                height - 20.0,
                "S: Start/Stop | R: Reset | E: Waves | P: Particles".to_string(),
                PANEL_TEXT_SIZE,
                TextAlign::Right,
            ));
            out.push(text(
                width - 20.0,
                height - 5.0,
                format!("+/-: Intensity ({:.1}) | Click: Burst", world.intensity),
                PANEL_TEXT_SIZE,
                TextAlign::Right,
            ));
        }
    }
}

fn push_welcome(canvas: &Canvas, out: &mut Vec<DrawDirective>) {
    let center = canvas.center();
    out.push(text(
        center.x,
        center.y - 50.0,
        "ECOSYSTEM OF RESONANCE".to_string(),
        32.0,
        TextAlign::Center,
    ));
    out.push(text(
        center.x,
        center.y + 20.0,
        "Press 'S' to start".to_string(),
        16.0,
        TextAlign::Center,
    ));
    out.push(text(
        center.x,
        center.y + 50.0,
        "Move within range of the PIR sensor".to_string(),
        16.0,
        TextAlign::Center,
    ));
}

fn text(x: f32, y: f32, text: String, size: f32, align: TextAlign) -> DrawDirective {
    DrawDirective::Text {
        x,
        y,
        text,
        size,
        align,
        color: WHITE,
        alpha: if align == TextAlign::Center { 255.0 } else { TEXT_ALPHA },
    }
}
