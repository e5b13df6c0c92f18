//! Sketch configuration: YAML files plus the two built-in presets.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    audio::AudioStyle,
    controls::ClickAction,
    engine::{Engine, EngineBuilder, EngineSettings},
    render::FrameBuilder,
    sensors::SensorSource,
    systems::{
        AudioDirector, EventDispatcher, ParticleSystem, SensorStateTracker, SpawnCountFormula,
        WaveSystem,
    },
    world::{snap_intensity, Canvas, World, INTENSITY_MAX, INTENSITY_MIN},
};

fn default_seed() -> u64 {
    42
}

fn default_frame_rate() -> f32 {
    60.0
}

fn default_intensity() -> f32 {
    1.0
}

fn default_motion_timeout_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which of the two installations a sketch follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Driven by a sensor node over a serial line.
    Live,
    /// Self-contained, with synthetic sensor readings.
    Simulated,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Per-sketch overrides of the variant preset. Anything left out keeps the
/// preset's value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BehaviorOverrides {
    pub spawn_formula: Option<SpawnCountFormula>,
    pub pointer_attraction: Option<bool>,
    pub capacity_cap: Option<bool>,
    pub halo: Option<bool>,
    pub double_ring: Option<bool>,
    pub audio_style: Option<AudioStyle>,
    pub click_action: Option<ClickAction>,
    pub start_active: Option<bool>,
    pub audio_enabled: Option<bool>,
}

/// Fully resolved switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Behavior {
    pub spawn_formula: SpawnCountFormula,
    pub pointer_attraction: bool,
    pub capacity_cap: bool,
    pub halo: bool,
    pub double_ring: bool,
    pub audio_style: AudioStyle,
    pub click_action: ClickAction,
    pub start_active: bool,
    pub audio_enabled: bool,
    pub full_panel: bool,
}

impl Behavior {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Live => Self {
                spawn_formula: SpawnCountFormula::Scaled,
                pointer_attraction: true,
                capacity_cap: true,
                halo: true,
                double_ring: true,
                audio_style: AudioStyle::Full,
                click_action: ClickAction::Burst,
                start_active: false,
                audio_enabled: false,
                full_panel: true,
            },
            Variant::Simulated => Self {
                spawn_formula: SpawnCountFormula::Raw,
                pointer_attraction: false,
                capacity_cap: false,
                halo: false,
                double_ring: false,
                audio_style: AudioStyle::Simple,
                click_action: ClickAction::Motion,
                start_active: true,
                audio_enabled: true,
                full_panel: false,
            },
        }
    }

    fn with_overrides(mut self, o: &BehaviorOverrides) -> Self {
        self.spawn_formula = o.spawn_formula.unwrap_or(self.spawn_formula);
        self.pointer_attraction = o.pointer_attraction.unwrap_or(self.pointer_attraction);
        self.capacity_cap = o.capacity_cap.unwrap_or(self.capacity_cap);
        self.halo = o.halo.unwrap_or(self.halo);
        self.double_ring = o.double_ring.unwrap_or(self.double_ring);
        self.audio_style = o.audio_style.unwrap_or(self.audio_style);
        self.click_action = o.click_action.unwrap_or(self.click_action);
        self.start_active = o.start_active.unwrap_or(self.start_active);
        self.audio_enabled = o.audio_enabled.unwrap_or(self.audio_enabled);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sketch {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub variant: Variant,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_motion_timeout_ms")]
    pub motion_timeout_ms: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub behavior: BehaviorOverrides,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("canvas must be at least 1×1, got {width}×{height}")]
    Canvas { width: f32, height: f32 },
    #[error("frame rate must be positive, got {0}")]
    FrameRate(f32),
    #[error("intensity {0} is outside [0.5, 2.0]")]
    Intensity(f32),
}

impl Sketch {
    pub fn preset(variant: Variant) -> Self {
        let name = match variant {
            Variant::Live => "live",
            Variant::Simulated => "simulated",
        };
        Self {
            name: name.to_string(),
            description: None,
            seed: default_seed(),
            variant,
            canvas: CanvasConfig::default(),
            frame_rate: default_frame_rate(),
            intensity: default_intensity(),
            motion_timeout_ms: default_motion_timeout_ms(),
            ticks: None,
            behavior: BehaviorOverrides::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let sketch: Sketch = serde_yaml::from_str(text).context("Failed to parse sketch YAML")?;
        sketch.validate()?;
        Ok(sketch)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let CanvasConfig { width, height } = self.canvas;
        if !(width >= 1.0 && height >= 1.0) {
            return Err(ConfigError::Canvas { width, height });
        }
        if !(self.frame_rate > 0.0) {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&self.intensity) {
            return Err(ConfigError::Intensity(self.intensity));
        }
        Ok(())
    }

    pub fn behavior(&self) -> Behavior {
        Behavior::preset(self.variant).with_overrides(&self.behavior)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate as f64)
    }

    pub fn motion_timeout(&self) -> Duration {
        Duration::from_millis(self.motion_timeout_ms)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(600)
    }

    pub fn build_world(&self) -> World {
        let behavior = self.behavior();
        let mut world = World::new(Canvas::new(self.canvas.width, self.canvas.height));
        world.intensity = snap_intensity(self.intensity);
        world.active = behavior.start_active;
        world.audio_enabled = behavior.audio_enabled;
        world
    }

    /// The standard pipeline: sensors, dispatch, particles, waves, audio.
    pub fn build_engine(&self, source: Box<dyn SensorSource>) -> Engine {
        let behavior = self.behavior();
        let settings = EngineSettings {
            sketch_name: self.name.clone(),
            seed: self.seed,
            click_action: behavior.click_action,
            frames: FrameBuilder {
                halo: behavior.halo,
                double_ring: behavior.double_ring,
                full_panel: behavior.full_panel,
            },
        };
        EngineBuilder::new(settings)
            .with_system(SensorStateTracker::new(source, self.motion_timeout()))
            .with_system(EventDispatcher::new(
                behavior.spawn_formula,
                behavior.audio_style,
            ))
            .with_system(ParticleSystem::new(
                behavior.pointer_attraction,
                behavior.capacity_cap,
            ))
            .with_system(WaveSystem::new())
            .with_system(AudioDirector::new(behavior.audio_style))
            .build()
    }
}

pub struct SketchLoader {
    base_dir: PathBuf,
}

impl SketchLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Sketch> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sketch file {}", path.display()))?;
        let sketch: Sketch = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        sketch
            .validate()
            .with_context(|| format!("Invalid sketch {}", path.display()))?;
        Ok(sketch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_uses_preset_defaults() {
        let sketch = Sketch::from_yaml_str("name: tiny\nvariant: live\n").unwrap();
        assert_eq!(sketch.seed, 42);
        assert_eq!(sketch.frame_rate, 60.0);
        assert_eq!(sketch.behavior(), Behavior::preset(Variant::Live));
        assert_eq!(sketch.motion_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn overrides_replace_single_switches() {
        let yaml = "name: mixed\nvariant: simulated\nbehavior:\n  \
                    capacity_cap: true\n  spawn_formula: scaled\n";
        let behavior = Sketch::from_yaml_str(yaml).unwrap().behavior();
        assert!(behavior.capacity_cap);
        assert_eq!(behavior.spawn_formula, SpawnCountFormula::Scaled);
        assert!(!behavior.pointer_attraction);
        assert_eq!(behavior.audio_style, AudioStyle::Simple);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut sketch = Sketch::preset(Variant::Live);
        sketch.intensity = 3.0;
        assert_eq!(sketch.validate(), Err(ConfigError::Intensity(3.0)));
        sketch.intensity = 1.0;
        sketch.frame_rate = 0.0;
        assert_eq!(sketch.validate(), Err(ConfigError::FrameRate(0.0)));
        sketch.frame_rate = 30.0;
        sketch.canvas.width = 0.0;
        assert!(matches!(sketch.validate(), Err(ConfigError::Canvas { .. })));
    }

    #[test]
    fn unknown_variant_fails_to_parse() {
        assert!(Sketch::from_yaml_str("name: x\nvariant: dream\n").is_err());
    }

    #[test]
    fn configured_intensity_lands_on_a_tenth() {
        let mut sketch = Sketch::preset(Variant::Live);
        sketch.intensity = 1.26;
        assert_eq!(sketch.build_world().intensity, 1.3);
    }

    #[test]
    fn world_follows_preset() {
        let live = Sketch::preset(Variant::Live).build_world();
        assert!(!live.active);
        assert!(!live.audio_enabled);
        let simulated = Sketch::preset(Variant::Simulated).build_world();
        assert!(simulated.active);
        assert!(simulated.audio_enabled);
    }
}
