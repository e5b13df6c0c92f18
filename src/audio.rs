//! Audio cues for the synthesis collaborator.
//!
//! The engine never makes sound itself. It emits [`AudioCue`]s derived from the
//! sensor readings and the front-end plays them however it can.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::sensors::{SensorState, HUMIDITY_RANGE, TEMPERATURE_RANGE};

/// Note lengths at the synth's default 120 BPM.
pub const QUARTER_NOTE_SEC: f32 = 0.5;
pub const EIGHTH_NOTE_SEC: f32 = 0.25;
pub const SIXTEENTH_NOTE_SEC: f32 = 0.125;

/// Gap between the two notes of a motion cue.
pub const ECHO_DELAY_SEC: f32 = 0.1;

pub const AMBIENT_TONE_PROBABILITY: f64 = 0.01;
/// Motion count at which the activity level saturates.
pub const ACTIVITY_SATURATION: f32 = 50.0;

const EVENT_RATIOS: &[f32] = &[1.0, 1.5, 2.0, 3.0];
const ECHO_RATIOS: &[f32] = &[2.0, 2.5, 3.0];
const AMBIENT_RATIOS: &[f32] = &[1.0, 1.25, 1.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStyle {
    /// Ambient pad, filtered noise bed and two-note motion cues.
    Full,
    /// A single sine blip per motion event.
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioParam {
    FilterCutoff,
    NoiseLevel,
    LfoRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioCue {
    AmbientTone {
        frequency_hz: f32,
        duration_sec: f32,
    },
    EventNote {
        frequency_hz: f32,
        duration_sec: f32,
        delay_sec: f32,
    },
    Ramp {
        param: AudioParam,
        target: f32,
        over_sec: f32,
    },
}

/// Linear re-mapping from one interval onto another, without clamping.
pub fn map_range(value: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    to.0 + (value - from.0) * (to.1 - to.0) / (from.1 - from.0)
}

fn pick<R: Rng + ?Sized>(ratios: &[f32], rng: &mut R) -> f32 {
    ratios.choose(rng).copied().unwrap_or(1.0)
}

/// Notes announcing a motion event; pitch follows temperature.
pub fn motion_cue<R: Rng + ?Sized>(
    temperature: f32,
    style: AudioStyle,
    rng: &mut R,
) -> Vec<AudioCue> {
    let base = map_range(temperature, TEMPERATURE_RANGE, (200.0, 800.0));
    match style {
        AudioStyle::Full => vec![
            AudioCue::EventNote {
                frequency_hz: base * pick(EVENT_RATIOS, rng),
                duration_sec: EIGHTH_NOTE_SEC,
                delay_sec: 0.0,
            },
            AudioCue::EventNote {
                frequency_hz: base * pick(ECHO_RATIOS, rng),
                duration_sec: SIXTEENTH_NOTE_SEC,
                delay_sec: ECHO_DELAY_SEC,
            },
        ],
        AudioStyle::Simple => vec![AudioCue::EventNote {
            frequency_hz: base * rng.gen_range(1.0..2.0),
            duration_sec: EIGHTH_NOTE_SEC,
            delay_sec: 0.0,
        }],
    }
}

/// Per-tick ambient bed: parameter ramps that track activity and humidity,
/// plus an occasional pad note.
pub fn ambient_cues<R: Rng + ?Sized>(state: &SensorState, rng: &mut R) -> Vec<AudioCue> {
    let activity = (state.motion_count as f32 / ACTIVITY_SATURATION).clamp(0.0, 1.0);
    let mut cues = vec![
        AudioCue::Ramp {
            param: AudioParam::FilterCutoff,
            target: map_range(activity, (0.0, 1.0), (300.0, 2000.0)),
            over_sec: 1.0,
        },
        AudioCue::Ramp {
            param: AudioParam::NoiseLevel,
            target: map_range(activity, (0.0, 1.0), (-35.0, -15.0)),
            over_sec: 1.0,
        },
        AudioCue::Ramp {
            param: AudioParam::LfoRate,
            target: map_range(state.humidity, HUMIDITY_RANGE, (0.1, 2.0)),
            over_sec: 0.5,
        },
    ];
    if rng.gen_bool(AMBIENT_TONE_PROBABILITY) {
        let base = map_range(state.temperature, TEMPERATURE_RANGE, (100.0, 400.0));
        cues.push(AudioCue::AmbientTone {
            frequency_hz: base * pick(AMBIENT_RATIOS, rng),
            duration_sec: QUARTER_NOTE_SEC,
        });
    }
    cues
}
