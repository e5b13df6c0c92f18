//! Emulation of the ESP32 sensor node (DHT22 + PIR) that feeds live mode.
//!
//! The node smooths climate readings over a short window, counts PIR rising
//! edges and prints one JSON record per reading cycle.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::SensorSample;

pub const HISTORY_SIZE: usize = 5;
pub const READ_INTERVAL_MS: u64 = 500;

/// A raw DHT22 measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Default)]
pub struct SensorNode {
    temperature_history: VecDeque<f32>,
    humidity_history: VecDeque<f32>,
    motion_count: u64,
    last_motion_state: bool,
}

impl SensorNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_count(&self) -> u64 {
        self.motion_count
    }

    /// Adds a reading to the window and returns the window averages.
    pub fn smooth(&mut self, reading: ClimateReading) -> ClimateReading {
        push_bounded(&mut self.temperature_history, reading.temperature);
        push_bounded(&mut self.humidity_history, reading.humidity);
        ClimateReading {
            temperature: mean(&self.temperature_history),
            humidity: mean(&self.humidity_history),
        }
    }

    /// Tracks the PIR pin; a low-to-high transition bumps the counter.
    pub fn read_motion(&mut self, pin_high: bool) -> bool {
        if pin_high && !self.last_motion_state {
            self.motion_count += 1;
        }
        self.last_motion_state = pin_high;
        pin_high
    }

    /// One firmware cycle. A failed climate read produces no record, but the
    /// PIR is still sampled so edges are not lost.
    pub fn cycle(
        &mut self,
        climate: Option<ClimateReading>,
        pin_high: bool,
        timestamp: f64,
    ) -> Option<SensorSample> {
        let averaged = climate.map(|reading| self.smooth(reading));
        let motion = self.read_motion(pin_high);
        let averaged = averaged?;
        Some(SensorSample {
            temperature: round2(averaged.temperature),
            humidity: round2(averaged.humidity),
            count: self.motion_count,
            motion: u8::from(motion),
            timestamp: Some(timestamp),
        })
    }
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    history.push_back(value);
    while history.len() > HISTORY_SIZE {
        history.pop_front();
    }
}

fn mean(values: &VecDeque<f32>) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Stand-in for the physical sensors: a slow climate random walk, a PIR that
/// tends to stay high once triggered, and the odd failed DHT read.
pub struct EmulatedBoard {
    rng: ChaCha8Rng,
    temperature: f32,
    humidity: f32,
    pir_high: bool,
}

impl EmulatedBoard {
    const READ_FAILURE: f64 = 0.02;
    const PIR_TRIGGER: f64 = 0.05;
    const PIR_HOLD: f64 = 0.6;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            temperature: 22.0,
            humidity: 50.0,
            pir_high: false,
        }
    }

    pub fn read_climate(&mut self) -> Option<ClimateReading> {
        self.temperature = (self.temperature + self.rng.gen_range(-0.3..=0.3)).clamp(-40.0, 80.0);
        self.humidity = (self.humidity + self.rng.gen_range(-1.0..=1.0)).clamp(0.0, 100.0);
        if self.rng.gen_bool(Self::READ_FAILURE) {
            return None;
        }
        Some(ClimateReading {
            temperature: self.temperature,
            humidity: self.humidity,
        })
    }

    pub fn read_pir(&mut self) -> bool {
        let stay = if self.pir_high {
            Self::PIR_HOLD
        } else {
            Self::PIR_TRIGGER
        };
        self.pir_high = self.rng.gen_bool(stay);
        self.pir_high
    }
}
