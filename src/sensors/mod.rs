//! Sensor state and the two ways of feeding it.
//!
//! A [`SensorSource`] advances [`SensorState`] once per tick and reports the
//! motion rising edges it saw. [`LiveSource`] replays parsed lines that a
//! background reader hands over a channel; [`SimulatedSource`] invents
//! plausible drift and random motion.

pub mod node;

use std::{
    io::BufRead,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::SystemRng;

pub const TEMPERATURE_RANGE: (f32, f32) = (15.0, 35.0);
pub const HUMIDITY_RANGE: (f32, f32) = (20.0, 80.0);

pub const DEFAULT_TEMPERATURE: f32 = 22.0;
pub const DEFAULT_HUMIDITY: f32 = 50.0;

/// One record as printed by the sensor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub temperature: f32,
    pub humidity: f32,
    pub count: u64,
    pub motion: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl SensorSample {
    pub fn motion_detected(&self) -> bool {
        self.motion != 0
    }
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("malformed sensor record {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("sensor stream unavailable: {0}")]
    Connection(#[from] std::io::Error),
}

/// Parses one line of sensor output. Lines that are not JSON objects (banners,
/// blank lines, firmware chatter) are not records and yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<SensorSample>, SensorError> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| SensorError::Malformed {
            line: trimmed.to_string(),
            source,
        })
}

/// A motion rising edge, with the readings that were current when it fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub at: Duration,
    pub count: u64,
    pub temperature: f32,
}

impl MotionEvent {
    pub fn from_state(state: &SensorState, at: Duration) -> Self {
        Self {
            at,
            count: state.motion_count,
            temperature: state.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    pub temperature: f32,
    pub humidity: f32,
    pub motion_count: u64,
    pub motion_active: bool,
    pub last_motion: Option<Duration>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
            motion_count: 0,
            motion_active: false,
            last_motion: None,
        }
    }
}

impl SensorState {
    pub fn set_climate(&mut self, temperature: f32, humidity: f32) {
        self.temperature = temperature.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
        self.humidity = humidity.clamp(HUMIDITY_RANGE.0, HUMIDITY_RANGE.1);
    }

    /// Overwrites the readings with a live sample. Returns an event when the
    /// sample reports motion while the motion flag is down.
    pub fn apply_sample(&mut self, sample: &SensorSample, now: Duration) -> Option<MotionEvent> {
        self.set_climate(sample.temperature, sample.humidity);
        self.motion_count = sample.count;
        if sample.motion_detected() && !self.motion_active {
            Some(self.raise_motion(now))
        } else {
            None
        }
    }

    /// Counts a synthetic detection and raises its event.
    pub fn register_motion(&mut self, now: Duration) -> MotionEvent {
        self.motion_count += 1;
        self.raise_motion(now)
    }

    fn raise_motion(&mut self, now: Duration) -> MotionEvent {
        self.motion_active = true;
        self.last_motion = Some(now);
        MotionEvent::from_state(self, now)
    }

    /// Drops the motion flag once more than `timeout` has passed since the
    /// last rising edge.
    pub fn decay(&mut self, now: Duration, timeout: Duration) {
        if let Some(last) = self.last_motion {
            if now.saturating_sub(last) > timeout {
                self.motion_active = false;
            }
        }
    }
}

pub trait SensorSource: Send {
    fn name(&self) -> &'static str;

    /// Advances `state` by one tick and returns the motion edges seen, in order.
    fn poll(
        &mut self,
        state: &mut SensorState,
        now: Duration,
        rng: &mut SystemRng<'_>,
    ) -> Vec<MotionEvent>;
}

/// Lines from a physical (or piped) sensor node.
pub struct LiveSource {
    lines: Option<Receiver<String>>,
}

impl LiveSource {
    /// A source plus the sender that feeds it raw lines.
    pub fn channel() -> (Sender<String>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { lines: Some(rx) })
    }

    /// A source with nothing attached; the sketch keeps running on its last
    /// readings.
    pub fn disconnected() -> Self {
        Self { lines: None }
    }

    /// Reads lines on a background thread. Read errors end the stream and are
    /// logged; they never reach the simulation.
    pub fn spawn_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, source) = Self::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!("{}", SensorError::Connection(err));
                        break;
                    }
                }
            }
            debug!("sensor reader finished");
        });
        source
    }

    pub fn is_connected(&self) -> bool {
        self.lines.is_some()
    }
}

impl SensorSource for LiveSource {
    fn name(&self) -> &'static str {
        "live"
    }

    fn poll(
        &mut self,
        state: &mut SensorState,
        now: Duration,
        _rng: &mut SystemRng<'_>,
    ) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        let Some(lines) = &self.lines else {
            return events;
        };
        let mut closed = false;
        loop {
            match lines.try_recv() {
                Ok(line) => match parse_line(&line) {
                    Ok(Some(sample)) => events.extend(state.apply_sample(&sample, now)),
                    Ok(None) => {}
                    Err(err) => warn!("{err}"),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            info!("sensor stream closed; keeping last readings");
            self.lines = None;
        }
        events
    }
}

pub const TEMPERATURE_DRIFT: f32 = 0.05;
pub const HUMIDITY_DRIFT: f32 = 0.2;
pub const MOTION_PROBABILITY: f64 = 0.01;

/// Random-walk climate and Bernoulli motion, for running without hardware.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    pub temperature_drift: f32,
    pub humidity_drift: f32,
    pub motion_probability: f64,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self {
            temperature_drift: TEMPERATURE_DRIFT,
            humidity_drift: HUMIDITY_DRIFT,
            motion_probability: MOTION_PROBABILITY,
        }
    }
}

impl SensorSource for SimulatedSource {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn poll(
        &mut self,
        state: &mut SensorState,
        now: Duration,
        rng: &mut SystemRng<'_>,
    ) -> Vec<MotionEvent> {
        let temperature = state.temperature
            + rng.gen_range(-self.temperature_drift..=self.temperature_drift);
        let humidity =
            state.humidity + rng.gen_range(-self.humidity_drift..=self.humidity_drift);
        state.set_climate(temperature, humidity);

        if rng.gen_bool(self.motion_probability) {
            vec![state.register_motion(now)]
        } else {
            Vec::new()
        }
    }
}
