use std::time::{Duration, Instant};

use anyhow::Result;

use crate::{
    audio::AudioCue,
    controls::{ClickAction, Command},
    render::{Frame, FrameBuilder},
    rng::{RngManager, SystemRng},
    world::World,
};

pub struct EngineSettings {
    pub sketch_name: String,
    pub seed: u64,
    pub click_action: ClickAction,
    pub frames: FrameBuilder,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            commands: Vec::new(),
            settings: self.settings,
        }
    }
}

/// Runs the systems in registration order, one full pass per tick.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    commands: Vec<Command>,
    settings: EngineSettings,
}

impl Engine {
    pub fn sketch_name(&self) -> &str {
        &self.settings.sketch_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Queues a user command; it takes effect at the start of the next tick.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// One frame at wall-clock offset `now` from the start of the run.
    ///
    /// Commands are applied first. A paused world is not simulated but still
    /// yields a frame.
    pub fn tick(&mut self, world: &mut World, now: Duration) -> Result<TickSummary> {
        for command in self.commands.drain(..) {
            command.apply(world, self.settings.click_action, now);
        }

        let motion_before = world.motion_events();
        let mut system_reports = Vec::with_capacity(self.systems.len());
        let simulated = world.active;
        if simulated {
            let ctx = SystemContext {
                tick: world.tick() + 1,
                now,
                sketch_name: &self.settings.sketch_name,
            };
            for system in &mut self.systems {
                let start = Instant::now();
                let mut rng_stream = self.rng.stream(system.name());
                system.run(&ctx, world, &mut rng_stream)?;
                system_reports.push(SystemRunReport {
                    name: system.name().to_string(),
                    duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
                });
            }
            world.advance_time(now);
        }

        let cues: Vec<AudioCue> = std::mem::take(&mut world.cues);
        let frame = self.settings.frames.build(world, cues);
        Ok(TickSummary {
            tick: world.tick(),
            simulated,
            motion_events: world.motion_events() - motion_before,
            system_reports,
            frame,
        })
    }

    /// Runs `ticks` frames on a fixed virtual clock, handing each summary to
    /// `hook`.
    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        ticks: u64,
        frame_interval: Duration,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        let start = world.elapsed();
        for i in 1..=ticks {
            let now = start + frame_interval.mul_f64(i as f64);
            let summary = self.tick(world, now)?;
            hook(&summary);
        }
        Ok(())
    }

    pub fn run(&mut self, world: &mut World, ticks: u64, frame_interval: Duration) -> Result<()> {
        self.run_with_hook(world, ticks, frame_interval, |_| {})
    }
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct TickSummary {
    pub tick: u64,
    /// False when the world was paused and only a frame was produced.
    pub simulated: bool,
    pub motion_events: u64,
    pub system_reports: Vec<SystemRunReport>,
    pub frame: Frame,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub now: Duration,
    pub sketch_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
