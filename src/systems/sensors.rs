use std::time::Duration;

use anyhow::Result;
use log::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    sensors::SensorSource,
    world::World,
};

pub const DEFAULT_MOTION_TIMEOUT: Duration = Duration::from_millis(1000);

/// Feeds `World::sensors` from a source, queues motion edges for the
/// dispatcher, and lets the motion flag lapse after the timeout.
pub struct SensorStateTracker {
    source: Box<dyn SensorSource>,
    motion_timeout: Duration,
}

impl SensorStateTracker {
    pub fn new(source: Box<dyn SensorSource>, motion_timeout: Duration) -> Self {
        debug!("sensor source: {}", source.name());
        Self {
            source,
            motion_timeout,
        }
    }
}

impl System for SensorStateTracker {
    fn name(&self) -> &str {
        "sensors"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let events = self.source.poll(&mut world.sensors, ctx.now, rng);
        world.pending_motion.extend(events);
        world.sensors.decay(ctx.now, self.motion_timeout);
        Ok(())
    }
}
