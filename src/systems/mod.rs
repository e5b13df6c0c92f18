mod audio;
mod dispatch;
mod particles;
mod sensors;
mod waves;

pub use audio::AudioDirector;
pub use dispatch::{EventDispatcher, SpawnCountFormula, BURST_COUNT, ORIGIN_JITTER};
pub use particles::{
    Particle, ParticleSystem, ATTRACTION_FORCE, DRAG, EVICTION_BATCH, INITIAL_LIFE, LIFE_DECAY,
    MAX_PARTICLES,
};
pub use sensors::{SensorStateTracker, DEFAULT_MOTION_TIMEOUT};
pub use waves::{EnergyWave, WaveSystem, ALPHA_DECAY, INITIAL_ALPHA};
