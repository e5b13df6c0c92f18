pub mod audio;
pub mod controls;
pub mod engine;
pub mod palette;
pub mod render;
pub mod rng;
pub mod sensors;
pub mod sketch;
pub mod systems;
pub mod web;
pub mod world;

pub use controls::Command;
pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use render::Frame;
pub use sketch::{Sketch, SketchLoader, Variant};
pub use world::World;
