//! Real-time particle scene of a snowy forest avenue with fireworks.
//!
//! Everything in this crate is GPU-free: point layouts, the per-frame
//! animation state and the firework simulation. Rendering lives in the
//! `forest-avenue` binary.

pub mod config;
pub mod entity;
pub mod field;
pub mod firework;
pub mod fireworks;
pub mod forest;
pub mod math;
pub mod rng;
pub mod scene;
pub mod shading;
pub mod texture;

pub use config::SceneConfig;
pub use firework::{BurstId, BurstState, FireworkBurst};
pub use fireworks::Fireworks;
pub use forest::{Forest, FrameTime, SharedUniforms};
pub use scene::Scene;
