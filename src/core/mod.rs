//! The engine proper: parsing, condition evaluation, resolution, seeded
//! draws, and the per-variation walk.

pub mod condition;
pub mod context;
pub mod generator;
pub mod lint;
pub mod resolver;
pub mod rng;
pub mod template;
