pub mod engine;

pub use engine::OrbitEngine;
