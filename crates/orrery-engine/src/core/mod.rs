pub mod cinematic;
pub mod instant;
pub mod time;
