pub mod protocol;

pub use protocol::{BodyInstance, PathVertex, PositionBuffer, ProtocolLayout};
