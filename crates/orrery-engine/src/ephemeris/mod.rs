pub mod oracle;
pub mod paths;
pub mod resolver;

pub use oracle::{EphemerisOracle, FnOracle, ReferenceFrame};
pub use paths::{OrbitPath, OrbitPathSampler};
pub use resolver::{EphemerisResolver, PositionSample};
