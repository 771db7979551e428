// Domain layer: audit models and ports. No external systems beyond serde.

pub mod model;
pub mod ports;
