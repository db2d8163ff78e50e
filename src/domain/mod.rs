// Domain layer: tuning models, node schema and the host port.

pub mod model;
pub mod ports;
pub mod schema;
