// Domain layer: STK-facing models and the object-model port. No engine I/O here.

pub mod model;
pub mod ports;
