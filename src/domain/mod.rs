// Domain layer: transcript records, the extraction/aggregation services and
// the ports the pipeline talks through.

pub mod model;
pub mod ports;

pub mod services;
