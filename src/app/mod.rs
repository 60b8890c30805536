// Application-layer seams; adapters live in `infra`
pub mod ports;
