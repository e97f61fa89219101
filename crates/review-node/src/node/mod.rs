pub mod config;
pub mod ids;
pub mod list;
pub mod telemetry;
