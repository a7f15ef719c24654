pub mod delivery;
pub mod engine;
pub mod error;
pub mod market_data;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod telemetry;
