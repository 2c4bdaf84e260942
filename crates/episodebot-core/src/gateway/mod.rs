//! Gateway: moves messages between chat transports and the pipeline.

pub mod bridge;
pub mod channels;
pub mod utils;

pub use bridge::EpisodeBridge;
