mod engine;
mod gate;
mod types;

pub use engine::{update_in_place, Ingestor};
pub use gate::{GateDecision, ScanWindow};
pub use types::*;
