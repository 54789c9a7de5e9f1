mod machine;
mod mirror;
mod occupancy;
mod state;

pub use machine::ControlPointStateMachine;
pub use mirror::ControlPointStateMirror;
pub use occupancy::ControlPointOccupancy;
pub use state::{ControlPointState, Presence};

pub type ControlPointId = u32;
