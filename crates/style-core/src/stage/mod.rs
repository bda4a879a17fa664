//! Descriptores de stage y su estado observable.
pub mod descriptor;
pub mod status;

pub use descriptor::{StageAction, StageDescriptor};
pub use status::StageStatus;
