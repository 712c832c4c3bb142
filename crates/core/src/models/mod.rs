//! Data models for the Album of the Day scheduler

mod audit;
mod identity;
mod outage;
mod selection;
mod submission;

pub use audit::*;
pub use identity::*;
pub use outage::*;
pub use selection::*;
pub use submission::*;
