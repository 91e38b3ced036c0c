mod controller;
mod format;

pub use controller::{HikeController, HikeStatus, SavedHike};
pub use format::format_duration;
