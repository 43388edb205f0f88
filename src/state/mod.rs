//! State module for batch items and their outcomes
//!
//! # Components
//!
//! - `ItemIndex`, `WorkItem`, `Batch`: the input side of a resolve
//! - `Disposition`: the terminal bucket each index ends up in

mod disposition;
mod work_item;

// Re-export main types
pub use disposition::Disposition;
pub use work_item::{load_batch, Batch, ItemIndex, WorkItem};
