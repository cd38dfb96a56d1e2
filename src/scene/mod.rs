//! Everything between the tree store and the terminal cells.

pub mod label;
pub mod palette;
pub mod reconciler;
pub mod viewport;
