//! Line diffs for instability reports.
//!
//! When a node's structure changes between two walks, the report shows the
//! previous and current renderings next to each other. [`side_by_side`]
//! aligns the two line lists with the Myers algorithm and
//! [`SideBySide::render`] lays them out in fixed-width columns.

pub mod side_by_side;

pub use side_by_side::{side_by_side, DiffRow, SideBySide, DEFAULT_COLUMN_WIDTH};
