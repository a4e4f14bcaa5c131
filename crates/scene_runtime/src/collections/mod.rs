//! Live collections backing the frame passes

mod filtered;

pub use filtered::FilterSortCollection;
