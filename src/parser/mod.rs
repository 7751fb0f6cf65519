//! Text scanning for table regions.

pub mod colspec;
mod heuristics;
mod regions;

pub use colspec::{count_columns, find_column_spec, ColumnSpec};
pub use heuristics::{columns_from_separators, separator_count, PatternHeuristics, TableHeuristics};
pub use regions::{find_regions, replace_regions};
