//! Model types shared by the repair passes.
//!
//! The document itself is never parsed into a tree. These types describe the
//! pieces the passes discover in the raw LaTeX text: table regions, image
//! directives and the page layout that drives figure sizing.

mod image;
mod layout;
mod table;

pub use image::{ImageDirective, SizeTier, Width, WidthUnit};
pub use layout::LayoutMode;
pub use table::{TableEnvironment, TableKind, TableRegion};
