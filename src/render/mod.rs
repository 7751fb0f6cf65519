//! Repair passes that rewrite LaTeX text in place.

mod images;
mod options;
mod result;
mod tables;

pub use images::{ImageRewriter, WidthTable};
pub use options::{NormalizerOptions, RepairOptions, DEFAULT_STRIP_DIRECTIVES};
pub use result::{RepairResult, RepairStats};
pub use tables::TableNormalizer;

use crate::model::LayoutMode;

/// Run the table normalizer and then the image rewriter over `text`.
///
/// `options.layout`, when set, takes precedence over `layout`.
pub fn repair(text: &str, layout: LayoutMode, options: &RepairOptions) -> RepairResult {
    let layout = options.layout.unwrap_or(layout);
    let mut stats = RepairStats::new();
    let mut content = text.to_string();

    if options.repair_tables {
        let normalizer = TableNormalizer::with_options(options.normalizer.clone());
        content = normalizer.normalize_with_stats(&content, &mut stats);
        log::info!(
            "Tables: {} found, {} cleaned, {} algorithm listings kept",
            stats.tables_found,
            stats.tables_rewritten,
            stats.algorithms_skipped
        );
    }

    if options.rewrite_images {
        let rewriter = ImageRewriter::new(layout)
            .with_image_prefix(options.image_prefix.clone())
            .with_figure_placement(options.figure_placement.clone());
        content = rewriter.rewrite_with_stats(&content, &mut stats);
        log::info!(
            "Images: {} rewritten for {} layout, {} wrapped in figures",
            stats.images_rewritten,
            layout,
            stats.images_wrapped
        );
    }

    RepairResult::new(content, layout, stats)
}
