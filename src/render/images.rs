//! Image directive rewriter.

use regex::{Captures, Regex};

use super::result::RepairStats;
use crate::model::{ImageDirective, LayoutMode, SizeTier, Width, WidthUnit};

/// Target widths per size tier for one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthTable {
    /// Width for small images
    pub small: Width,
    /// Width for medium images
    pub medium: Width,
    /// Width for large images
    pub large: Width,
}

impl WidthTable {
    /// The width table for a layout mode.
    pub fn for_layout(layout: LayoutMode) -> Self {
        match layout {
            LayoutMode::SingleColumn => Self {
                small: Width::new(0.6, WidthUnit::TextWidth),
                medium: Width::new(0.8, WidthUnit::TextWidth),
                large: Width::new(0.9, WidthUnit::TextWidth),
            },
            LayoutMode::MultiColumn => Self {
                small: Width::new(0.48, WidthUnit::ColumnWidth),
                medium: Width::new(0.48, WidthUnit::ColumnWidth),
                large: Width::new(0.48, WidthUnit::TextWidth),
            },
        }
    }

    /// Target width for a tier.
    pub fn width(&self, tier: SizeTier) -> Width {
        match tier {
            SizeTier::Small => self.small,
            SizeTier::Medium => self.medium,
            SizeTier::Large => self.large,
        }
    }

    /// Tier whose target width equals `width`, if any.
    ///
    /// Single-column `0.8\textwidth` is the medium target, so it resolves to
    /// medium even though its fraction alone would classify it as large.
    pub fn recognize(&self, width: Width) -> Option<SizeTier> {
        [SizeTier::Small, SizeTier::Medium, SizeTier::Large]
            .into_iter()
            .find(|tier| self.width(*tier) == width)
    }
}

/// Rewrites `\includegraphics` directives for a layout.
pub struct ImageRewriter {
    layout: LayoutMode,
    widths: WidthTable,
    image_prefix: String,
    figure_placement: String,
    directive_regex: Regex,
    width_regex: Regex,
    figure_regex: Regex,
}

impl ImageRewriter {
    /// Create a rewriter with the default `images/` prefix and `htbp` placement.
    pub fn new(layout: LayoutMode) -> Self {
        Self {
            layout,
            widths: WidthTable::for_layout(layout),
            image_prefix: "images/".to_string(),
            figure_placement: "htbp".to_string(),
            directive_regex: Regex::new(r"\\includegraphics(?:\[([^\]]*)\])?\{([^}]+)\}").unwrap(),
            width_regex: Regex::new(
                r"(?:^|[,\s])width\s*=\s*([0-9]*\.?[0-9]+)\s*(?:\\(textwidth|columnwidth|linewidth))?",
            )
            .unwrap(),
            figure_regex: Regex::new(r"\\(begin|end)\{figure\*?\}").unwrap(),
        }
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Set the placement specifier for generated figures.
    pub fn with_figure_placement(mut self, placement: impl Into<String>) -> Self {
        self.figure_placement = placement.into();
        self
    }

    /// Layout this rewriter targets.
    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    /// Parse a directive's option string and path.
    pub fn parse_directive(&self, options: Option<&str>, path: &str) -> ImageDirective {
        let mut directive = ImageDirective::new(options.map(str::to_string), path);
        if let Some(caps) = options.and_then(|o| self.width_regex.captures(o)) {
            directive.declared_fraction = caps.get(1).and_then(|m| m.as_str().parse().ok());
            directive.declared_unit = caps.get(2).and_then(|m| WidthUnit::from_name(m.as_str()));
        }
        directive
    }

    /// Resolve the tier of a directive.
    ///
    /// A width that already equals an entry of this layout's table keeps that
    /// entry's tier, so rewriting is stable across repeated runs. The one
    /// exception is a multi-column large width outside a figure: generated
    /// large images always sit in their own figure, so a bare one was written
    /// by hand and is classified by its fraction.
    pub fn resolve_tier(&self, directive: &ImageDirective, in_figure: bool) -> SizeTier {
        directive
            .declared_width()
            .and_then(|width| self.widths.recognize(width))
            .filter(|tier| {
                in_figure || !(self.layout.is_multi_column() && *tier == SizeTier::Large)
            })
            .unwrap_or_else(|| directive.tier())
    }

    /// Rewrite every image directive in `text`.
    pub fn rewrite(&self, text: &str) -> String {
        let mut stats = RepairStats::new();
        self.rewrite_with_stats(text, &mut stats)
    }

    /// Rewrite every image directive in `text`, recording statistics.
    pub fn rewrite_with_stats(&self, text: &str, stats: &mut RepairStats) -> String {
        let figure_events: Vec<(usize, bool)> = self
            .figure_regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), &caps[1] == "begin"))
            })
            .collect();

        let mut next_event = 0;
        let mut figure_depth = 0usize;

        let result = self.directive_regex.replace_all(text, |caps: &Captures| {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            while next_event < figure_events.len() && figure_events[next_event].0 < start {
                if figure_events[next_event].1 {
                    figure_depth += 1;
                } else {
                    figure_depth = figure_depth.saturating_sub(1);
                }
                next_event += 1;
            }

            let directive =
                self.parse_directive(caps.get(1).map(|m| m.as_str()), &caps[2]);
            let in_figure = figure_depth > 0;
            let tier = self.resolve_tier(&directive, in_figure);
            let wrap = self.layout.is_multi_column() && tier == SizeTier::Large && !in_figure;

            stats.images_rewritten += 1;
            if wrap {
                stats.images_wrapped += 1;
            }
            log::debug!(
                "Image {} classified {:?} (declared {:?})",
                directive.path,
                tier,
                directive.declared_fraction
            );

            self.render(&directive, tier, wrap)
        });

        result.into_owned()
    }

    fn render(&self, directive: &ImageDirective, tier: SizeTier, wrap: bool) -> String {
        let graphic = format!(
            "\\includegraphics[{}]{{{}{}}}",
            self.widths.width(tier).option(),
            self.image_prefix,
            directive.file_name()
        );

        if wrap {
            format!(
                "\\begin{{figure}}[{}]\n\\centering\n{}\n\\end{{figure}}",
                self.figure_placement, graphic
            )
        } else {
            graphic
        }
    }
}
