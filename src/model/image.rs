//! Image directive types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width fraction at or below which an image counts as small.
pub const SMALL_MAX: f64 = 0.4;

/// Width fraction at or below which an image counts as medium.
pub const MEDIUM_MAX: f64 = 0.7;

/// Size classification of an image, derived from its declared width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    /// Declared width ≤ 0.4
    Small,
    /// Declared width in (0.4, 0.7], or no width at all
    #[default]
    Medium,
    /// Declared width > 0.7
    Large,
}

impl SizeTier {
    /// Classify a declared width fraction. Absent widths are medium.
    pub fn from_width(width: Option<f64>) -> Self {
        match width {
            Some(w) if w <= SMALL_MAX => SizeTier::Small,
            Some(w) if w <= MEDIUM_MAX => SizeTier::Medium,
            Some(_) => SizeTier::Large,
            None => SizeTier::Medium,
        }
    }
}

/// Length macro a width fraction is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthUnit {
    /// `\textwidth` (full page body width)
    TextWidth,
    /// `\columnwidth` (single column width)
    ColumnWidth,
    /// `\linewidth` (current line width)
    LineWidth,
}

impl WidthUnit {
    /// LaTeX length macro.
    pub fn command(&self) -> &'static str {
        match self {
            WidthUnit::TextWidth => "\\textwidth",
            WidthUnit::ColumnWidth => "\\columnwidth",
            WidthUnit::LineWidth => "\\linewidth",
        }
    }

    /// Parse a length macro name without the backslash.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "textwidth" => Some(WidthUnit::TextWidth),
            "columnwidth" => Some(WidthUnit::ColumnWidth),
            "linewidth" => Some(WidthUnit::LineWidth),
            _ => None,
        }
    }
}

/// A relative width such as `0.48\columnwidth`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Width {
    /// Fraction of the unit
    pub fraction: f64,
    /// Unit the fraction applies to
    pub unit: WidthUnit,
}

impl Width {
    /// Create a new width.
    pub const fn new(fraction: f64, unit: WidthUnit) -> Self {
        Self { fraction, unit }
    }

    /// Render as an `\includegraphics` option, e.g. `width=0.8\textwidth`.
    pub fn option(&self) -> String {
        format!("width={}", self)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.fraction, self.unit.command())
    }
}

/// An `\includegraphics[options]{path}` directive found in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDirective {
    /// Option string between the brackets, without the brackets
    pub options: Option<String>,

    /// Image path as written
    pub path: String,

    /// Numeric width fraction from `width=...`, if any
    pub declared_fraction: Option<f64>,

    /// Length macro following the width fraction, if recognized
    pub declared_unit: Option<WidthUnit>,
}

impl ImageDirective {
    /// Create a directive with no width information.
    pub fn new(options: Option<String>, path: impl Into<String>) -> Self {
        Self {
            options,
            path: path.into(),
            declared_fraction: None,
            declared_unit: None,
        }
    }

    /// Declared width including its unit, when both were recognized.
    pub fn declared_width(&self) -> Option<Width> {
        match (self.declared_fraction, self.declared_unit) {
            (Some(fraction), Some(unit)) => Some(Width::new(fraction, unit)),
            _ => None,
        }
    }

    /// Size tier from the declared fraction.
    pub fn tier(&self) -> SizeTier {
        SizeTier::from_width(self.declared_fraction)
    }

    /// Final path component. Both `/` and `\` are treated as separators.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}
