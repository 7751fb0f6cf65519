//! Page layout mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column layout of the target template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One text column (`onecolumn`)
    #[default]
    SingleColumn,
    /// Two or more text columns (`twocolumn`)
    MultiColumn,
}

impl LayoutMode {
    /// Map a document-class option name to a layout mode.
    pub fn from_option(option: &str) -> Option<Self> {
        match option.trim() {
            "onecolumn" => Some(LayoutMode::SingleColumn),
            "twocolumn" => Some(LayoutMode::MultiColumn),
            _ => None,
        }
    }

    /// The document-class option that selects this mode.
    pub fn option_name(&self) -> &'static str {
        match self {
            LayoutMode::SingleColumn => "onecolumn",
            LayoutMode::MultiColumn => "twocolumn",
        }
    }

    /// Check if this is a multi-column layout.
    pub fn is_multi_column(&self) -> bool {
        matches!(self, LayoutMode::MultiColumn)
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onecolumn" | "single" | "single-column" | "1" => Ok(LayoutMode::SingleColumn),
            "twocolumn" | "multi" | "multi-column" | "2" => Ok(LayoutMode::MultiColumn),
            other => Err(format!("unknown layout mode: {}", other)),
        }
    }
}
