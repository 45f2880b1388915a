use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column positions of the fields we extract from a positional CSV row.
///
/// The defaults match the NYPD stop-and-frisk export. A different export can
/// be described in a JSON file, any omitted key keeping its default:
///
/// ```json
/// { "year": 0, "description": 2, "race": 66, "marker": "Y" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub year: usize,
    pub description: usize,
    pub arrested: usize,
    pub frisked: usize,
    pub gender: usize,
    pub race: usize,
    pub location: usize,
    /// Exact cell value meaning "yes" for the arrested and frisked flags.
    pub marker: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            year: 0,
            description: 2,
            arrested: 13,
            frisked: 16,
            gender: 52,
            race: 66,
            location: 71,
            marker: "Y".to_string(),
        }
    }
}

impl ColumnLayout {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading column layout {}", path.display()))?;
        serde_json::from_str(&text).context("parsing column layout JSON")
    }

    /// Smallest row width that covers every referenced column.
    pub fn min_columns(&self) -> usize {
        [
            self.year,
            self.description,
            self.arrested,
            self.frisked,
            self.gender,
            self.race,
            self.location,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Whether a flag cell carries the "yes" marker. Anything else is `false`.
    pub fn is_marked(&self, cell: &str) -> bool {
        cell == self.marker
    }
}
