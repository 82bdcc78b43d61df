use serde::{Deserialize, Serialize};

/// Completion counts as the workflow runner writes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStats {
    #[serde(default)]
    pub total_cells: u64,
    #[serde(default)]
    pub translatable_cells: u64,
    #[serde(default)]
    pub translated_cells: u64,
    #[serde(default)]
    pub sheets_processed: u64,
    #[serde(default)]
    pub unique_texts: u64,
    #[serde(default)]
    pub batch_count: u64,
}

/// The same counts under the display naming convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsView {
    pub total_cells: u64,
    pub translatable_cells: u64,
    pub translated_cells: u64,
    pub sheets_processed: u64,
    pub unique_texts: u64,
    pub batch_count: u64,
}

impl RawStats {
    /// Parse the stored JSON string; anything but an object is rejected.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            value @ serde_json::Value::Object(_) => serde_json::from_value(value),
            _ => Err(serde::de::Error::custom("stats is not a JSON object")),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<&RawStats> for StatsView {
    fn from(raw: &RawStats) -> Self {
        Self {
            total_cells: raw.total_cells,
            translatable_cells: raw.translatable_cells,
            translated_cells: raw.translated_cells,
            sheets_processed: raw.sheets_processed,
            unique_texts: raw.unique_texts,
            batch_count: raw.batch_count,
        }
    }
}
