//! Progress payloads written by the workflow runner and their display form.
//!
//! The runner stores progress as a JSON string tagged by `phase`. Each known
//! phase has its own shape and its own normalization into [`ProgressView`],
//! the fixed-shape object the status endpoint hands to the UI.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Percent reported once the workbook has been split into batches.
pub const PREPARED_PERCENT: u32 = 5;

/// Share of the bar covered by the translation phase.
pub const TRANSLATION_SPAN_PERCENT: u32 = 85;

/// Percent reported while translated batches are merged back.
pub const MERGING_PERCENT: u32 = 90;

// Numeric fields are read leniently: a null or mistyped value reads as 0 or
// absent, and fractions are truncated.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedProgress {
    #[serde(default, deserialize_with = "lenient_count")]
    pub batches: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unique_texts: u64,
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatingProgress {
    #[serde(default, deserialize_with = "lenient_count")]
    pub completed_batches: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_batches: u64,
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    #[serde(default, deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    #[serde(default, deserialize_with = "lenient_seconds", skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergingProgress {
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
}

/// Non-negative whole number from a JSON number or numeric string.
fn whole_number(value: &Value) -> Option<u64> {
    let float = match value {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                return Some(n);
            }
            n.as_f64()?
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (float.is_finite() && float >= 0.0).then(|| float as u64)
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(whole_number(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(whole_number(&Value::deserialize(deserializer)?))
}

fn lenient_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(percent_of(&Value::deserialize(deserializer)?))
}

fn percent_of(value: &Value) -> Option<u32> {
    whole_number(value).and_then(|p| u32::try_from(p).ok())
}

/// Raw progress as stored, one variant per runner phase.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProgress {
    Prepared(PreparedProgress),
    Translating(TranslatingProgress),
    Merging(MergingProgress),
    /// Any other (or missing) phase tag; only the tag and percent survive.
    Other {
        phase: Option<String>,
        percent: Option<u32>,
    },
}

/// Display-oriented progress. Fields not produced by a phase are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_texts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_batches: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_batches: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_seconds: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressParseError {
    #[error("progress is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("progress is not a JSON object")]
    NotAnObject,
}

impl RawProgress {
    /// Parse the stored JSON string.
    pub fn parse(raw: &str) -> Result<Self, ProgressParseError> {
        let Value::Object(map) = serde_json::from_str::<Value>(raw)? else {
            return Err(ProgressParseError::NotAnObject);
        };
        let phase = map.get("phase").and_then(Value::as_str).map(str::to_owned);

        let progress = match phase.as_deref() {
            Some("prepared") => RawProgress::Prepared(serde_json::from_value(Value::Object(map))?),
            Some("translating") => {
                RawProgress::Translating(serde_json::from_value(Value::Object(map))?)
            }
            Some("merging") => RawProgress::Merging(serde_json::from_value(Value::Object(map))?),
            _ => RawProgress::Other {
                percent: map.get("percent").and_then(percent_of),
                phase: phase.clone(),
            },
        };
        Ok(progress)
    }

    /// Serialize back into the runner's JSON form, `phase` tag included.
    pub fn to_json(&self) -> String {
        let (phase, body) = match self {
            RawProgress::Prepared(p) => (Some("prepared"), serde_json::to_value(p)),
            RawProgress::Translating(p) => (Some("translating"), serde_json::to_value(p)),
            RawProgress::Merging(p) => (Some("merging"), serde_json::to_value(p)),
            RawProgress::Other { phase, percent } => {
                let mut map = Map::new();
                if let Some(phase) = phase {
                    map.insert("phase".into(), Value::from(phase.clone()));
                }
                if let Some(percent) = percent {
                    map.insert("percent".into(), Value::from(*percent));
                }
                return Value::Object(map).to_string();
            }
        };

        let mut map = match body {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(phase) = phase {
            map.insert("phase".into(), Value::from(phase));
        }
        Value::Object(map).to_string()
    }

    pub fn phase(&self) -> Option<&str> {
        match self {
            RawProgress::Prepared(_) => Some("prepared"),
            RawProgress::Translating(_) => Some("translating"),
            RawProgress::Merging(_) => Some("merging"),
            RawProgress::Other { phase, .. } => phase.as_deref(),
        }
    }

    pub fn normalize(&self) -> ProgressView {
        match self {
            RawProgress::Prepared(p) => p.normalize(),
            RawProgress::Translating(p) => p.normalize(),
            RawProgress::Merging(p) => p.normalize(),
            RawProgress::Other { phase, percent } => ProgressView {
                phase: phase.clone(),
                percent: *percent,
                ..ProgressView::default()
            },
        }
    }

    /// Progress once the workbook has been split into translation batches.
    pub fn prepared(batches: u64, unique_texts: u64) -> Self {
        RawProgress::Prepared(PreparedProgress {
            batches,
            unique_texts,
            percent: Some(PREPARED_PERCENT),
        })
    }

    /// Progress after `completed` of `total` batches have been translated.
    ///
    /// `elapsed` is measured from the start of the translation phase; the
    /// remaining-time estimate needs at least one finished batch.
    pub fn translating(completed: u64, total: u64, elapsed: Option<Duration>) -> Self {
        let percent = if total == 0 {
            PREPARED_PERCENT + TRANSLATION_SPAN_PERCENT
        } else {
            let share = completed.min(total) as f64 / total as f64;
            PREPARED_PERCENT + (share * TRANSLATION_SPAN_PERCENT as f64) as u32
        };

        let estimated_remaining_seconds = elapsed.filter(|_| completed > 0).map(|elapsed| {
            let per_batch = elapsed.as_secs_f64() / completed as f64;
            (per_batch * total.saturating_sub(completed) as f64) as u64
        });

        RawProgress::Translating(TranslatingProgress {
            completed_batches: completed,
            total_batches: total,
            percent: Some(percent),
            elapsed_seconds: elapsed.map(|e| e.as_secs()),
            estimated_remaining_seconds,
        })
    }

    pub fn merging() -> Self {
        RawProgress::Merging(MergingProgress {
            percent: Some(MERGING_PERCENT),
        })
    }
}

impl PreparedProgress {
    fn normalize(&self) -> ProgressView {
        ProgressView {
            phase: Some("prepared".into()),
            percent: self.percent,
            total_texts: Some(self.unique_texts),
            total_batches: Some(self.batches),
            ..ProgressView::default()
        }
    }
}

impl TranslatingProgress {
    fn normalize(&self) -> ProgressView {
        ProgressView {
            phase: Some("translating".into()),
            percent: self.percent,
            total_batches: Some(self.total_batches),
            completed_batches: Some(self.completed_batches),
            batch_progress: Some(format!("{}/{}", self.completed_batches, self.total_batches)),
            elapsed_seconds: self.elapsed_seconds,
            estimated_remaining_seconds: self.estimated_remaining_seconds,
            ..ProgressView::default()
        }
    }
}

impl MergingProgress {
    fn normalize(&self) -> ProgressView {
        ProgressView {
            phase: Some("merging".into()),
            percent: Some(self.percent.unwrap_or(MERGING_PERCENT)),
            ..ProgressView::default()
        }
    }
}
