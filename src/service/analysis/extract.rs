use serde_json::Value;

use crate::shared::config::ProviderConfig;
use crate::shared::entities::{EmotionResult, LabelScore};
use crate::shared::error::{AnalysisError, ParseError};
use crate::shared::utils::percent_one_decimal;

/// Where the per-label scores live inside a finished job payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionPaths {
    /// Pointer to the predictions array, relative to the payload root.
    pub predictions: String,
    /// Pointer to the label list, relative to the first prediction.
    pub emotions: String,
}

impl Default for ExtractionPaths {
    fn default() -> Self {
        Self {
            predictions: "/predictions".to_string(),
            emotions: "/models/prosody/grouped_predictions/0/predictions/0/emotions".to_string(),
        }
    }
}

impl From<&ProviderConfig> for ExtractionPaths {
    fn from(cfg: &ProviderConfig) -> Self {
        Self {
            predictions: cfg.predictions_pointer.clone(),
            emotions: cfg.emotions_pointer.clone(),
        }
    }
}

/// Pulls the label scores out of a finished job payload.
///
/// An empty predictions array or an empty label list is `NoPredictions`;
/// anything missing or of the wrong type is a `ParseError` naming the path.
pub fn extract_emotions(payload: &Value, paths: &ExtractionPaths) -> Result<EmotionResult, AnalysisError> {
    let predictions = payload
        .pointer(&paths.predictions)
        .ok_or_else(|| ParseError::shape(&paths.predictions, "missing"))?
        .as_array()
        .ok_or_else(|| ParseError::shape(&paths.predictions, "expected array"))?;
    let Some(first) = predictions.first() else {
        return Err(AnalysisError::NoPredictions);
    };

    let emotions_path = format!("{}/0{}", paths.predictions, paths.emotions);
    let entries = first
        .pointer(&paths.emotions)
        .ok_or_else(|| ParseError::shape(&emotions_path, "missing"))?
        .as_array()
        .ok_or_else(|| ParseError::shape(&emotions_path, "expected array"))?;

    let mut scores = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let entry_path = format!("{emotions_path}/{idx}");
        scores.push(parse_entry(entry, &entry_path)?);
    }

    rank_scores(&scores).ok_or(AnalysisError::NoPredictions)
}

/// Accepts `{"name": "joy", "score": 0.8}` or the compact `{"joy": 0.8}`.
fn parse_entry(entry: &Value, path: &str) -> Result<(String, f64), ParseError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| ParseError::shape(path, "expected object"))?;

    let (name, score) = if obj.contains_key("name") || obj.contains_key("score") {
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::shape(format!("{path}/name"), "expected string"))?;
        (name, obj.get("score"))
    } else if obj.len() == 1 {
        let (name, score) = obj
            .iter()
            .next()
            .ok_or_else(|| ParseError::shape(path, "empty object"))?;
        (name.as_str(), Some(score))
    } else {
        return Err(ParseError::shape(path, "expected {name, score}"));
    };

    let score = score
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .ok_or_else(|| ParseError::shape(format!("{path}/score"), "expected finite number"))?;
    Ok((name.to_string(), score))
}

/// Picks the top label (first one wins on ties) and converts every score to
/// a percentage with one decimal. `None` for an empty list.
pub fn rank_scores(entries: &[(String, f64)]) -> Option<EmotionResult> {
    let mut best: Option<&(String, f64)> = None;
    for entry in entries {
        match best {
            Some((_, best_score)) if entry.1 <= *best_score => {}
            _ => best = Some(entry),
        }
    }
    let (top_label, _) = best?;

    let scores = entries
        .iter()
        .map(|(label, score)| LabelScore {
            label: label.clone(),
            probability: percent_one_decimal(*score),
        })
        .collect();

    Some(EmotionResult {
        top_label: top_label.clone(),
        scores,
    })
}
