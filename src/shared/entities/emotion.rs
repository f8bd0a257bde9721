use std::collections::BTreeMap;

use serde::Serialize;

/// A single label with its probability in percent, rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub probability: f64,
}

/// Outcome of one emotion analysis. `scores` keeps the provider's order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionResult {
    pub top_label: String,
    pub scores: Vec<LabelScore>,
}

impl EmotionResult {
    /// Label → probability map as returned to clients. A label reported twice
    /// keeps its last value.
    pub fn probabilities(&self) -> BTreeMap<String, f64> {
        self.scores
            .iter()
            .map(|s| (s.label.clone(), s.probability))
            .collect()
    }

    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.scores
            .iter()
            .rev()
            .find(|s| s.label == label)
            .map(|s| s.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_last_duplicate_wins() {
        let result = EmotionResult {
            top_label: "joy".to_string(),
            scores: vec![
                LabelScore {
                    label: "joy".to_string(),
                    probability: 50.0,
                },
                LabelScore {
                    label: "joy".to_string(),
                    probability: 20.0,
                },
            ],
        };
        assert_eq!(result.probabilities().get("joy"), Some(&20.0));
        assert_eq!(result.probability_of("joy"), Some(20.0));
        assert_eq!(result.probability_of("anger"), None);
    }
}
