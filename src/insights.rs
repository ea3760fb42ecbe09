//! Insight extraction.
//!
//! Turns the free-text interview transcript into the structured `Insights`
//! accumulator by asking the text-generation service for a fixed-shape JSON
//! object. Extraction is best-effort: a failed call or unparsable reply
//! leaves the accumulated insights exactly as they were.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{TextGenerator, strip_code_fences};

/// Structured facts about the developer, accumulated across extraction
/// passes.
///
/// Update policy: scalar fields overwrite whenever the model supplies a
/// value; list fields are replaced wholesale by a non-empty list (last full
/// list wins, no set union). Absent fields never disturb prior values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Insights {
    pub languages: Vec<String>,
    pub testing_interest: Option<bool>,
    pub learning_focused: Option<bool>,
    pub experience_indicators: Vec<String>,
    pub project_focus: Option<String>,
    pub preferences: Vec<String>,
}

impl Insights {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.testing_interest.is_none()
            && self.learning_focused.is_none()
            && self.experience_indicators.is_empty()
            && self.project_focus.is_none()
            && self.preferences.is_empty()
    }

    /// Fold one extraction result into the accumulator.
    pub fn apply(&mut self, extracted: ExtractedInsights) {
        if let Some(languages) = extracted.languages
            && !languages.is_empty()
        {
            self.languages = languages;
        }
        if let Some(testing_interest) = extracted.testing_interest {
            self.testing_interest = Some(testing_interest);
        }
        if let Some(learning_focused) = extracted.learning_focused {
            self.learning_focused = Some(learning_focused);
        }
        if let Some(indicators) = extracted.experience_indicators
            && !indicators.is_empty()
        {
            self.experience_indicators = indicators;
        }
        if let Some(project_focus) = extracted.project_focus
            && !project_focus.is_empty()
        {
            self.project_focus = Some(project_focus);
        }
        if let Some(preferences) = extracted.preferences
            && !preferences.is_empty()
        {
            self.preferences = preferences;
        }
    }

    /// JSON rendering used when folding insights into model instructions.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One extraction result as the model reports it. Every field is optional;
/// the model only fills in what the conversation supports.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtractedInsights {
    pub languages: Option<Vec<String>>,
    pub testing_interest: Option<bool>,
    pub learning_focused: Option<bool>,
    pub experience_indicators: Option<Vec<String>>,
    pub project_focus: Option<String>,
    pub preferences: Option<Vec<String>>,
}

const EXTRACTION_SYSTEM: &str = "You extract developer insights from conversations.";

fn extraction_instructions(transcript: &str) -> String {
    format!(
        r#"Analyze this conversation and extract key insights about the developer. Return ONLY a JSON object with these fields:

{{
    "languages": ["list of programming languages mentioned"],
    "testing_interest": true/false,
    "learning_focused": true/false,
    "experience_indicators": ["any words/phrases indicating experience level"],
    "project_focus": "brief description of what they're working on",
    "preferences": ["any coding preferences or interests mentioned"]
}}

Conversation:
{transcript}

Return only the JSON, no other text."#
    )
}

/// Run one extraction pass over the full transcript.
///
/// Returns `None` when the service fails or replies with something that is
/// not the requested JSON object; callers then keep their prior insights.
pub fn extract(transcript: &str, generator: &dyn TextGenerator) -> Option<ExtractedInsights> {
    let reply = match generator.complete(EXTRACTION_SYSTEM, &extraction_instructions(transcript)) {
        Ok(reply) => reply,
        Err(e) => {
            debug!(error = %e, "insight_extraction_failed");
            return None;
        }
    };

    let cleaned = strip_code_fences(&reply);
    match serde_json::from_str::<ExtractedInsights>(&cleaned) {
        Ok(extracted) => Some(extracted),
        Err(e) => {
            warn!(error = %e, "insight_json_malformed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{FixedGenerator, ScriptedGenerator};

    #[test]
    fn test_extract_valid_json() {
        let generator = FixedGenerator::new(
            r#"{"languages": ["Rust", "Python"], "testing_interest": true, "project_focus": "a CLI tool"}"#,
        );

        let extracted = extract("Q: x\nA: y\n", &generator).unwrap();
        assert_eq!(
            extracted.languages,
            Some(vec!["Rust".to_string(), "Python".to_string()])
        );
        assert_eq!(extracted.testing_interest, Some(true));
        assert_eq!(extracted.project_focus, Some("a CLI tool".to_string()));
        assert!(extracted.learning_focused.is_none());
    }

    #[test]
    fn test_extract_fenced_json() {
        let generator =
            FixedGenerator::new("```json\n{\"languages\": [\"Go\"]}\n```");

        let extracted = extract("Q: x\nA: y\n", &generator).unwrap();
        assert_eq!(extracted.languages, Some(vec!["Go".to_string()]));
    }

    #[test]
    fn test_extract_invalid_json_returns_none() {
        let generator = FixedGenerator::new("I couldn't really tell, sorry!");
        assert!(extract("Q: x\nA: y\n", &generator).is_none());
    }

    #[test]
    fn test_extract_service_failure_returns_none() {
        let generator = ScriptedGenerator::failing();
        assert!(extract("Q: x\nA: y\n", &generator).is_none());
    }

    #[test]
    fn test_apply_overwrites_supplied_fields_only() {
        let mut insights = Insights {
            languages: vec!["Python".to_string()],
            testing_interest: Some(false),
            project_focus: Some("old focus".to_string()),
            ..Default::default()
        };

        insights.apply(ExtractedInsights {
            languages: Some(vec!["Rust".to_string()]),
            testing_interest: Some(true),
            ..Default::default()
        });

        // Supplied fields replaced.
        assert_eq!(insights.languages, vec!["Rust"]);
        assert_eq!(insights.testing_interest, Some(true));
        // Absent field untouched.
        assert_eq!(insights.project_focus, Some("old focus".to_string()));
    }

    #[test]
    fn test_apply_language_list_replaces_wholesale() {
        let mut insights = Insights {
            languages: vec!["Python".to_string(), "Go".to_string()],
            ..Default::default()
        };

        insights.apply(ExtractedInsights {
            languages: Some(vec!["Rust".to_string()]),
            ..Default::default()
        });

        // Last full list wins; no union with the previous one.
        assert_eq!(insights.languages, vec!["Rust"]);
    }

    #[test]
    fn test_apply_empty_list_leaves_prior_value() {
        let mut insights = Insights {
            languages: vec!["Python".to_string()],
            ..Default::default()
        };

        insights.apply(ExtractedInsights {
            languages: Some(vec![]),
            ..Default::default()
        });

        assert_eq!(insights.languages, vec!["Python"]);
    }

    #[test]
    fn test_is_empty() {
        assert!(Insights::default().is_empty());

        let mut insights = Insights::default();
        insights.learning_focused = Some(true);
        assert!(!insights.is_empty());
    }
}
