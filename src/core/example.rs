//! Example records: the curated question/answer pairs the service retrieves.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{RagError, Result};

/// Category used when a caller supplies none.
pub const DEFAULT_CATEGORY: &str = "general";

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;

/// Prefix of every content-derived id.
const ID_PREFIX: &str = "example_";

/// Hex digits of the SHA-256 digest kept in an id.
const ID_HEX_LEN: usize = 32;

/// A stored exemplar together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub score: i64,
    pub category: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: i64,
}

/// An example as submitted by a caller, before validation.
///
/// Every field is optional on the wire so that a missing field surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewExample {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewExample {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        score: i64,
        category: Option<String>,
    ) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(answer.into()),
            score: Some(score),
            category,
        }
    }

    /// Check required fields and ranges, filling in the default category.
    pub fn validate(self) -> Result<ExampleDraft> {
        let question = required_text(self.question, "question")?;
        let answer = required_text(self.answer, "answer")?;

        let score = self
            .score
            .ok_or_else(|| RagError::validation("score is required"))?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(RagError::validation(format!(
                "score must be between {} and {}, got {}",
                MIN_SCORE, MAX_SCORE, score
            )));
        }

        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Ok(ExampleDraft {
            question,
            answer,
            score,
            category,
        })
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(RagError::validation(format!("{} is required", field))),
    }
}

/// A validated example, ready to be embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleDraft {
    pub question: String,
    pub answer: String,
    pub score: i64,
    pub category: String,
}

impl ExampleDraft {
    /// Content-derived id; equal `(question, answer)` pairs share it.
    pub fn id(&self) -> String {
        example_id(&self.question, &self.answer)
    }
}

/// Derive the id for a `(question, answer)` pair.
///
/// `example_` followed by the leading hex digits of
/// SHA-256(question, 0x1F, answer). The separator keeps `("ab", "c")` and
/// `("a", "bc")` apart.
pub fn example_id(question: &str, answer: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(question.as_bytes());
    hasher.update([0x1f]);
    hasher.update(answer.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", ID_PREFIX, &digest[..ID_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_deterministic() {
        let a = example_id("팀 갈등 해결 경험?", "구체적 사례...");
        let b = example_id("팀 갈등 해결 경험?", "구체적 사례...");
        assert_eq!(a, b);
        assert!(a.starts_with("example_"));
        assert_eq!(a.len(), "example_".len() + 32);
    }

    #[test]
    fn test_id_separator_prevents_collision() {
        assert_ne!(example_id("ab", "c"), example_id("a", "bc"));
    }

    #[test]
    fn test_validate_defaults_category() {
        let draft = NewExample::new("q", "a", 90, None).validate().unwrap();
        assert_eq!(draft.category, DEFAULT_CATEGORY);

        let draft = NewExample::new("q", "a", 90, Some("  ".to_string()))
            .validate()
            .unwrap();
        assert_eq!(draft.category, DEFAULT_CATEGORY);

        let draft = NewExample::new("q", "a", 90, Some("teamwork".to_string()))
            .validate()
            .unwrap();
        assert_eq!(draft.category, "teamwork");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let missing_answer = NewExample {
            question: Some("q".to_string()),
            score: Some(50),
            ..Default::default()
        };
        let err = missing_answer.validate().unwrap_err();
        assert!(err.to_string().contains("answer is required"));

        let blank_question = NewExample::new("   ", "a", 50, None);
        assert!(matches!(
            blank_question.validate(),
            Err(RagError::Validation { .. })
        ));

        let missing_score = NewExample {
            question: Some("q".to_string()),
            answer: Some("a".to_string()),
            ..Default::default()
        };
        assert!(missing_score.validate().is_err());
    }

    #[test]
    fn test_validate_score_range() {
        assert!(NewExample::new("q", "a", 0, None).validate().is_ok());
        assert!(NewExample::new("q", "a", 100, None).validate().is_ok());
        assert!(NewExample::new("q", "a", 101, None).validate().is_err());
        assert!(NewExample::new("q", "a", -1, None).validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_request() {
        let raw: NewExample = serde_json::from_str(r#"{"question": "q"}"#).unwrap();
        assert_eq!(raw.question.as_deref(), Some("q"));
        assert!(raw.answer.is_none());
        assert!(raw.score.is_none());
    }
}
