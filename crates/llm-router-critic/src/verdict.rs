use serde::{Deserialize, Serialize};
use tracing::debug;

use llm_router_oracle::{OracleError, OracleFields};

/// The evaluator's verdict on one generated solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the solution performs the requested task; serialized as "yes"/"no"
    #[serde(with = "yes_no")]
    pub is_relevant: bool,
    /// Free-text explanation of the verdict
    pub feedback: String,
}

impl Evaluation {
    pub fn accepted(feedback: impl Into<String>) -> Self {
        Self {
            is_relevant: true,
            feedback: feedback.into(),
        }
    }

    pub fn rejected(feedback: impl Into<String>) -> Self {
        Self {
            is_relevant: false,
            feedback: feedback.into(),
        }
    }

    /// Build a verdict from the oracle's `is_relevant` and `feedback` fields.
    ///
    /// The relevance field is untrusted text: only `yes` (any case, surrounding
    /// whitespace ignored) is acceptance.
    pub fn from_fields(fields: &OracleFields) -> Result<Self, OracleError> {
        let relevance = fields.require("is_relevant")?;
        let feedback = fields.require("feedback")?;

        let is_relevant = is_affirmative(relevance);
        debug!(raw = relevance, is_relevant, "Normalized relevance verdict");

        Ok(Self {
            is_relevant,
            feedback: feedback.to_string(),
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.is_relevant
    }

    /// Get a short description of the verdict for logging
    pub fn short_description(&self) -> String {
        if self.is_relevant {
            "ACCEPTED".to_string()
        } else {
            format!("REJECTED: {}", self.feedback)
        }
    }
}

fn is_affirmative(raw: &str) -> bool {
    raw.trim().to_lowercase() == "yes"
}

mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "yes" } else { "no" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(super::is_affirmative(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_router_oracle::Operation;

    fn fields(relevance: &str, feedback: &str) -> OracleFields {
        OracleFields::from_pairs(
            Operation::Evaluate,
            &[("is_relevant", relevance), ("feedback", feedback)],
        )
    }

    #[test]
    fn test_yes_is_accepted_after_normalization() {
        for raw in ["yes", "YES", "  Yes\n"] {
            let evaluation = Evaluation::from_fields(&fields(raw, "good")).unwrap();
            assert!(evaluation.is_accepted(), "{:?} should be accepted", raw);
        }
    }

    #[test]
    fn test_anything_else_is_rejected() {
        for raw in ["no", "yes.", "y", "true", "maybe", ""] {
            let evaluation = Evaluation::from_fields(&fields(raw, "nope")).unwrap();
            assert!(!evaluation.is_accepted(), "{:?} should be rejected", raw);
        }
    }

    #[test]
    fn test_feedback_is_kept_verbatim() {
        let evaluation = Evaluation::from_fields(&fields("no", "too long")).unwrap();
        assert_eq!(evaluation.feedback, "too long");
        assert_eq!(evaluation.short_description(), "REJECTED: too long");
    }

    #[test]
    fn test_missing_feedback_is_an_oracle_error() {
        let partial = OracleFields::from_pairs(Operation::Evaluate, &[("is_relevant", "yes")]);
        assert!(matches!(
            Evaluation::from_fields(&partial),
            Err(OracleError::MissingField { .. })
        ));
    }

    #[test]
    fn test_serializes_relevance_as_yes_no() {
        let json = serde_json::to_value(Evaluation::rejected("too long")).unwrap();
        assert_eq!(json["is_relevant"], "no");

        let back: Evaluation =
            serde_json::from_str(r#"{"is_relevant": "yes", "feedback": "ok"}"#).unwrap();
        assert!(back.is_relevant);
    }
}
