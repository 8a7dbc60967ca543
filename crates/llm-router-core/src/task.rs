use serde::{Deserialize, Serialize};

use llm_router_oracle::Operation;

/// The category a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Explain,
    Translate,
    Summarize,
    /// Request doesn't fit any supported task
    #[serde(rename = "none")]
    Unsupported,
}

impl Task {
    /// Map a classifier label onto a task.
    ///
    /// Matching is by substring containment on the lowercased, trimmed label
    /// (checked in the order explain, translate, summarize), so phrasings like
    /// "Explain." or "explanation request" still route. Anything else is
    /// unsupported.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();

        if label.contains("explain") {
            Task::Explain
        } else if label.contains("translate") {
            Task::Translate
        } else if label.contains("summarize") {
            Task::Summarize
        } else {
            Task::Unsupported
        }
    }

    /// Canonical lowercase token, as sent to the evaluator
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Explain => "explain",
            Task::Translate => "translate",
            Task::Summarize => "summarize",
            Task::Unsupported => "none",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Task::Explain => "Explain",
            Task::Translate => "Translate",
            Task::Summarize => "Summarize",
            Task::Unsupported => "None",
        }
    }

    /// User-facing label, e.g. `Task: Translate`
    pub fn label(&self) -> String {
        format!("Task: {}", self.display_name())
    }

    /// Oracle operation that generates a solution for this task
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Task::Explain => Some(Operation::Explain),
            Task::Translate => Some(Operation::Translate),
            Task::Summarize => Some(Operation::Summarize),
            Task::Unsupported => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.operation().is_some()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_labels() {
        assert_eq!(Task::from_label("explain"), Task::Explain);
        assert_eq!(Task::from_label("translate"), Task::Translate);
        assert_eq!(Task::from_label("summarize"), Task::Summarize);
        assert_eq!(Task::from_label("none"), Task::Unsupported);
    }

    #[test]
    fn test_labels_are_trimmed_and_case_insensitive() {
        assert_eq!(Task::from_label("  Explain\n"), Task::Explain);
        assert_eq!(Task::from_label("TRANSLATE"), Task::Translate);
        assert_eq!(Task::from_label("None"), Task::Unsupported);
    }

    #[test]
    fn test_substring_tolerates_phrasing_noise() {
        assert_eq!(Task::from_label("Explain."), Task::Explain);
        assert_eq!(Task::from_label("task: summarize"), Task::Summarize);
        assert_eq!(Task::from_label("\"translate\""), Task::Translate);
    }

    #[test]
    fn test_unmappable_labels_are_unsupported() {
        assert_eq!(Task::from_label(""), Task::Unsupported);
        assert_eq!(Task::from_label("weather"), Task::Unsupported);
        // "summary" does not contain "summarize"
        assert_eq!(Task::from_label("summary"), Task::Unsupported);
    }

    #[test]
    fn test_first_matching_category_wins() {
        assert_eq!(
            Task::from_label("explain or translate"),
            Task::Explain
        );
        assert_eq!(
            Task::from_label("summarize then translate"),
            Task::Translate
        );
    }

    #[test]
    fn test_labels_and_operations() {
        assert_eq!(Task::Translate.label(), "Task: Translate");
        assert_eq!(Task::Unsupported.label(), "Task: None");
        assert_eq!(Task::Summarize.operation(), Some(Operation::Summarize));
        assert!(!Task::Unsupported.is_supported());
    }

    #[test]
    fn test_serde_uses_canonical_tokens() {
        assert_eq!(
            serde_json::to_string(&Task::Unsupported).unwrap(),
            "\"none\""
        );
        let task: Task = serde_json::from_str("\"explain\"").unwrap();
        assert_eq!(task, Task::Explain);
    }
}
