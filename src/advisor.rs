//! Keyword-driven advisor for free-text disposal questions.

use serde::{Deserialize, Serialize};

use crate::category::DisposalCategory;

/// Substring hints checked against the lowercased query, in priority order.
const RECYCLABLE_HINTS: &[&str] = &["recycle", "plastic", "bottle", "can"];
const ORGANIC_HINTS: &[&str] = &["organic", "food", "compost", "garden"];
const REUSE_HINTS: &[&str] = &["reuse", "repurpose", "donate", "second life"];

const FALLBACK_RESPONSE: &str =
    "I'm here to help with waste segregation questions. How can I assist you today?";

/// Incoming chat request body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatQuery {
    pub query: String,
}

/// Advisor reply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatAdvice {
    pub response: String,
    #[serde(rename = "binSuggestion")]
    pub bin_suggestion: String,
}

/// Stateless text advisor. Holds no model handle and never fails.
pub struct QueryAdvisor;

impl QueryAdvisor {
    pub fn new() -> Self {
        Self
    }

    /// Suggest a bin for a free-text question.
    ///
    /// Hints are substring matches on the lowercased query; the first
    /// matching set wins. Queries matching nothing get the reuse suggestion.
    pub fn advise(&self, query: &str) -> ChatAdvice {
        let lowered = query.to_lowercase();

        // Unmatched queries share the reuse suggestion.
        let category = [
            (RECYCLABLE_HINTS, DisposalCategory::Recyclable),
            (ORGANIC_HINTS, DisposalCategory::Organic),
            (REUSE_HINTS, DisposalCategory::Reusable),
        ]
        .into_iter()
        .find(|(hints, _)| hints.iter().any(|h| lowered.contains(h)))
        .map(|(_, category)| category)
        .unwrap_or(DisposalCategory::Reusable);

        let label = category.advice_label();
        let mut response = format!(
            "Based on your query about '{}', I suggest you place this item in the {} bin. ",
            query, label
        );
        response.push_str(match category {
            DisposalCategory::Recyclable => {
                "This can be processed into new materials, saving resources and energy."
            }
            DisposalCategory::Organic => {
                "This will decompose naturally and can be turned into nutrient-rich compost."
            }
            _ => "Consider repurposing this item before disposal to extend its lifecycle.",
        });

        ChatAdvice {
            response,
            bin_suggestion: label.to_string(),
        }
    }

    /// Advice returned when the request body cannot be understood.
    pub fn fallback_advice(&self) -> ChatAdvice {
        ChatAdvice {
            response: FALLBACK_RESPONSE.to_string(),
            bin_suggestion: DisposalCategory::Reusable.advice_label().to_string(),
        }
    }
}

impl Default for QueryAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compost_queries_suggest_organic() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("how do I compost at home?");
        assert_eq!(advice.bin_suggestion, "organic");
        assert!(advice.response.contains("organic bin"));
    }

    #[test]
    fn donate_queries_suggest_reuse() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("where can I donate old toys");
        // "can" is a recyclable hint and is checked first.
        assert_eq!(advice.bin_suggestion, "recyclable");

        let advice = advisor.advise("I want to donate old toys");
        assert_eq!(advice.bin_suggestion, "reuse");
    }

    #[test]
    fn recyclable_hints_win_over_later_sets() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("plastic food wrap");
        assert_eq!(advice.bin_suggestion, "recyclable");
    }

    #[test]
    fn bottle_query_reports_recyclable_in_text() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("recycle this bottle");
        assert_eq!(advice.bin_suggestion, "recyclable");
        assert!(advice.response.contains("recyclable"));
        assert!(advice.response.contains("recycle this bottle"));
    }

    #[test]
    fn unmatched_queries_default_to_reuse() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("what should I do with this?");
        assert_eq!(advice.bin_suggestion, "reuse");
        assert!(advice.response.contains("repurposing"));
    }

    #[test]
    fn fallback_advice_is_fixed() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.fallback_advice();
        assert_eq!(advice.bin_suggestion, "reuse");
        assert!(advice.response.starts_with("I'm here to help"));
    }

    #[test]
    fn advice_serializes_with_wire_field_names() {
        let advisor = QueryAdvisor::new();
        let advice = advisor.advise("recycle");
        let json = serde_json::to_string(&advice).expect("serialize advice");
        assert!(json.contains(r#""binSuggestion":"recyclable""#));
    }
}
