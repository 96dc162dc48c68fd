use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{with_retry, Llm, LlmError, RetryPolicy};
use crate::prompts::build_plan_prompt;
use crate::role::Role;
use crate::structured::parse_structured;

/// One unit of planned search work.
///
/// Immutable once produced by the planning stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDirective {
    /// The search term to use for the web search.
    pub term: String,
    /// The reasoning for why this search is important to the query.
    pub reasoning: String,
}

/// An ordered sequence of search directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlan {
    pub directives: Vec<SearchDirective>,
}

impl SearchPlan {
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Raw planning-role response.
#[derive(Debug, Deserialize)]
struct PlanResponse {
    searches: Vec<DirectiveResponse>,
}

#[derive(Debug, Deserialize)]
struct DirectiveResponse {
    term: String,
    reasoning: String,
}

/// Converts a clarified query into a validated search plan.
pub struct Planner {
    role: Role,
    retry: RetryPolicy,
    min_searches: usize,
    max_searches: usize,
}

impl Planner {
    pub fn new(role: Role, retry: RetryPolicy, min_searches: usize, max_searches: usize) -> Self {
        Self {
            role,
            retry,
            min_searches,
            max_searches,
        }
    }

    /// Invokes the planning role once and validates the returned plan.
    ///
    /// Directives with an empty term or reasoning are dropped with a
    /// warning. A surviving directive count outside the configured bounds
    /// is a contract violation, reported rather than clamped.
    pub async fn plan(&self, llm: &dyn Llm, clarified_query: &str) -> Result<SearchPlan, PlanError> {
        let prompt = build_plan_prompt(clarified_query);
        let response =
            with_retry(self.retry, self.role.name, || self.role.invoke(llm, &prompt)).await?;

        let parsed: PlanResponse = parse_structured(&response).map_err(PlanError::Parse)?;
        let proposed = parsed.searches.len();

        let directives: Vec<SearchDirective> = parsed
            .searches
            .into_iter()
            .filter_map(|d| {
                let term = d.term.trim();
                let reasoning = d.reasoning.trim();
                if term.is_empty() || reasoning.is_empty() {
                    warn!("dropping directive with empty term or reasoning");
                    None
                } else {
                    Some(SearchDirective {
                        term: term.to_string(),
                        reasoning: reasoning.to_string(),
                    })
                }
            })
            .collect();

        let count = directives.len();
        if count < self.min_searches || count > self.max_searches {
            return Err(PlanError::InvalidPlan {
                count,
                min: self.min_searches,
                max: self.max_searches,
            });
        }

        if count < proposed {
            warn!(
                dropped = proposed - count,
                kept = count,
                "plan contained invalid directives"
            );
        }
        info!(directives = count, "search plan ready");

        Ok(SearchPlan { directives })
    }
}

/// Errors from the planning stage.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid plan: {count} directives, expected between {min} and {max}")]
    InvalidPlan {
        count: usize,
        min: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_response_parses() {
        let raw = r#"{"searches": [{"term": "a", "reasoning": "b"}]}"#;
        let parsed: PlanResponse = parse_structured(raw).unwrap();
        assert_eq!(parsed.searches.len(), 1);
        assert_eq!(parsed.searches[0].term, "a");
    }

    #[test]
    fn test_plan_len() {
        let plan = SearchPlan {
            directives: vec![SearchDirective {
                term: "t".into(),
                reasoning: "r".into(),
            }],
        };
        assert_eq!(plan.len(), 1);
        assert!(!plan.is_empty());
    }
}
