use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::SEARCH_SUMMARY_WORD_LIMIT;
use crate::llm::{with_retry, Llm, LlmError, RetryPolicy};
use crate::plan::{SearchDirective, SearchPlan};
use crate::prompts::build_search_prompt;
use crate::role::Role;

/// External web-search capability consumed by the search role.
///
/// Returns raw text snippets for a query. The implementation is external
/// to the core; tests and deployments plug in their own.
#[async_trait]
pub trait SearchTool: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError>;
}

/// Failure from the web-search tool. Scoped to a single directive.
#[derive(Debug, Error)]
#[error("Tool error: {0}")]
pub struct ToolError(pub String);

/// Outcome of a single search task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Success,
    Failed,
}

/// Result of executing one search directive.
///
/// One instance per directive, independent of its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub directive: SearchDirective,
    /// Bounded summary (2-3 paragraphs, ≤300 words requested).
    pub summary: String,
    pub status: SearchStatus,
    /// Failure reason, present when status is Failed.
    pub error: Option<String>,
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        self.status == SearchStatus::Success
    }

    fn success(directive: SearchDirective, summary: String) -> Self {
        Self {
            directive,
            summary,
            status: SearchStatus::Success,
            error: None,
        }
    }

    fn failed(directive: SearchDirective, reason: String) -> Self {
        Self {
            directive,
            summary: String::new(),
            status: SearchStatus::Failed,
            error: Some(reason),
        }
    }
}

/// Errors inside a single search task. Never escape the dispatcher;
/// each becomes a Failed result for its directive.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
}

/// Executes all directives of a plan concurrently.
///
/// Fan-out/fan-in with independent failure isolation: each directive
/// gets its own task writing exactly once to its own result slot, so
/// the returned sequence is always in plan order regardless of which
/// task finished first.
pub struct Dispatcher {
    role: Role,
    retry: RetryPolicy,
    task_timeout: Duration,
    tool: Option<Arc<dyn SearchTool>>,
}

impl Dispatcher {
    pub fn new(role: Role, retry: RetryPolicy, task_timeout: Duration) -> Self {
        Self {
            role,
            retry,
            task_timeout,
            tool: None,
        }
    }

    /// Attaches a web-search tool for the search role to consult.
    /// Without one, the role summarizes from the directive alone.
    pub fn with_tool(mut self, tool: Arc<dyn SearchTool>) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Runs every directive concurrently and returns one result per
    /// directive, in plan order.
    ///
    /// A directive's failure (tool error, role error, timeout) yields a
    /// Failed result without aborting its siblings. `on_progress` is
    /// called with (completed, total) as tasks finish, in completion
    /// order.
    pub async fn dispatch(
        &self,
        llm: Arc<dyn Llm>,
        plan: &SearchPlan,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Vec<SearchResult> {
        let total = plan.len();
        let mut slots: Vec<Option<SearchResult>> = (0..total).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, directive) in plan.directives.iter().enumerate() {
            let directive = directive.clone();
            let role = self.role.clone();
            let retry = self.retry;
            let task_timeout = self.task_timeout;
            let llm = Arc::clone(&llm);
            let tool = self.tool.clone();

            tasks.spawn(async move {
                let outcome = timeout(
                    task_timeout,
                    run_directive(&role, retry, llm.as_ref(), tool.as_deref(), &directive),
                )
                .await
                .unwrap_or(Err(SearchError::Timeout(task_timeout)));

                (index, directive, outcome)
            });
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            // A panicked task leaves its slot empty; filled below.
            let Ok((index, directive, outcome)) = joined else {
                continue;
            };

            let result = match outcome {
                Ok(summary) => SearchResult::success(directive, summary),
                Err(err) => {
                    warn!(term = %directive.term, %err, "search task failed");
                    SearchResult::failed(directive, err.to_string())
                }
            };

            slots[index] = Some(result);
            completed += 1;
            on_progress(completed, total);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    SearchResult::failed(
                        plan.directives[index].clone(),
                        "search task aborted".to_string(),
                    )
                })
            })
            .collect()
    }
}

/// Runs one directive: optionally consult the web-search tool, then ask
/// the search role for a bounded summary.
async fn run_directive(
    role: &Role,
    retry: RetryPolicy,
    llm: &dyn Llm,
    tool: Option<&dyn SearchTool>,
    directive: &SearchDirective,
) -> Result<String, SearchError> {
    let snippets = match tool {
        Some(tool) => Some(tool.search(&directive.term).await?),
        None => None,
    };

    let prompt = build_search_prompt(directive, snippets.as_deref());
    let summary = with_retry(retry, role.name, || role.invoke(llm, &prompt)).await?;

    let words = summary.split_whitespace().count();
    if words > SEARCH_SUMMARY_WORD_LIMIT + SEARCH_SUMMARY_WORD_LIMIT / 10 {
        // Requested bound, not enforced: log the violation, keep the text.
        warn!(
            term = %directive.term,
            words,
            limit = SEARCH_SUMMARY_WORD_LIMIT,
            "search summary materially exceeds word bound"
        );
    }
    debug!(term = %directive.term, words, "search summary ready");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_constructors() {
        let directive = SearchDirective {
            term: "t".into(),
            reasoning: "r".into(),
        };
        let ok = SearchResult::success(directive.clone(), "summary".into());
        assert!(ok.is_success());
        assert!(ok.error.is_none());

        let failed = SearchResult::failed(directive, "boom".into());
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.summary.is_empty());
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::Timeout(Duration::from_secs(60));
        assert!(err.to_string().contains("60"));

        let err = SearchError::Tool(ToolError("dns failure".into()));
        assert!(err.to_string().contains("dns failure"));
    }
}
