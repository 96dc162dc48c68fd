use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::llm::{with_retry, Llm, LlmError, RetryPolicy};
use crate::prompts::build_clarify_prompt;
use crate::role::Role;
use crate::session::SessionState;
use crate::structured::parse_structured;

/// A follow-up question produced by the clarification role.
#[derive(Debug, Clone, Deserialize)]
pub struct ClarificationQuestion {
    /// The question to surface to the user.
    pub question: String,
    /// Why answering it improves the research.
    #[serde(default)]
    pub reason: String,
}

/// Verdict from one clarification round.
#[derive(Debug, Clone, Deserialize)]
pub struct ClarificationOutcome {
    /// Whether the query needs clarification before research proceeds.
    pub needs_clarification: bool,
    /// Improved query, present when no clarification is needed.
    pub clarified_query: Option<String>,
    /// Questions to ask the user when clarification is needed.
    #[serde(default)]
    pub questions: Vec<ClarificationQuestion>,
    /// Explanation of the decision.
    #[serde(default)]
    pub reasoning: String,
}

/// Runs the clarification role for one round.
///
/// The loop itself (surfacing questions, collecting answers, bounding
/// rounds) is driven by the manager; this stage only assesses the query
/// against the accumulated conversation.
pub struct Clarifier {
    role: Role,
    retry: RetryPolicy,
}

impl Clarifier {
    pub fn new(role: Role, retry: RetryPolicy) -> Self {
        Self { role, retry }
    }

    /// Assesses whether the query is ready for research.
    ///
    /// Side effects are the caller's concern: this never mutates the
    /// session and never contacts the planning stage.
    pub async fn assess(
        &self,
        llm: &dyn Llm,
        query: &str,
        history: &SessionState,
    ) -> Result<ClarificationOutcome, ClarifyError> {
        let prompt = build_clarify_prompt(query, &history.to_context());
        let response =
            with_retry(self.retry, self.role.name, || self.role.invoke(llm, &prompt)).await?;

        let outcome: ClarificationOutcome =
            parse_structured(&response).map_err(ClarifyError::Parse)?;

        debug!(
            needs_clarification = outcome.needs_clarification,
            questions = outcome.questions.len(),
            "clarification verdict"
        );

        Ok(outcome)
    }
}

/// Errors from the clarification stage.
#[derive(Debug, Error)]
pub enum ClarifyError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Parse error: {0}")]
    Parse(String),
}
