use tracing::{info, warn};

use crate::clarify::ClarificationQuestion;
use crate::config::ResearchConfig;
use crate::manager::{ResearchError, ResearchEvent, ResearchManager};
use crate::report::ResearchReport;
use crate::session::{ClarificationExchange, SessionState, TurnRole};

/// Where the conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Ready for a fresh research query.
    AwaitingQuery,
    /// Follow-up questions were surfaced; waiting for the user's answers.
    AwaitingAnswer,
    /// Clarification resolved; the last run used the refined query.
    Clarified,
    /// The round bound was hit; the last run used the best-available query.
    Exhausted,
}

/// What the session sends back after consuming one user message.
#[derive(Debug)]
pub enum SessionReply {
    /// Clarification questions to present before research can start.
    Questions(Vec<ClarificationQuestion>),
    /// The finished report.
    Report(Box<ResearchReport>),
}

/// Stateful multi-turn research conversation.
///
/// An explicit state machine driven by discrete user messages: a query
/// arrives, zero or more clarification rounds follow, research runs, and
/// the session returns to `AwaitingQuery` for the next request. Short
/// summaries of previous reports are carried into follow-up runs so the
/// conversation has continuity.
pub struct ResearchSession {
    manager: ResearchManager,
    session: SessionState,
    exchange: ClarificationExchange,
    phase: SessionPhase,
    initial_query: String,
    pending_questions: Vec<ClarificationQuestion>,
    context_summaries: Vec<String>,
    carried_summaries: usize,
}

impl ResearchSession {
    pub fn new(manager: ResearchManager, config: &ResearchConfig) -> Self {
        Self {
            manager,
            session: SessionState::new(),
            exchange: ClarificationExchange::default(),
            phase: SessionPhase::AwaitingQuery,
            initial_query: String::new(),
            pending_questions: Vec::new(),
            context_summaries: Vec::new(),
            carried_summaries: config.context_summaries,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Identifier of the current clarification conversation.
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Consumes one user message and advances the state machine.
    ///
    /// In `AwaitingQuery` the message is a new research query; in
    /// `AwaitingAnswer` it is the combined answer to the pending
    /// questions. Either a set of follow-up questions or a finished
    /// report comes back.
    pub async fn handle_message(&mut self, message: &str) -> Result<SessionReply, ResearchError> {
        match self.phase {
            SessionPhase::AwaitingQuery | SessionPhase::Clarified | SessionPhase::Exhausted => {
                // Fresh query: new session state, new exchange.
                self.initial_query = message.to_string();
                self.session = SessionState::new();
                self.exchange = ClarificationExchange::default();
                self.pending_questions.clear();
                self.assess(message).await
            }
            SessionPhase::AwaitingAnswer => {
                let asked = self
                    .pending_questions
                    .iter()
                    .map(|q| q.question.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.session.push(TurnRole::User, message);
                self.exchange.record(asked, message);
                self.pending_questions.clear();

                let query = self.initial_query.clone();
                self.assess(&query).await
            }
        }
    }

    /// Runs one clarification round and either surfaces questions or
    /// kicks off the research pipeline.
    async fn assess(&mut self, query: &str) -> Result<SessionReply, ResearchError> {
        let outcome = self
            .manager
            .clarifier
            .assess(self.manager.llm.as_ref(), query, &self.session)
            .await?;

        if outcome.needs_clarification && !outcome.questions.is_empty() {
            if (self.exchange.rounds() as u32) < self.manager.max_clarification_rounds {
                let asked = outcome
                    .questions
                    .iter()
                    .map(|q| q.question.clone())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.session.push(TurnRole::Assistant, asked);
                self.pending_questions = outcome.questions.clone();
                self.phase = SessionPhase::AwaitingAnswer;
                self.manager.emit(ResearchEvent::ClarificationNeeded {
                    questions: outcome.questions.iter().map(|q| q.question.clone()).collect(),
                });
                return Ok(SessionReply::Questions(outcome.questions));
            }

            warn!(
                rounds = self.exchange.rounds(),
                "clarification exhausted, researching best-available query"
            );
            self.phase = SessionPhase::Exhausted;
            let best = outcome
                .clarified_query
                .unwrap_or_else(|| self.initial_query.clone());
            return self.research(&best).await;
        }

        self.phase = SessionPhase::Clarified;
        let refined = outcome
            .clarified_query
            .unwrap_or_else(|| query.to_string());
        self.exchange.refined_query = Some(refined.clone());
        info!(rounds = self.exchange.rounds(), "query clarified");
        self.research(&refined).await
    }

    /// Runs the pipeline, prepending prior report summaries for
    /// conversational continuity.
    async fn research(&mut self, query: &str) -> Result<SessionReply, ResearchError> {
        let start = self
            .context_summaries
            .len()
            .saturating_sub(self.carried_summaries);
        let window = &self.context_summaries[start..];
        let combined = if window.is_empty() {
            query.to_string()
        } else {
            let prior = window.join("\n---\n");
            format!("Previous context:\n{prior}\n\nCurrent query: {query}")
        };

        let mut report = self.manager.run_clarified(&combined).await?;
        // The carried context is prompt plumbing, not the user's question.
        report.source_query = query.to_string();
        self.context_summaries.push(report.short_summary.clone());

        Ok(SessionReply::Report(Box::new(report)))
    }
}
