use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clarify::{ClarificationQuestion, Clarifier, ClarifyError};
use crate::config::Config;
use crate::llm::{Llm, RetryPolicy};
use crate::plan::{PlanError, Planner};
use crate::report::{ResearchReport, SynthesisError, Writer};
use crate::role::Role;
use crate::search::{Dispatcher, SearchTool};
use crate::session::{ClarificationExchange, SessionState, TurnRole};

/// Lifecycle events emitted while a research run progresses.
///
/// Consumed by the UI layer for progress display; dropping the receiver
/// never stalls the run.
#[derive(Debug, Clone)]
pub enum ResearchEvent {
    ClarificationNeeded { questions: Vec<String> },
    QueryClarified { query: String },
    PlanProduced { directives: usize },
    SearchCompleted { completed: usize, total: usize },
    ReportReady,
}

/// The caller's side of the clarification exchange.
#[derive(Debug, Clone)]
pub enum ClarificationReply {
    /// One combined answer blob covering the presented questions.
    Answer(String),
    /// Skip the questions and research the query as-is.
    Proceed,
    /// Abort the run.
    Cancel,
}

/// Request/response surface for the clarification loop.
///
/// The manager presents follow-up questions and blocks on the reply;
/// the CLI implements this over stdin, tests with canned answers.
#[async_trait]
pub trait ClarificationHandler: Send {
    async fn answer(&mut self, questions: &[ClarificationQuestion]) -> ClarificationReply;
}

/// Non-interactive handler: never answers, always proceeds with the
/// query as given.
pub struct ProceedWithoutAnswers;

#[async_trait]
impl ClarificationHandler for ProceedWithoutAnswers {
    async fn answer(&mut self, _questions: &[ClarificationQuestion]) -> ClarificationReply {
        ClarificationReply::Proceed
    }
}

/// Top-level sequencer for one research run.
///
/// Sequences clarification → planning → parallel search → synthesis
/// strictly; any stage's terminal failure short-circuits the rest and
/// surfaces a stage-tagged error rather than a partial report. One
/// manager instance handles one run at a time and holds no global state.
pub struct ResearchManager {
    pub(crate) llm: Arc<dyn Llm>,
    pub(crate) clarifier: Clarifier,
    planner: Planner,
    dispatcher: Dispatcher,
    writer: Writer,
    pub(crate) max_clarification_rounds: u32,
    events: Option<mpsc::UnboundedSender<ResearchEvent>>,
}

impl ResearchManager {
    pub fn new(llm: Arc<dyn Llm>, config: &Config) -> Self {
        let retry = RetryPolicy::new(
            config.research.max_retries,
            config.research.retry_base_delay_ms,
        );

        Self {
            llm,
            clarifier: Clarifier::new(Role::clarifier(&config.roles), retry),
            planner: Planner::new(
                Role::planner(&config.roles),
                retry,
                config.research.min_searches,
                config.research.max_searches,
            ),
            dispatcher: Dispatcher::new(
                Role::searcher(&config.roles),
                retry,
                Duration::from_secs(config.research.search_timeout_secs),
            ),
            writer: Writer::new(Role::writer(&config.roles), retry),
            max_clarification_rounds: config.research.max_clarification_rounds,
            events: None,
        }
    }

    /// Attaches a web-search tool for search tasks to consult.
    pub fn with_search_tool(mut self, tool: Arc<dyn SearchTool>) -> Self {
        self.dispatcher = self.dispatcher.with_tool(tool);
        self
    }

    /// Streams lifecycle events to the given channel.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ResearchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Runs the full pipeline for one query.
    ///
    /// The handler is consulted whenever the clarification role asks
    /// follow-up questions; a `Cancel` reply aborts the run before any
    /// search work is started.
    pub async fn run(
        &self,
        query: &str,
        handler: &mut dyn ClarificationHandler,
    ) -> Result<ResearchReport, ResearchError> {
        let mut session = SessionState::new();
        info!(session = %session.id, "starting research run");

        let clarified = self.clarify_query(query, &mut session, handler).await?;
        self.run_clarified(&clarified).await
    }

    /// Runs planning → search → synthesis for an already-clarified query.
    pub async fn run_clarified(
        &self,
        clarified_query: &str,
    ) -> Result<ResearchReport, ResearchError> {
        let plan = self.planner.plan(self.llm.as_ref(), clarified_query).await?;
        self.emit(ResearchEvent::PlanProduced {
            directives: plan.len(),
        });

        let results = self
            .dispatcher
            .dispatch(Arc::clone(&self.llm), &plan, |completed, total| {
                self.emit(ResearchEvent::SearchCompleted { completed, total })
            })
            .await;

        let report = self
            .writer
            .synthesize(self.llm.as_ref(), clarified_query, &results)
            .await?;
        self.emit(ResearchEvent::ReportReady);

        Ok(report)
    }

    /// Drives the clarification loop until the role is satisfied, the
    /// caller opts out, or the round bound is hit.
    ///
    /// Exceeding the bound is the soft "clarification exhausted" path:
    /// proceed with the best-available query rather than looping.
    async fn clarify_query(
        &self,
        query: &str,
        session: &mut SessionState,
        handler: &mut dyn ClarificationHandler,
    ) -> Result<String, ResearchError> {
        let mut exchange = ClarificationExchange::default();

        loop {
            let outcome = self
                .clarifier
                .assess(self.llm.as_ref(), query, session)
                .await?;

            if !outcome.needs_clarification {
                let refined = outcome
                    .clarified_query
                    .unwrap_or_else(|| query.to_string());
                exchange.needs_clarification = false;
                exchange.refined_query = Some(refined.clone());
                info!(rounds = exchange.rounds(), "query clarified");
                self.emit(ResearchEvent::QueryClarified {
                    query: refined.clone(),
                });
                return Ok(refined);
            }

            if outcome.questions.is_empty() {
                // Claims to need clarification but asked nothing; treat
                // the query as good enough.
                warn!("clarifier requested clarification without questions");
                return Ok(query.to_string());
            }

            if exchange.rounds() as u32 >= self.max_clarification_rounds {
                warn!(
                    rounds = exchange.rounds(),
                    "clarification exhausted, proceeding with best-available query"
                );
                return Ok(outcome
                    .clarified_query
                    .unwrap_or_else(|| query.to_string()));
            }

            self.emit(ResearchEvent::ClarificationNeeded {
                questions: outcome
                    .questions
                    .iter()
                    .map(|q| q.question.clone())
                    .collect(),
            });

            match handler.answer(&outcome.questions).await {
                ClarificationReply::Cancel => {
                    info!("research run cancelled during clarification");
                    return Err(ResearchError::Cancelled);
                }
                ClarificationReply::Proceed => {
                    info!("caller skipped clarification, researching query as-is");
                    return Ok(query.to_string());
                }
                ClarificationReply::Answer(answer) => {
                    let asked = outcome
                        .questions
                        .iter()
                        .map(|q| q.question.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    session.push(TurnRole::Assistant, asked.clone());
                    session.push(TurnRole::User, answer.clone());
                    exchange.record(asked, answer);
                }
            }
        }
    }

    pub(crate) fn emit(&self, event: ResearchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Terminal errors for a research run, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Clarification failed: {0}")]
    Clarify(#[from] ClarifyError),

    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Research run cancelled")]
    Cancelled,
}
