use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message in the clarification conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Conversational context backing the clarification loop.
///
/// Created at session start, appended to on every clarification round,
/// read-only afterward. One instance per research request; never shared
/// across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique identifier for this research session.
    pub id: String,
    turns: Vec<Turn>,
}

impl SessionState {
    /// Creates an empty session with a fresh identifier.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
        }
    }

    /// Appends a turn to the conversation.
    pub fn push(&mut self, role: TurnRole, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// All turns, in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the conversation for inclusion in a role prompt.
    pub fn to_context(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role.as_str(), t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// One follow-up question together with its recorded answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Record of a full clarification conversation for one research request.
///
/// Owned exclusively by one session; destroyed when the session ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarificationExchange {
    /// Ordered question/answer pairs collected across rounds.
    pub exchanges: Vec<QuestionAnswer>,
    /// Whether the query still needs clarification.
    pub needs_clarification: bool,
    /// Refined query once clarification resolved.
    pub refined_query: Option<String>,
}

impl ClarificationExchange {
    /// Records one answered round.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.exchanges.push(QuestionAnswer {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Number of completed question/answer rounds.
    pub fn rounds(&self) -> usize {
        self.exchanges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionState::new();
        let b = SessionState::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_turns_preserve_order() {
        let mut session = SessionState::new();
        session.push(TurnRole::Assistant, "What timeframe?");
        session.push(TurnRole::User, "Last five years");

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::Assistant);
        assert_eq!(turns[1].content, "Last five years");
    }

    #[test]
    fn test_to_context_renders_roles() {
        let mut session = SessionState::new();
        session.push(TurnRole::Assistant, "Which market?");
        session.push(TurnRole::User, "Europe");

        let context = session.to_context();
        assert_eq!(context, "assistant: Which market?\nuser: Europe");
    }

    #[test]
    fn test_exchange_records_rounds() {
        let mut exchange = ClarificationExchange::default();
        exchange.record("Which market?", "Europe");
        assert_eq!(exchange.rounds(), 1);
        assert_eq!(exchange.exchanges[0].question, "Which market?");
    }
}
