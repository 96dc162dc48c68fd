pub mod clarify;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod manager;
pub mod plan;
pub mod prompts;
pub mod report;
pub mod role;
pub mod search;
pub mod session;
mod structured;

pub use clarify::{ClarificationOutcome, ClarificationQuestion, Clarifier};
pub use config::Config;
pub use conversation::{ResearchSession, SessionPhase, SessionReply};
pub use manager::{
    ClarificationHandler, ClarificationReply, ProceedWithoutAnswers, ResearchError, ResearchEvent,
    ResearchManager,
};
pub use plan::{SearchDirective, SearchPlan};
pub use report::ResearchReport;
pub use role::Role;
pub use search::{SearchResult, SearchStatus, SearchTool, ToolError};
pub use session::SessionState;
