//! Default values for Delver configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default maximum tokens for LLM responses.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default OpenAI-compatible API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default Anthropic messages API URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default Anthropic API version header.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

/// Default Ollama API URL (OpenAI-compatible endpoint).
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";

/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// ============================================================================
// Research Pipeline Defaults
// ============================================================================

/// Maximum clarification rounds before proceeding with the best-available
/// query. Bounds cost and latency; exceeding it is a soft condition, not
/// an error.
pub const DEFAULT_MAX_CLARIFICATION_ROUNDS: u32 = 5;

/// Minimum number of search directives in a valid plan.
pub const DEFAULT_MIN_SEARCHES: usize = 5;

/// Maximum number of search directives in a valid plan.
pub const DEFAULT_MAX_SEARCHES: usize = 20;

/// Per-search timeout in seconds.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;

/// Retries per LLM call site on transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base backoff delay in milliseconds; doubles per retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Word bound the search role is instructed to honor per summary.
/// Exceeding it materially is logged, never truncated.
pub const SEARCH_SUMMARY_WORD_LIMIT: usize = 300;

/// How many prior report summaries to carry into the next research run
/// within the same conversation.
pub const DEFAULT_CONTEXT_SUMMARIES: usize = 3;
