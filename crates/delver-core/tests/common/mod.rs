//! Scripted LLM and search-tool doubles for pipeline tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use delver_core::llm::{Llm, LlmError};
use delver_core::prompts;
use delver_core::{SearchTool, ToolError};

/// Routes each role invocation (identified by its instructions) to a
/// scripted response queue. Search summaries are generated from the
/// directive term, with optional per-term delays and failures so tests
/// can shuffle completion order.
pub struct MockLlm {
    clarify_responses: Mutex<VecDeque<String>>,
    plan_responses: Mutex<VecDeque<String>>,
    write_responses: Mutex<VecDeque<String>>,
    search_delays: Mutex<HashMap<String, u64>>,
    search_failures: Mutex<HashSet<String>>,
    pub clarify_calls: AtomicUsize,
    pub plan_prompts: Mutex<Vec<String>>,
    pub write_prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            clarify_responses: Mutex::new(VecDeque::new()),
            plan_responses: Mutex::new(VecDeque::new()),
            write_responses: Mutex::new(VecDeque::new()),
            search_delays: Mutex::new(HashMap::new()),
            search_failures: Mutex::new(HashSet::new()),
            clarify_calls: AtomicUsize::new(0),
            plan_prompts: Mutex::new(Vec::new()),
            write_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_clarify(&self, response: impl Into<String>) {
        self.clarify_responses.lock().unwrap().push_back(response.into());
    }

    pub fn push_plan(&self, response: impl Into<String>) {
        self.plan_responses.lock().unwrap().push_back(response.into());
    }

    pub fn push_report(&self, response: impl Into<String>) {
        self.write_responses.lock().unwrap().push_back(response.into());
    }

    /// Delays the summary for `term` by `millis`.
    pub fn delay_search(&self, term: impl Into<String>, millis: u64) {
        self.search_delays.lock().unwrap().insert(term.into(), millis);
    }

    /// Makes the search role fail (permanently) for `term`.
    pub fn fail_search(&self, term: impl Into<String>) {
        self.search_failures.lock().unwrap().insert(term.into());
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::RequestFailed("mock: no bare completions".into()))
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        if system == prompts::CLARIFIER_INSTRUCTIONS {
            self.clarify_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.clarify_responses.lock().unwrap().pop_front();
            // Out of script: the query is clear as-is.
            return Ok(scripted
                .unwrap_or_else(|| r#"{"needs_clarification": false, "clarified_query": null}"#.into()));
        }

        if system == prompts::PLANNER_INSTRUCTIONS {
            self.plan_prompts.lock().unwrap().push(prompt.to_string());
            let scripted = self.plan_responses.lock().unwrap().pop_front();
            return Ok(scripted.unwrap_or_else(|| plan_json(&["alpha", "beta", "gamma", "delta", "epsilon"])));
        }

        if system == prompts::SEARCHER_INSTRUCTIONS {
            let term = prompt
                .lines()
                .next()
                .and_then(|l| l.strip_prefix("Search term: "))
                .unwrap_or("")
                .to_string();

            let delay = self.search_delays.lock().unwrap().get(&term).copied();
            if let Some(millis) = delay {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            if self.search_failures.lock().unwrap().contains(&term) {
                return Err(LlmError::RequestFailed(format!("search failed for {term}")));
            }
            return Ok(format!("Summary for {term}"));
        }

        if system == prompts::WRITER_INSTRUCTIONS {
            self.write_prompts.lock().unwrap().push(prompt.to_string());
            let scripted = self.write_responses.lock().unwrap().pop_front();
            return Ok(scripted.unwrap_or_else(|| {
                report_json("Scripted findings.", "# Report\n\nScripted body.", &["And then?"])
            }));
        }

        Err(LlmError::RequestFailed(format!(
            "mock: unrecognized role instructions: {}",
            &system[..system.len().min(60)]
        )))
    }
}

/// Web-search tool double: canned snippets, with scripted failures.
pub struct MockSearchTool {
    fail_terms: HashSet<String>,
}

impl MockSearchTool {
    pub fn new() -> Self {
        Self {
            fail_terms: HashSet::new(),
        }
    }

    pub fn failing_for(terms: &[&str]) -> Self {
        Self {
            fail_terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl SearchTool for MockSearchTool {
    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        if self.fail_terms.contains(query) {
            return Err(ToolError(format!("simulated outage for {query}")));
        }
        Ok(vec![format!("snippet about {query}")])
    }
}

// ---------------------------------------------------------------------------
// JSON builders for scripted role responses
// ---------------------------------------------------------------------------

pub fn clarified_json(query: &str) -> String {
    serde_json::json!({
        "needs_clarification": false,
        "clarified_query": query,
        "questions": [],
        "reasoning": "clear enough"
    })
    .to_string()
}

pub fn questions_json(questions: &[&str]) -> String {
    let questions: Vec<_> = questions
        .iter()
        .map(|q| serde_json::json!({"question": q, "reason": "narrows scope"}))
        .collect();
    serde_json::json!({
        "needs_clarification": true,
        "clarified_query": null,
        "questions": questions,
        "reasoning": "too broad"
    })
    .to_string()
}

pub fn plan_json(terms: &[&str]) -> String {
    let searches: Vec<_> = terms
        .iter()
        .map(|t| serde_json::json!({"term": t, "reasoning": format!("covers {t}")}))
        .collect();
    serde_json::json!({ "searches": searches }).to_string()
}

pub fn report_json(summary: &str, body: &str, follow_ups: &[&str]) -> String {
    serde_json::json!({
        "short_summary": summary,
        "markdown_report": body,
        "follow_up_questions": follow_ups
    })
    .to_string()
}
