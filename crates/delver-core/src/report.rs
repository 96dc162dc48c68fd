use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{with_retry, Llm, LlmError, RetryPolicy};
use crate::prompts::build_synthesis_prompt;
use crate::role::Role;
use crate::search::SearchResult;
use crate::structured::parse_structured;

/// The terminal artifact of a research run. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    /// The query the report answers.
    pub source_query: String,
    /// A short 2-3 sentence summary of the findings.
    pub short_summary: String,
    /// The full report in markdown (≥1000 words requested).
    pub markdown_report: String,
    /// Suggested topics to research further.
    pub follow_up_questions: Vec<String>,
}

impl ResearchReport {
    /// Renders the report for terminal or file output.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Summary\n\n");
        md.push_str(&self.short_summary);
        md.push_str("\n\n");

        md.push_str(&self.markdown_report);
        md.push_str("\n\n");

        md.push_str("## Follow-up Questions\n\n");
        for question in &self.follow_up_questions {
            md.push_str(&format!("- {}\n", question));
        }

        md
    }
}

/// Raw synthesis-role response.
#[derive(Debug, Deserialize)]
struct ReportResponse {
    short_summary: String,
    markdown_report: String,
    #[serde(default)]
    follow_up_questions: Vec<String>,
}

/// Produces the final report from the successful search summaries.
pub struct Writer {
    role: Role,
    retry: RetryPolicy,
}

impl Writer {
    pub fn new(role: Role, retry: RetryPolicy) -> Self {
        Self { role, retry }
    }

    /// Invokes the synthesis role once over the original query and all
    /// successful summaries, in plan order.
    ///
    /// Fails with `InsufficientEvidence` when no search succeeded; a
    /// hard failure here is terminal for the whole research run.
    pub async fn synthesize(
        &self,
        llm: &dyn Llm,
        original_query: &str,
        results: &[SearchResult],
    ) -> Result<ResearchReport, SynthesisError> {
        let summaries: Vec<&str> = results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.summary.as_str())
            .collect();

        if summaries.is_empty() {
            return Err(SynthesisError::InsufficientEvidence {
                attempted: results.len(),
            });
        }

        let failed = results.len() - summaries.len();
        if failed > 0 {
            warn!(
                succeeded = summaries.len(),
                failed, "synthesizing from partial search results"
            );
        }

        let prompt = build_synthesis_prompt(original_query, &summaries);
        let response =
            with_retry(self.retry, self.role.name, || self.role.invoke(llm, &prompt)).await?;

        let parsed: ReportResponse = parse_structured(&response).map_err(SynthesisError::Parse)?;

        // Non-deterministic output, but never silently empty.
        if parsed.markdown_report.trim().is_empty() || parsed.short_summary.trim().is_empty() {
            return Err(SynthesisError::EmptyReport);
        }

        info!(
            words = parsed.markdown_report.split_whitespace().count(),
            follow_ups = parsed.follow_up_questions.len(),
            "report synthesized"
        );

        Ok(ResearchReport {
            source_query: original_query.to_string(),
            short_summary: parsed.short_summary,
            markdown_report: parsed.markdown_report,
            follow_up_questions: parsed.follow_up_questions,
        })
    }
}

/// Errors from the synthesis stage.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Insufficient evidence: all {attempted} searches failed, nothing to synthesize")]
    InsufficientEvidence { attempted: usize },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Writer returned an empty report")]
    EmptyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_to_markdown() {
        let report = ResearchReport {
            source_query: "q".into(),
            short_summary: "Key findings here.".into(),
            markdown_report: "# Title\n\nBody text.".into(),
            follow_up_questions: vec!["What next?".into()],
        };

        let md = report.to_markdown();
        assert!(md.contains("## Summary"));
        assert!(md.contains("Key findings here."));
        assert!(md.contains("# Title"));
        assert!(md.contains("- What next?"));
    }

    #[test]
    fn test_report_response_parses() {
        let raw = r##"```json
{
  "short_summary": "s",
  "markdown_report": "# r",
  "follow_up_questions": ["a", "b"]
}
```"##;
        let parsed: ReportResponse = parse_structured(raw).unwrap();
        assert_eq!(parsed.short_summary, "s");
        assert_eq!(parsed.follow_up_questions.len(), 2);
    }
}
