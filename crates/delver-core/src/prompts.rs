//! Role instructions and prompt builders for the research pipeline.

use crate::plan::SearchDirective;

/// Instructions for the clarification role.
///
/// The role decides whether a query is specific enough for research and,
/// if not, produces focused follow-up questions.
pub const CLARIFIER_INSTRUCTIONS: &str = r#"You are a research query clarification assistant. Your job is to analyze user queries and determine if they need clarification before proceeding with research. For each query, you should:

1. Identify any ambiguous terms, concepts, or scope issues
2. Consider what additional context would be helpful
3. Determine if the query is specific enough for effective research
4. If clarification is needed, generate focused follow-up questions
5. If the query is clear, indicate it's ready for research

Focus on questions that would significantly improve the quality and relevance of the research results. Avoid overly broad questions and instead focus on specific aspects that would help narrow down the research scope.

IMPORTANT: Output your decision as valid JSON matching this exact structure:
{
  "needs_clarification": false,
  "clarified_query": "An improved/clarified version of the query, or null if clarification is needed",
  "questions": [
    {
      "question": "A specific follow-up question",
      "reason": "Why this question matters for effective research"
    }
  ],
  "reasoning": "A short explanation of the analysis and decision"
}

Only output the JSON, no additional text."#;

/// Instructions for the planning role.
pub const PLANNER_INSTRUCTIONS: &str = r#"You are a helpful research assistant. Given a query, come up with a set of web searches to perform to best answer the query. Output between 5 and 20 search terms, each with the reasoning for why that search is important to the query.

IMPORTANT: Output your plan as valid JSON matching this exact structure:
{
  "searches": [
    {
      "term": "The search term to use for the web search",
      "reasoning": "Your reasoning for why this search is important to the query"
    }
  ]
}

Only output the JSON, no additional text."#;

/// Instructions for the search role.
///
/// Free-text output; the 300-word bound is a requested limit, checked
/// downstream as a soft violation only.
pub const SEARCHER_INSTRUCTIONS: &str = "You are a research assistant. Given a search term, you search the web for that term and produce a concise summary of the results. The summary must be 2-3 paragraphs and less than 300 words. Capture the main points. Write succinctly, no need to have complete sentences or good grammar. This will be consumed by someone synthesizing a report, so its vital you capture the essence and ignore any fluff. Do not include any additional commentary other than the summary itself.";

/// Instructions for the synthesis role.
pub const WRITER_INSTRUCTIONS: &str = r#"You are a senior researcher tasked with writing a cohesive report for a research query. You will be provided with the original query, and some initial research done by a research assistant.

You should first come up with an outline for the report that describes the structure and flow of the report. Then, generate the report. The report should be in markdown format, and it should be lengthy and detailed. Aim for 5-10 pages of content, at least 1000 words.

After the report, you must also suggest 3-5 follow-up questions that the user might want to ask next. These should be questions that build upon the information in the report or explore related topics.

IMPORTANT: Output your report as valid JSON matching this exact structure:
{
  "short_summary": "A short 2-3 sentence summary of the findings",
  "markdown_report": "The final report in markdown",
  "follow_up_questions": ["Suggested topics to research further"]
}

Only output the JSON, no additional text."#;

/// Builds the clarification prompt from the query and any accumulated
/// question/answer context.
pub fn build_clarify_prompt(query: &str, history: &str) -> String {
    if history.is_empty() {
        format!("Query: {query}")
    } else {
        format!("Original query: {query}\n\n{history}")
    }
}

/// Builds the planning prompt.
pub fn build_plan_prompt(clarified_query: &str) -> String {
    format!("Query: {clarified_query}")
}

/// Builds the search prompt for a single directive.
///
/// When a web-search tool was consulted, its raw snippets are included
/// for the role to summarize; otherwise the role answers from the term
/// and rationale alone.
pub fn build_search_prompt(directive: &SearchDirective, snippets: Option<&[String]>) -> String {
    let mut prompt = format!(
        "Search term: {}\nReason for searching: {}",
        directive.term, directive.reasoning
    );

    if let Some(snippets) = snippets {
        prompt.push_str("\n\nWeb search results:\n");
        for snippet in snippets {
            prompt.push_str("---\n");
            prompt.push_str(snippet);
            prompt.push('\n');
        }
    }

    prompt
}

/// Builds the synthesis prompt from the original query and the successful
/// search summaries, in plan order.
pub fn build_synthesis_prompt(original_query: &str, summaries: &[&str]) -> String {
    format!(
        "Original query: {}\n\nSummarized search results:\n{}",
        original_query,
        summaries.join("\n\n---\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarify_prompt_without_history() {
        let prompt = build_clarify_prompt("what is rust", "");
        assert_eq!(prompt, "Query: what is rust");
    }

    #[test]
    fn test_clarify_prompt_with_history() {
        let prompt = build_clarify_prompt("what is rust", "Answer 1: the language");
        assert!(prompt.starts_with("Original query: what is rust"));
        assert!(prompt.contains("Answer 1: the language"));
    }

    #[test]
    fn test_search_prompt_includes_snippets() {
        let directive = SearchDirective {
            term: "rust async runtimes".to_string(),
            reasoning: "compare scheduler designs".to_string(),
        };
        let snippets = vec!["tokio is a runtime".to_string()];
        let prompt = build_search_prompt(&directive, Some(&snippets));
        assert!(prompt.contains("rust async runtimes"));
        assert!(prompt.contains("tokio is a runtime"));
    }

    #[test]
    fn test_synthesis_prompt_orders_summaries() {
        let prompt = build_synthesis_prompt("q", &["first", "second"]);
        let first = prompt.find("first").unwrap();
        let second = prompt.find("second").unwrap();
        assert!(first < second);
    }
}
