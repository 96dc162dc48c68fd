//! Parsing helpers for structured LLM output.
//!
//! Roles that return JSON are instructed to emit only the object, but
//! models routinely wrap it in markdown code fences. Extraction strips
//! the fence before deserializing.

use serde::de::DeserializeOwned;

/// Extracts JSON from a response that might be wrapped in markdown code blocks.
pub(crate) fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Check for ```json ... ``` or ``` ... ```
    if trimmed.starts_with("```") {
        // Find the end of the first line (after ```json or ```)
        if let Some(start) = trimmed.find('\n') {
            let rest = &trimmed[start + 1..];
            // Find the closing ```
            if let Some(end) = rest.rfind("```") {
                return rest[..end].trim();
            }
        }
    }

    trimmed
}

/// Deserializes a structured role response, reporting a truncated echo of
/// the raw output on failure.
pub(crate) fn parse_structured<T: DeserializeOwned>(response: &str) -> Result<T, String> {
    let json_str = extract_json(response);
    serde_json::from_str(json_str).map_err(|e| {
        let echo: String = json_str.chars().take(500).collect();
        format!("Failed to parse LLM response as JSON: {e}. Response: {echo}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_extract_plain_json() {
        assert_eq!(extract_json(r#"  {"value": 1}  "#), r#"{"value": 1}"#);
    }

    #[test]
    fn test_extract_fenced_json() {
        let fenced = "```json\n{\"value\": 2}\n```";
        assert_eq!(extract_json(fenced), r#"{"value": 2}"#);
    }

    #[test]
    fn test_extract_bare_fence() {
        let fenced = "```\n{\"value\": 3}\n```";
        assert_eq!(extract_json(fenced), r#"{"value": 3}"#);
    }

    #[test]
    fn test_parse_structured() {
        let parsed: Sample = parse_structured("```json\n{\"value\": 7}\n```").unwrap();
        assert_eq!(parsed.value, 7);
    }

    #[test]
    fn test_parse_error_echoes_response() {
        let err = parse_structured::<Sample>("not json at all").unwrap_err();
        assert!(err.contains("not json at all"));
    }
}
