use crate::config::RolesConfig;
use crate::llm::{Llm, LlmError};
use crate::prompts;

/// A named configuration for one category of language-model invocation.
///
/// A role is a plain data record (instructions plus an optional model
/// choice) rather than a trait hierarchy; per-role behavior lives in the
/// instructions and the stage that drives the role.
#[derive(Debug, Clone)]
pub struct Role {
    /// Role name, used in log output.
    pub name: &'static str,
    /// System instructions sent with every invocation.
    pub instructions: &'static str,
    /// Model override for this role; the provider default when unset.
    pub model: Option<String>,
}

impl Role {
    /// The clarification role: decides whether a query needs follow-up
    /// questions before research can start.
    pub fn clarifier(config: &RolesConfig) -> Self {
        Self {
            name: "clarifier",
            instructions: prompts::CLARIFIER_INSTRUCTIONS,
            model: config.clarifier_model.clone(),
        }
    }

    /// The planning role: turns a clarified query into search directives.
    pub fn planner(config: &RolesConfig) -> Self {
        Self {
            name: "planner",
            instructions: prompts::PLANNER_INSTRUCTIONS,
            model: config.planner_model.clone(),
        }
    }

    /// The search role: summarizes one search term into a bounded summary.
    pub fn searcher(config: &RolesConfig) -> Self {
        Self {
            name: "searcher",
            instructions: prompts::SEARCHER_INSTRUCTIONS,
            model: config.searcher_model.clone(),
        }
    }

    /// The synthesis role: writes the final report.
    pub fn writer(config: &RolesConfig) -> Self {
        Self {
            name: "writer",
            instructions: prompts::WRITER_INSTRUCTIONS,
            model: config.writer_model.clone(),
        }
    }

    /// Invokes the role against the given LLM.
    pub async fn invoke(&self, llm: &dyn Llm, prompt: &str) -> Result<String, LlmError> {
        llm.complete_as(self.instructions, prompt, self.model.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_from_default_config() {
        let config = RolesConfig::default();
        let clarifier = Role::clarifier(&config);
        assert_eq!(clarifier.name, "clarifier");
        assert!(clarifier.model.is_none());
        assert!(clarifier.instructions.contains("needs_clarification"));
    }

    #[test]
    fn test_role_model_override() {
        let config = RolesConfig {
            writer_model: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        let writer = Role::writer(&config);
        assert_eq!(writer.model.as_deref(), Some("gpt-4o"));
        // Other roles are untouched
        assert!(Role::planner(&config).model.is_none());
    }
}
