//! Default prompt templates bundled at compile time.
//!
//! These are used for seeding the database on first run.
//! At runtime, prompts are loaded from the database to allow customization.

/// Creation assistant - suggests configuration and starter code for a new agent
pub const CREATION_ASSISTANT: &str = include_str!("defaults/creation_assistant.md");

/// Linking assistant - connection points and glue code between two agents
pub const LINKING_ASSISTANT: &str = include_str!("defaults/linking_assistant.md");

/// Security auditor - vulnerability assessment of an agent's code and description
pub const SECURITY_AUDITOR: &str = include_str!("defaults/security_auditor.md");

/// Price advisor - suggests a marketplace price for an agent
pub const PRICE_ADVISOR: &str = include_str!("defaults/price_advisor.md");

/// Tool code assistant - generates a starter snippet for a new tool
pub const TOOL_CODE: &str = include_str!("defaults/tool_code.md");

/// Tool & plugin advisor - recommends catalog tools for an agent
pub const TOOL_SUGGESTION: &str = include_str!("defaults/tool_suggestion.md");

/// All default prompts with their slugs for seeding
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("creation_assistant", CREATION_ASSISTANT),
        ("linking_assistant", LINKING_ASSISTANT),
        ("security_auditor", SECURITY_AUDITOR),
        ("price_advisor", PRICE_ADVISOR),
        ("tool_code", TOOL_CODE),
        ("tool_suggestion", TOOL_SUGGESTION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_default_is_empty() {
        for (slug, content) in all_defaults() {
            assert!(!content.trim().is_empty(), "prompt '{}' is empty", slug);
        }
    }

    #[test]
    fn test_slugs_are_unique() {
        let defaults = all_defaults();
        let mut slugs: Vec<_> = defaults.iter().map(|(slug, _)| *slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), defaults.len());
    }
}
