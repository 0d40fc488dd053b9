//! # Entry Keys
//!
//! Key construction for user-created catalog entries. Keys are the
//! slugified display name plus a short random fragment, so concurrent
//! uploads with identical names cannot collide.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

static NON_ALNUM: OnceLock<Regex> = OnceLock::new();

/// Lowercase `name` and collapse every non-alphanumeric run into `-`.
pub fn slugify(name: &str) -> String {
    let re = NON_ALNUM.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static pattern"));
    re.replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Generate a collection key for a user-created entry.
pub fn agent_key(name: &str) -> String {
    let slug = slugify(name);
    let fragment = Uuid::new_v4().simple().to_string();
    let fragment = &fragment[..8];
    if slug.is_empty() {
        format!("agent-{fragment}")
    } else {
        format!("{slug}-{fragment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("My Cool Bot!"), "my-cool-bot");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("Déjà vu"), "d-j-vu");
    }

    #[test]
    fn test_keys_for_identical_names_differ() {
        let a = agent_key("Support Bot");
        let b = agent_key("Support Bot");
        assert_ne!(a, b);
        assert!(a.starts_with("support-bot-"));
    }

    #[test]
    fn test_unnameable_input_still_yields_a_key() {
        let key = agent_key("!!!");
        assert!(key.starts_with("agent-"));
        assert!(key.len() > "agent-".len());
    }
}
