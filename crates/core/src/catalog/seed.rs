//! Built-in seed catalog: always present, regardless of remote store state.

use super::entry::{Agent, AgentFramework, PriceTier, SecurityRating};

fn seed(
    id: &str,
    name: &str,
    description: &str,
    security_rating: SecurityRating,
    price: PriceTier,
    image_hint: &str,
    framework: Option<AgentFramework>,
    rating: f64,
    rating_count: u32,
) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        security_rating,
        price,
        image_url: "https://picsum.photos/600/400".to_string(),
        image_hint: image_hint.to_string(),
        is_user_created: false,
        framework,
        rating,
        rating_count,
    }
}

/// The fixed seed entries, in catalog display order.
pub fn seed_agents() -> Vec<Agent> {
    vec![
        seed(
            "data-analyst",
            "Data Analyst Agent",
            "An agent that can analyze data from various sources and generate reports.",
            SecurityRating::Trusted,
            PriceTier::Paid,
            "data chart",
            Some(AgentFramework::Custom),
            4.5,
            120,
        ),
        seed(
            "social-media-manager",
            "Social Media Manager",
            "Automates social media posts, tracks engagement, and generates content ideas.",
            SecurityRating::Verified,
            PriceTier::Free,
            "social media",
            Some(AgentFramework::Custom),
            4.2,
            88,
        ),
        seed(
            "code-generator",
            "Code Generator Agent",
            "Generates boilerplate code in multiple languages based on your specifications.",
            SecurityRating::Scanned,
            PriceTier::Free,
            "code screen",
            Some(AgentFramework::LangChain),
            3.8,
            250,
        ),
        seed(
            "research-assistant",
            "Research Assistant",
            "Gathers and summarizes information from the web on any given topic.",
            SecurityRating::Trusted,
            PriceTier::Paid,
            "books library",
            Some(AgentFramework::Custom),
            4.9,
            450,
        ),
        seed(
            "personal-finance-bot",
            "Personal Finance Bot",
            "Tracks your expenses, creates budgets, and provides financial advice.",
            SecurityRating::None,
            PriceTier::Free,
            "money wallet",
            None,
            3.2,
            50,
        ),
        seed(
            "travel-planner",
            "AI Travel Planner",
            "Finds the best flights and accommodations for your next trip.",
            SecurityRating::Verified,
            PriceTier::Free,
            "travel map",
            Some(AgentFramework::LlamaIndex),
            4.0,
            95,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_entries_are_valid() {
        for agent in seed_agents() {
            agent.validate().unwrap();
            assert!(!agent.is_user_created, "{} must not be user-created", agent.id);
        }
    }

    #[test]
    fn test_seed_keys_are_unique() {
        let agents = seed_agents();
        let mut ids: Vec<_> = agents.iter().map(|a| a.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), agents.len());
    }
}
