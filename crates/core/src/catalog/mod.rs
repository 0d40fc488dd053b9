pub mod entry;
pub mod keys;
pub mod seed;
pub mod store;
pub mod tools;

pub use entry::{Agent, AgentFramework, AgentPatch, PriceTier, SecurityRating};
pub use keys::{agent_key, slugify};
pub use seed::seed_agents;
pub use store::{CatalogStore, StoreSubscription, AGENTS_COLLECTION};
pub use tools::{builtin_tools, Tool, ToolCategory, ToolKind};
