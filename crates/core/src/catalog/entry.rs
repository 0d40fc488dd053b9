//! # Catalog Entries
//!
//! The agent record: one marketplace item with pricing, security rating,
//! and provenance. Documents serialize with camelCase keys to stay
//! compatible with the hosted collection format.

use crate::error::WriteError;
use serde::{Deserialize, Serialize};

/// Security classification of a catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityRating {
    /// Audited and endorsed by the marketplace.
    Trusted,
    /// Publisher identity verified.
    Verified,
    /// Passed an automated security scan.
    Scanned,
    /// No assessment on record.
    #[default]
    None,
}

/// Pricing tier of a catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    #[default]
    Free,
    Paid,
}

/// Framework an agent is built with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgentFramework {
    LangChain,
    LlamaIndex,
    Custom,
    AutoGen,
    #[serde(rename = "CrewAI")]
    CrewAi,
}

/// A single marketplace entry.
///
/// The key is caller-assigned and immutable after creation. Seed entries
/// carry `is_user_created: false` and are never written through the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Unique key within the merged catalog view.
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub security_rating: SecurityRating,
    #[serde(default)]
    pub price: PriceTier,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_hint: String,
    /// Distinguishes uploaded entries from the built-in seed catalog.
    #[serde(default)]
    pub is_user_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<AgentFramework>,
    /// Average review score, 0.0..=5.0.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u32,
}

impl Agent {
    /// Check the entry's own invariants (non-empty identity, bounded rating).
    pub fn validate(&self) -> Result<(), WriteError> {
        if self.id.trim().is_empty() {
            return Err(WriteError::Invalid("entry key must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(WriteError::Invalid("entry name must not be empty".into()));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(WriteError::Invalid(format!(
                "rating {} outside the 0..=5 range",
                self.rating
            )));
        }
        Ok(())
    }
}

/// Partial update payload for an existing entry.
///
/// Only populated fields serialize; the remote collection's merge-upsert
/// preserves everything else. There is no way to clear a field, matching
/// the catalog's append/update-only lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_rating: Option<SecurityRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<AgentFramework>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u32>,
}

impl AgentPatch {
    pub fn validate(&self) -> Result<(), WriteError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(WriteError::Invalid("entry name must not be empty".into()));
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(WriteError::Invalid(format!(
                    "rating {} outside the 0..=5 range",
                    rating
                )));
            }
        }
        Ok(())
    }
}
