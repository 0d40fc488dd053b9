//! # Tool Catalog
//!
//! Static, read-only catalog of the tools and plugins agents can be built
//! with. Defined at process start; no lifecycle.

use serde::{Deserialize, Serialize};

/// Distribution category of a tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolCategory {
    Baseline,
    Community,
    Premium,
}

/// Structural type of a catalog tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Tool,
    Plugin,
}

/// One entry in the tool catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    #[serde(default)]
    pub is_official: bool,
}

impl Tool {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        category: ToolCategory,
        kind: ToolKind,
        is_official: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            kind,
            is_official,
        }
    }
}

/// The built-in tool catalog.
pub fn builtin_tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "g-suite-plugin",
            "G-Suite Plugin",
            "A plugin that provides a suite of tools for interacting with Google Workspace (Docs, Sheets, etc.).",
            ToolCategory::Community,
            ToolKind::Plugin,
            true,
        ),
        Tool::new(
            "calculator",
            "Calculator",
            "A baseline tool for performing mathematical calculations.",
            ToolCategory::Baseline,
            ToolKind::Tool,
            false,
        ),
        Tool::new(
            "web-search",
            "Web Search",
            "Enables agents to search the web for information.",
            ToolCategory::Baseline,
            ToolKind::Tool,
            false,
        ),
        Tool::new(
            "api-connector",
            "API Connector",
            "Connect to any third-party API to fetch or send data.",
            ToolCategory::Community,
            ToolKind::Tool,
            false,
        ),
        Tool::new(
            "database-reader",
            "Database Reader",
            "Allows agents to read data from connected SQL databases.",
            ToolCategory::Community,
            ToolKind::Tool,
            false,
        ),
        Tool::new(
            "data-visualizer",
            "Data Visualizer",
            "Generate charts and graphs from datasets.",
            ToolCategory::Premium,
            ToolKind::Tool,
            false,
        ),
        Tool::new(
            "document-parser",
            "Document Parser",
            "Extract text and data from PDF and DOCX files.",
            ToolCategory::Community,
            ToolKind::Tool,
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_are_unique() {
        let tools = builtin_tools();
        let mut ids: Vec<_> = tools.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), tools.len());
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_value(&builtin_tools()[0]).unwrap();
        assert_eq!(json["type"], "plugin");
        assert_eq!(json["category"], "Community");
        assert_eq!(json["isOfficial"], true);
    }
}
