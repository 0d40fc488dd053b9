//! # Asynaptix Core
//!
//! Business logic for the Asynaptix agent marketplace: the reactive
//! catalog store, its remote-collection and identity collaborators, and
//! the prompt flows.
//!
//! ## Architecture
//!
//! - `catalog/` - data model, seed catalog, and the reactive `CatalogStore`
//! - `remote/` - document-collection contract with in-memory and SQLite backends
//! - `flows/` - six prompt-template wrappers around hosted language models
//! - `identity` - current-user contract with the mocked provider
//! - `db` - unified SQLite persistence (catalog documents, prompt templates)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use asynaptix_core::catalog::{seed_agents, CatalogStore};
//! use asynaptix_core::remote::MemoryCollection;
//! use std::sync::Arc;
//!
//! let store = CatalogStore::new(Arc::new(MemoryCollection::new()), seed_agents());
//! store.initialize();
//! let visible = store.agents();
//! ```

pub mod catalog;
pub mod db;
pub mod error;
pub mod flows;
pub mod identity;
pub mod llm;
pub mod models;
pub mod remote;
