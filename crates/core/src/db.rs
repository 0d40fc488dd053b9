//! # Unified Asynaptix Database
//!
//! Single SQLite database for all local persistence: catalog documents and
//! prompt templates, at `.asynaptix/asynaptix.db`.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::flows::prompts;
use crate::remote::merge_document;

/// Schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Unified database manager for all Asynaptix state
pub struct AsynaptixDb {
    conn: Arc<Mutex<Connection>>,
}

impl AsynaptixDb {
    /// Open or create the unified database at `.asynaptix/asynaptix.db`
    pub fn open() -> Result<Self> {
        Self::open_at(".asynaptix/asynaptix.db")
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(path.as_ref()).context("Failed to open asynaptix database")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Get a shared connection for use by other modules
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Run schema migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < 1 {
            self.migrate_v1(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                [1],
            )?;
        }

        Ok(())
    }

    /// Migration to version 1 - complete schema
    fn migrate_v1(&self, conn: &Connection) -> Result<()> {
        // Catalog documents, keyed by (collection, key). `seq` preserves
        // insertion order across later updates.
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                seq INTEGER NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (collection, key)
            )
            "#,
            [],
        )?;

        // Prompt templates (flow system prompts with version control)
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS prompt_templates (
                slug TEXT PRIMARY KEY,
                version INTEGER NOT NULL DEFAULT 1,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq)",
            [],
        )?;

        tracing::info!(
            "AsynaptixDb initialized with schema version {}",
            SCHEMA_VERSION
        );

        Ok(())
    }

    // =========================================================================
    // Document Methods
    // =========================================================================

    /// Upsert a document; returns the stored value.
    ///
    /// With `merge`, supplied fields are shallow-merged into any existing
    /// document; otherwise it is replaced wholesale.
    pub fn upsert_document(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
        merge: bool,
    ) -> Result<Value> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND key = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;

        let stored = match existing {
            Some(data) => {
                let merged = if merge {
                    let mut base: Value =
                        serde_json::from_str(&data).context("Stored document is not valid JSON")?;
                    merge_document(&mut base, document);
                    base
                } else {
                    document.clone()
                };
                conn.execute(
                    r#"
                    UPDATE documents SET data = ?3, updated_at = datetime('now')
                    WHERE collection = ?1 AND key = ?2
                    "#,
                    params![collection, key, serde_json::to_string(&merged)?],
                )
                .context("Failed to update document")?;
                merged
            }
            None => {
                let seq: i64 = conn.query_row(
                    "SELECT COALESCE(MAX(seq) + 1, 0) FROM documents WHERE collection = ?1",
                    params![collection],
                    |row| row.get(0),
                )?;
                conn.execute(
                    "INSERT INTO documents (collection, key, seq, data) VALUES (?1, ?2, ?3, ?4)",
                    params![collection, key, seq, serde_json::to_string(document)?],
                )
                .context("Failed to insert document")?;
                document.clone()
            }
        };

        Ok(stored)
    }

    /// Get a document by key
    pub fn get_document(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND key = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(Some(
                serde_json::from_str(&data).context("Stored document is not valid JSON")?,
            )),
            None => Ok(None),
        }
    }

    /// All documents of a collection, in insertion order
    pub fn list_documents(&self, collection: &str) -> Result<Vec<Value>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT data FROM documents WHERE collection = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

        let mut documents = Vec::new();
        for row in rows {
            let data = row?;
            documents
                .push(serde_json::from_str(&data).context("Stored document is not valid JSON")?);
        }
        Ok(documents)
    }

    // =========================================================================
    // Prompt Template Methods
    // =========================================================================

    /// Seed default prompts if the table is empty
    pub fn seed_prompts(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM prompt_templates", [], |row| {
            row.get(0)
        })?;

        if count > 0 {
            tracing::debug!("Prompts already seeded ({} found)", count);
            return Ok(0);
        }

        let defaults = prompts::all_defaults();
        let mut inserted = 0;

        for (slug, content) in defaults {
            conn.execute(
                "INSERT INTO prompt_templates (slug, version, content) VALUES (?1, 1, ?2)",
                params![slug, content],
            )?;
            inserted += 1;
        }

        tracing::info!("Seeded {} default prompts", inserted);
        Ok(inserted)
    }

    /// Get a prompt by slug
    pub fn get_prompt(&self, slug: &str) -> Result<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.query_row(
            "SELECT content FROM prompt_templates WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )
        .with_context(|| format!("Prompt '{}' not found", slug))
    }

    /// Get a prompt with its version
    pub fn get_prompt_versioned(&self, slug: &str) -> Result<(String, i32)> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.query_row(
            "SELECT content, version FROM prompt_templates WHERE slug = ?1",
            params![slug],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .with_context(|| format!("Prompt '{}' not found", slug))
    }

    /// Update a prompt (increments version automatically)
    pub fn set_prompt(&self, slug: &str, content: &str) -> Result<i32> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let current_version: i32 = conn
            .query_row(
                "SELECT version FROM prompt_templates WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let new_version = current_version + 1;

        conn.execute(
            r#"
            INSERT INTO prompt_templates (slug, version, content, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(slug) DO UPDATE SET
                version = ?2,
                content = ?3,
                updated_at = datetime('now')
            "#,
            params![slug, new_version, content],
        )?;

        tracing::debug!("Updated prompt '{}' to version {}", slug, new_version);
        Ok(new_version)
    }

    /// List all prompt slugs with their versions
    pub fn list_prompts(&self) -> Result<Vec<(String, i32)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn.prepare("SELECT slug, version FROM prompt_templates ORDER BY slug")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut prompts = Vec::new();
        for row in rows {
            prompts.push(row?);
        }
        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_asynaptix_db_open_creates_tables() {
        let path = ".asynaptix/test_asynaptix.db";
        let _ = fs::remove_file(path);

        let db = AsynaptixDb::open_at(path).unwrap();
        let conn = db.connection();
        let conn = conn.lock().unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"prompt_templates".to_string()));

        drop(conn);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_schema_version_tracking() {
        let path = ".asynaptix/test_asynaptix_version.db";
        let _ = fs::remove_file(path);

        // Open twice - should not fail on second open
        let _db1 = AsynaptixDb::open_at(path).unwrap();
        drop(_db1);

        let db2 = AsynaptixDb::open_at(path).unwrap();
        let conn = db2.connection();
        let conn = conn.lock().unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();

        assert_eq!(version, SCHEMA_VERSION);

        drop(conn);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_document_merge_retains_fields() {
        let path = ".asynaptix/test_doc_merge.db";
        let _ = fs::remove_file(path);

        let db = AsynaptixDb::open_at(path).unwrap();
        db.upsert_document("agents", "x", &json!({ "id": "x", "rating": 4.5 }), true)
            .unwrap();
        let stored = db
            .upsert_document("agents", "x", &json!({ "id": "x", "price": "paid" }), true)
            .unwrap();

        assert_eq!(stored["rating"], 4.5);
        assert_eq!(stored["price"], "paid");
        assert_eq!(db.get_document("agents", "x").unwrap().unwrap(), stored);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_document_order_survives_updates() {
        let path = ".asynaptix/test_doc_order.db";
        let _ = fs::remove_file(path);

        let db = AsynaptixDb::open_at(path).unwrap();
        db.upsert_document("agents", "first", &json!({ "id": "first" }), true)
            .unwrap();
        db.upsert_document("agents", "second", &json!({ "id": "second" }), true)
            .unwrap();
        db.upsert_document("agents", "first", &json!({ "touched": true }), true)
            .unwrap();

        let docs = db.list_documents("agents").unwrap();
        assert_eq!(docs[0]["id"], "first");
        assert_eq!(docs[1]["id"], "second");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_prompt_seeding() {
        let path = ".asynaptix/test_prompts.db";
        let _ = fs::remove_file(path);

        let db = AsynaptixDb::open_at(path).unwrap();

        // First seed should insert all defaults
        let count = db.seed_prompts().unwrap();
        assert!(count > 0, "Should seed default prompts");

        // Second seed should be no-op
        let count2 = db.seed_prompts().unwrap();
        assert_eq!(count2, 0, "Should not re-seed");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_prompt_crud() {
        let path = ".asynaptix/test_prompt_crud.db";
        let _ = fs::remove_file(path);

        let db = AsynaptixDb::open_at(path).unwrap();
        db.seed_prompts().unwrap();

        let content = db.get_prompt("security_auditor").unwrap();
        assert!(
            content.to_lowercase().contains("security"),
            "Should contain prompt content"
        );

        let new_version = db
            .set_prompt("security_auditor", "New auditor prompt v2")
            .unwrap();
        assert_eq!(new_version, 2, "Version should increment");

        let (content, version) = db.get_prompt_versioned("security_auditor").unwrap();
        assert_eq!(content, "New auditor prompt v2");
        assert_eq!(version, 2);

        let _ = fs::remove_file(path);
    }
}
