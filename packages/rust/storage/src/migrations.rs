//! SQL migration definitions for the CheckIO database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: featured_category_config singleton",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Featured category configuration. The CHECK on the key pins the table to one row.
CREATE TABLE IF NOT EXISTS featured_category_config (
    slot                 TEXT PRIMARY KEY CHECK (slot = 'featured'),
    mode                 TEXT NOT NULL DEFAULT 'select' CHECK (mode IN ('select', 'fixed')),
    allowed_category_ids TEXT NOT NULL DEFAULT '[]',
    updated_at           TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
