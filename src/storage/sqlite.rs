//! SQLite sink

use super::traits::{GraphSink, StorageError, StorageResult};
use crate::graph::KnowledgeGraph;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// SQLite-backed graph sink
///
/// One database holds any number of graphs, each under its own label.
/// Writing a label replaces everything previously stored under it inside a
/// single transaction, so re-running a query upserts.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                label TEXT NOT NULL,
                id TEXT NOT NULL,
                node_type TEXT NOT NULL,
                name TEXT,
                synonyms_json TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                PRIMARY KEY (label, id)
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_type
                ON nodes(label, node_type);

            CREATE TABLE IF NOT EXISTS edges (
                label TEXT NOT NULL,
                id TEXT NOT NULL,
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                role TEXT NOT NULL,
                provenance TEXT NOT NULL,
                function TEXT NOT NULL,
                reversed INTEGER NOT NULL,
                properties_json TEXT NOT NULL,
                PRIMARY KEY (label, id)
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source
                ON edges(label, source);
            CREATE INDEX IF NOT EXISTS idx_edges_target
                ON edges(label, target);
            CREATE INDEX IF NOT EXISTS idx_edges_role
                ON edges(label, role);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Open or create a database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Replace every row stored under `label` with the contents of `graph`.
    pub fn save(&self, graph: &KnowledgeGraph, label: &str) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM edges WHERE label = ?1", params![label])?;
        tx.execute("DELETE FROM nodes WHERE label = ?1", params![label])?;

        for (_, node) in graph.nodes() {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO nodes (label, id, node_type, name, synonyms_json, properties_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    label,
                    node.identifier,
                    node.node_type.as_str(),
                    node.label,
                    serde_json::to_string(&node.synonyms)?,
                    serde_json::to_string(&node.properties)?,
                ],
            )?;
        }

        for (_, edge) in graph.edges() {
            let (Some(source), Some(target)) = (graph.node(edge.source), graph.node(edge.target)) else {
                continue;
            };
            tx.execute(
                r#"
                INSERT OR REPLACE INTO edges (label, id, source, target, role, provenance, function, reversed, properties_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    label,
                    edge.id.to_string(),
                    source.identifier,
                    target.identifier,
                    edge.role().as_str(),
                    edge.relationship.provenance,
                    edge.relationship.function,
                    edge.reversed,
                    serde_json::to_string(&edge.relationship.properties)?,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Labels with at least one stored node, sorted.
    pub fn labels(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT label FROM nodes ORDER BY label")?;
        let labels = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(labels)
    }

    /// Stored (node, edge) counts for `label`.
    pub fn counts(&self, label: &str) -> StorageResult<(usize, usize)> {
        let conn = self.lock()?;
        let nodes: i64 = conn.query_row("SELECT COUNT(*) FROM nodes WHERE label = ?1", params![label], |row| {
            row.get(0)
        })?;
        let edges: i64 = conn.query_row("SELECT COUNT(*) FROM edges WHERE label = ?1", params![label], |row| {
            row.get(0)
        })?;
        Ok((nodes as usize, edges as usize))
    }

    /// Stored edges for `label` as (source, role, target), sorted.
    pub fn edge_summary(&self, label: &str) -> StorageResult<Vec<(String, String, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source, role, target FROM edges WHERE label = ?1 ORDER BY source, role, target",
        )?;
        let rows = stmt
            .query_map(params![label], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl GraphSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn write(&self, graph: &KnowledgeGraph, label: &str) -> StorageResult<()> {
        self.save(graph, label)?;
        info!(label, nodes = graph.node_count(), edges = graph.edge_count(), "graph written to sqlite");
        Ok(())
    }
}
