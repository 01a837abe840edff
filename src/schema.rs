use rusqlite::Connection;

use crate::errors::GraphEngineError;

/// Creates the two relational edge tables read by
/// [`crate::source::SqliteEdgeSource`] if they are missing.
pub fn ensure_schema(conn: &Connection) -> Result<(), GraphEngineError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collaboration_edges (
            source_id           TEXT NOT NULL,
            target_id           TEXT NOT NULL,
            shared_repositories INTEGER NOT NULL DEFAULT 0,
            interaction_count   INTEGER NOT NULL DEFAULT 0,
            strength            REAL NOT NULL,
            first_date          TEXT,
            last_date           TEXT
        );
        CREATE TABLE IF NOT EXISTS coemployment_edges (
            source_id        TEXT NOT NULL,
            target_id        TEXT NOT NULL,
            shared_companies INTEGER NOT NULL DEFAULT 0,
            overlap_count    INTEGER NOT NULL DEFAULT 0,
            strength         REAL NOT NULL,
            first_date       TEXT,
            last_date        TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_collab_source ON collaboration_edges(source_id);
        CREATE INDEX IF NOT EXISTS idx_collab_target ON collaboration_edges(target_id);
        CREATE INDEX IF NOT EXISTS idx_coemp_source ON coemployment_edges(source_id);
        CREATE INDEX IF NOT EXISTS idx_coemp_target ON coemployment_edges(target_id);
        "#,
    )
    .map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
    Ok(())
}
