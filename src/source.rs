//! Relational edge sources.
//!
//! The engine never owns relational storage. It pulls a unioned, typed edge
//! stream through [`EdgeSource`] when a rebuild is requested.

use std::path::Path;

use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::{
    errors::GraphEngineError,
    rows::{EdgeRow, RawEdgeRow},
    schema::ensure_schema,
};

pub trait EdgeSource {
    /// Every collaboration and co-employment edge, validated.
    fn fetch_edges(&self) -> Result<Vec<EdgeRow>, GraphEngineError>;
}

impl EdgeSource for Vec<EdgeRow> {
    fn fetch_edges(&self) -> Result<Vec<EdgeRow>, GraphEngineError> {
        Ok(self.clone())
    }
}

impl EdgeSource for [EdgeRow] {
    fn fetch_edges(&self) -> Result<Vec<EdgeRow>, GraphEngineError> {
        Ok(self.to_vec())
    }
}

const UNION_QUERY: &str = "
    SELECT source_id, target_id, shared_repositories, interaction_count,
           strength, first_date, last_date, 'collaboration'
      FROM collaboration_edges
    UNION ALL
    SELECT source_id, target_id, shared_companies, overlap_count,
           strength, first_date, last_date, 'co_employment'
      FROM coemployment_edges";

/// Reads `collaboration_edges` and `coemployment_edges` from SQLite.
pub struct SqliteEdgeSource {
    conn: Connection,
}

impl SqliteEdgeSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphEngineError> {
        let conn =
            Connection::open(path).map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, GraphEngineError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection; the tables must already exist.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Writes one row into the table matching its variant.
    pub fn insert(&self, row: &EdgeRow) -> Result<(), GraphEngineError> {
        let (table, units_col, count_col) = match row {
            EdgeRow::Collaboration(_) => (
                "collaboration_edges",
                "shared_repositories",
                "interaction_count",
            ),
            EdgeRow::CoEmployment(_) => ("coemployment_edges", "shared_companies", "overlap_count"),
        };
        let metadata = row.metadata();
        let sql = format!(
            "INSERT INTO {table}(source_id, target_id, {units_col}, {count_col}, strength, first_date, last_date)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    row.source_id(),
                    row.target_id(),
                    to_sql_count(metadata.shared_units)?,
                    to_sql_count(metadata.interaction_count)?,
                    row.strength(),
                    metadata.first_date,
                    metadata.last_date,
                ],
            )
            .map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
        Ok(())
    }
}

impl EdgeSource for SqliteEdgeSource {
    fn fetch_edges(&self) -> Result<Vec<EdgeRow>, GraphEngineError> {
        let mut stmt = self
            .conn
            .prepare(UNION_QUERY)
            .map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
        let raw_rows = stmt
            .query_map([], row_to_raw)
            .map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
        let mut rows = Vec::new();
        for raw in raw_rows {
            let raw = raw.map_err(|e| GraphEngineError::edge_source(e.to_string()))?;
            rows.push(EdgeRow::try_from(raw)?);
        }
        debug!(rows = rows.len(), "edge rows fetched from sqlite");
        Ok(rows)
    }
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawEdgeRow> {
    Ok(RawEdgeRow {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        shared_units: row.get(2)?,
        interaction_count: row.get(3)?,
        strength: row.get(4)?,
        first_date: row.get(5)?,
        last_date: row.get(6)?,
        edge_type: row.get(7)?,
    })
}

fn to_sql_count(value: u64) -> Result<i64, GraphEngineError> {
    i64::try_from(value)
        .map_err(|_| GraphEngineError::invalid_input(format!("count {value} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::EdgeType;

    #[test]
    fn test_union_reads_both_tables() {
        let source = SqliteEdgeSource::open_in_memory().unwrap();
        source
            .insert(&EdgeRow::collaboration("ana", "ben", 0.8))
            .unwrap();
        source
            .insert(&EdgeRow::co_employment("ana", "cal", 0.3))
            .unwrap();
        let rows = source.fetch_edges().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].edge_type(), EdgeType::Collaboration);
        assert_eq!(rows[1].edge_type(), EdgeType::CoEmployment);
        assert_eq!(rows[1].target_id(), "cal");
    }

    #[test]
    fn test_invalid_row_aborts_fetch() {
        let source = SqliteEdgeSource::open_in_memory().unwrap();
        source
            .insert(&EdgeRow::collaboration("ana", "ben", 0.8))
            .unwrap();
        source
            .connection()
            .execute(
                "INSERT INTO coemployment_edges(source_id, target_id, strength) VALUES('x', 'y', 3.5)",
                [],
            )
            .unwrap();
        let err = source.fetch_edges().unwrap_err();
        assert!(matches!(err, GraphEngineError::InvalidInput(_)));
    }
}
