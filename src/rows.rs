//! Edge rows at the ingestion boundary.
//!
//! The relational source hands over loosely-typed rows ([`RawEdgeRow`]);
//! [`EdgeRow::try_from`] validates them into a tagged union so the rest of the
//! engine never sees an unknown edge type or an out-of-range strength.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::GraphEngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Collaboration,
    CoEmployment,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Collaboration => "collaboration",
            EdgeType::CoEmployment => "co_employment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "collaboration" | "collab" | "repository" => Some(EdgeType::Collaboration),
            "co_employment" | "coemployment" | "co-employment" | "coworker" => {
                Some(EdgeType::CoEmployment)
            }
            _ => None,
        }
    }
}

/// Row shape as produced by the relational query, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEdgeRow {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub shared_units: i64,
    #[serde(default)]
    pub interaction_count: i64,
    pub strength: f64,
    #[serde(default)]
    pub first_date: Option<String>,
    #[serde(default)]
    pub last_date: Option<String>,
    pub edge_type: String,
}

/// Two people who contributed to the same code repositories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollaborationEdgeRow {
    pub source_id: String,
    pub target_id: String,
    pub shared_repositories: u64,
    pub interaction_count: u64,
    pub strength: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Two people who worked at the same company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoEmploymentEdgeRow {
    pub source_id: String,
    pub target_id: String,
    pub shared_companies: u64,
    pub overlap_count: u64,
    pub strength: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeRow {
    Collaboration(CollaborationEdgeRow),
    CoEmployment(CoEmploymentEdgeRow),
}

/// Edge metadata carried into the graph, independent of the row variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    pub shared_units: u64,
    pub interaction_count: u64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

impl EdgeMetadata {
    /// Folds a duplicate row for the same pair and type into this one.
    pub fn merge(&mut self, other: &EdgeMetadata) {
        self.shared_units = self.shared_units.saturating_add(other.shared_units);
        self.interaction_count = self
            .interaction_count
            .saturating_add(other.interaction_count);
        self.first_date = earliest(self.first_date.take(), other.first_date.clone());
        self.last_date = latest(self.last_date.take(), other.last_date.clone());
    }
}

impl EdgeRow {
    /// Minimal collaboration row, mostly for fixtures.
    pub fn collaboration(source: &str, target: &str, strength: f64) -> Self {
        EdgeRow::Collaboration(CollaborationEdgeRow {
            source_id: source.to_string(),
            target_id: target.to_string(),
            shared_repositories: 1,
            interaction_count: 1,
            strength,
            first_date: None,
            last_date: None,
        })
    }

    /// Minimal co-employment row, mostly for fixtures.
    pub fn co_employment(source: &str, target: &str, strength: f64) -> Self {
        EdgeRow::CoEmployment(CoEmploymentEdgeRow {
            source_id: source.to_string(),
            target_id: target.to_string(),
            shared_companies: 1,
            overlap_count: 1,
            strength,
            first_date: None,
            last_date: None,
        })
    }

    pub fn source_id(&self) -> &str {
        match self {
            EdgeRow::Collaboration(row) => &row.source_id,
            EdgeRow::CoEmployment(row) => &row.source_id,
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            EdgeRow::Collaboration(row) => &row.target_id,
            EdgeRow::CoEmployment(row) => &row.target_id,
        }
    }

    pub fn strength(&self) -> f64 {
        match self {
            EdgeRow::Collaboration(row) => row.strength,
            EdgeRow::CoEmployment(row) => row.strength,
        }
    }

    pub fn edge_type(&self) -> EdgeType {
        match self {
            EdgeRow::Collaboration(_) => EdgeType::Collaboration,
            EdgeRow::CoEmployment(_) => EdgeType::CoEmployment,
        }
    }

    pub fn metadata(&self) -> EdgeMetadata {
        match self {
            EdgeRow::Collaboration(row) => EdgeMetadata {
                shared_units: row.shared_repositories,
                interaction_count: row.interaction_count,
                first_date: row.first_date.clone(),
                last_date: row.last_date.clone(),
            },
            EdgeRow::CoEmployment(row) => EdgeMetadata {
                shared_units: row.shared_companies,
                interaction_count: row.overlap_count,
                first_date: row.first_date.clone(),
                last_date: row.last_date.clone(),
            },
        }
    }

    /// Trimmed endpoints ordered so that `a - b` and `b - a` produce the same key.
    pub fn canonical_endpoints(&self) -> (&str, &str) {
        let (source, target) = (self.source_id().trim(), self.target_id().trim());
        if source <= target {
            (source, target)
        } else {
            (target, source)
        }
    }

    pub(crate) fn canonical_cmp(&self, other: &EdgeRow) -> Ordering {
        self.canonical_endpoints()
            .cmp(&other.canonical_endpoints())
            .then_with(|| self.edge_type().cmp(&other.edge_type()))
            .then_with(|| {
                other
                    .strength()
                    .partial_cmp(&self.strength())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl TryFrom<RawEdgeRow> for EdgeRow {
    type Error = GraphEngineError;

    fn try_from(raw: RawEdgeRow) -> Result<Self, Self::Error> {
        let source_id = raw.source_id.trim().to_string();
        let target_id = raw.target_id.trim().to_string();
        if source_id.is_empty() || target_id.is_empty() {
            return Err(GraphEngineError::invalid_input(
                "edge endpoints must be non-empty ids",
            ));
        }
        validate_strength(raw.strength)?;
        let shared_units = non_negative(raw.shared_units, "shared_units")?;
        let interaction_count = non_negative(raw.interaction_count, "interaction_count")?;
        if let (Some(first), Some(last)) = (&raw.first_date, &raw.last_date) {
            if first > last {
                return Err(GraphEngineError::invalid_input(format!(
                    "first_date {first} is after last_date {last}"
                )));
            }
        }
        let edge_type = EdgeType::parse(&raw.edge_type).ok_or_else(|| {
            GraphEngineError::invalid_input(format!("unknown edge type {}", raw.edge_type))
        })?;
        Ok(match edge_type {
            EdgeType::Collaboration => EdgeRow::Collaboration(CollaborationEdgeRow {
                source_id,
                target_id,
                shared_repositories: shared_units,
                interaction_count,
                strength: raw.strength,
                first_date: raw.first_date,
                last_date: raw.last_date,
            }),
            EdgeType::CoEmployment => EdgeRow::CoEmployment(CoEmploymentEdgeRow {
                source_id,
                target_id,
                shared_companies: shared_units,
                overlap_count: interaction_count,
                strength: raw.strength,
                first_date: raw.first_date,
                last_date: raw.last_date,
            }),
        })
    }
}

pub fn validate_strength(strength: f64) -> Result<(), GraphEngineError> {
    if !strength.is_finite() || !(0.0..=1.0).contains(&strength) {
        return Err(GraphEngineError::invalid_input(format!(
            "edge strength {strength} must be within [0, 1]"
        )));
    }
    Ok(())
}

fn non_negative(value: i64, field: &str) -> Result<u64, GraphEngineError> {
    u64::try_from(value)
        .map_err(|_| GraphEngineError::invalid_input(format!("{field} must not be negative")))
}

fn earliest(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(edge_type: &str, strength: f64) -> RawEdgeRow {
        RawEdgeRow {
            source_id: " alice ".into(),
            target_id: "bob".into(),
            shared_units: 3,
            interaction_count: 12,
            strength,
            first_date: Some("2019-01-01".into()),
            last_date: Some("2021-06-30".into()),
            edge_type: edge_type.into(),
        }
    }

    #[test]
    fn test_raw_row_validates_into_variant() {
        let row = EdgeRow::try_from(raw("collaboration", 0.4)).unwrap();
        assert_eq!(row.edge_type(), EdgeType::Collaboration);
        assert_eq!(row.source_id(), "alice");
        assert_eq!(row.metadata().shared_units, 3);

        let row = EdgeRow::try_from(raw("co_employment", 1.0)).unwrap();
        match row {
            EdgeRow::CoEmployment(inner) => assert_eq!(inner.overlap_count, 12),
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn test_raw_row_rejections() {
        assert!(EdgeRow::try_from(raw("friendship", 0.5)).is_err());
        assert!(EdgeRow::try_from(raw("collaboration", 1.5)).is_err());
        assert!(EdgeRow::try_from(raw("collaboration", f64::NAN)).is_err());
        let mut negative = raw("collaboration", 0.5);
        negative.shared_units = -1;
        assert!(EdgeRow::try_from(negative).is_err());
        let mut reversed = raw("collaboration", 0.5);
        reversed.first_date = Some("2022-01-01".into());
        assert!(EdgeRow::try_from(reversed).is_err());
        let mut blank = raw("collaboration", 0.5);
        blank.target_id = "  ".into();
        assert!(EdgeRow::try_from(blank).is_err());
    }

    #[test]
    fn test_metadata_merge_widens_dates() {
        let mut left = EdgeMetadata {
            shared_units: 1,
            interaction_count: 2,
            first_date: Some("2020-03-01".into()),
            last_date: None,
        };
        let right = EdgeMetadata {
            shared_units: 2,
            interaction_count: 5,
            first_date: Some("2019-01-01".into()),
            last_date: Some("2021-01-01".into()),
        };
        left.merge(&right);
        assert_eq!(left.shared_units, 3);
        assert_eq!(left.interaction_count, 7);
        assert_eq!(left.first_date.as_deref(), Some("2019-01-01"));
        assert_eq!(left.last_date.as_deref(), Some("2021-01-01"));
    }
}
