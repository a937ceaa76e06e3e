// Database adapter trait and the abstract query model.
//
// Adapters receive model keys ("user", "session") and logical field names and
// are responsible for mapping them onto their own storage. Records travel as
// `serde_json::Value` so the trait stays schema-agnostic.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BetterAuthError;

/// Result type for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, BetterAuthError>;

// ─── Where Clause ────────────────────────────────────────────────

/// Comparison operators for where clauses.
///
/// Deserializing an unknown operator name yields `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Operator {
    /// Equal (default).
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Value is in the given list.
    In,
    /// String contains substring.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
}

impl Default for Operator {
    fn default() -> Self {
        Self::Eq
    }
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::In => "in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        match s {
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "in" => Self::In,
            "contains" => Self::Contains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            _ => Self::Eq,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connector grouping a clause with its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    And,
    Or,
}

/// A single where condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// The logical field name to filter on.
    pub field: String,
    /// The comparison value.
    pub value: serde_json::Value,
    /// The comparison operator (default: Eq).
    #[serde(default)]
    pub operator: Operator,
    /// Group this clause belongs to. `None` is treated as AND.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

impl WhereClause {
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
            connector: None,
        }
    }

    /// Simple equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    pub fn and(mut self) -> Self {
        self.connector = Some(Connector::And);
        self
    }

    pub fn or(mut self) -> Self {
        self.connector = Some(Connector::Or);
        self
    }

    /// Effective connector, defaulting to AND.
    pub fn connector(&self) -> Connector {
        self.connector.unwrap_or(Connector::And)
    }
}

// ─── Sort / Select / Pagination ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyQuery {
    #[serde(default, rename = "where")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The database adapter trait implemented by every storage backend.
#[async_trait]
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Create a new record. Returns the stored record.
    async fn create(
        &self,
        model: &str,
        data: serde_json::Value,
        select: Option<&[String]>,
    ) -> AdapterResult<serde_json::Value>;

    /// Find a single record matching the where clauses.
    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<serde_json::Value>>;

    async fn find_many(
        &self,
        model: &str,
        query: FindManyQuery,
    ) -> AdapterResult<Vec<serde_json::Value>>;

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64>;

    /// Update a single record. Returns `None` when nothing matched.
    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Update every matching record. Returns the number of affected records.
    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<i64>;

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()>;

    /// Delete every matching record. Returns the number of deleted records.
    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_defaults_from_json() {
        let clause: WhereClause =
            serde_json::from_value(serde_json::json!({ "field": "email", "value": "a@b.com" }))
                .unwrap();
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.connector, None);
        assert_eq!(clause.connector(), Connector::And);
    }

    #[test]
    fn test_operator_from_json() {
        let clause: WhereClause = serde_json::from_value(serde_json::json!({
            "field": "name",
            "value": "Al",
            "operator": "starts_with",
            "connector": "OR"
        }))
        .unwrap();
        assert_eq!(clause.operator, Operator::StartsWith);
        assert_eq!(clause.connector(), Connector::Or);
    }

    #[test]
    fn test_unknown_operator_falls_back_to_eq() {
        let op: Operator = serde_json::from_value(serde_json::json!("regex")).unwrap();
        assert_eq!(op, Operator::Eq);
        assert_eq!(Operator::from("bogus"), Operator::Eq);
    }

    #[test]
    fn test_operator_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Operator::EndsWith).unwrap(),
            serde_json::json!("ends_with")
        );
        assert_eq!(Operator::Gte.to_string(), "gte");
    }

    #[test]
    fn test_builders() {
        let clause = WhereClause::new("age", Operator::Gt, 18).or();
        assert_eq!(clause.value, serde_json::json!(18));
        assert_eq!(clause.connector, Some(Connector::Or));
        assert_eq!(WhereClause::eq("id", "u1").and().connector(), Connector::And);
        assert_eq!(SortBy::desc("createdAt").direction, SortDirection::Desc);
    }

    #[test]
    fn test_find_many_query_from_json() {
        let query: FindManyQuery = serde_json::from_value(serde_json::json!({
            "where": [{ "field": "userId", "value": "u1" }],
            "limit": 10,
            "sortBy": { "field": "createdAt", "direction": "desc" }
        }))
        .unwrap();
        assert_eq!(query.where_clauses.len(), 1);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.sort_by, Some(SortBy::desc("createdAt")));
        assert!(query.select.is_none());
    }
}
