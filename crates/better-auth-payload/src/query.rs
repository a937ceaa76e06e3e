// Payload query builder: converts core adapter types into Payload's query
// language: `where` objects, `select` maps and `sort` strings.

use better_auth_core::db::adapter::{Connector, Operator, SortBy, SortDirection, WhereClause};
use serde_json::{json, Map, Value};

use crate::error::{PayloadAdapterError, PayloadResult};
use crate::resolver::FieldResolver;

/// Convert where clauses to a Payload `where` object.
///
/// A single clause becomes `{ field: { op: value } }`. Several clauses are
/// grouped by connector into `{ and: [...], or: [...] }`, omitting empty groups.
pub fn convert_where_clause(
    resolver: &FieldResolver<'_>,
    model: &str,
    clauses: &[WhereClause],
) -> PayloadResult<Value> {
    match clauses {
        [] => Ok(json!({})),
        [clause] => clause_to_condition(resolver, model, clause),
        _ => {
            let mut and_conditions: Vec<Value> = Vec::new();
            let mut or_conditions: Vec<Value> = Vec::new();

            for clause in clauses {
                let condition = clause_to_condition(resolver, model, clause)?;
                match clause.connector() {
                    Connector::And => and_conditions.push(condition),
                    Connector::Or => or_conditions.push(condition),
                }
            }

            let mut query = Map::new();
            if !and_conditions.is_empty() {
                query.insert("and".to_string(), Value::Array(and_conditions));
            }
            if !or_conditions.is_empty() {
                query.insert("or".to_string(), Value::Array(or_conditions));
            }
            Ok(Value::Object(query))
        }
    }
}

/// Convert a single where clause to `{ resolvedField: { operator: value } }`.
fn clause_to_condition(
    resolver: &FieldResolver<'_>,
    model: &str,
    clause: &WhereClause,
) -> PayloadResult<Value> {
    let field = resolver.resolve_field_name(model, &clause.field);
    let value = normalize_operand(&clause.field, &clause.value)?;

    let mut condition = Map::new();
    condition.insert(field, operator_condition(&clause.operator, value));
    Ok(Value::Object(condition))
}

/// Reduce an object operand to a scalar: its `id`, or the value stored under
/// the clause's own field name. Any other object is rejected.
pub fn normalize_operand(field: &str, value: &Value) -> PayloadResult<Value> {
    match value {
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get(field))
            .cloned()
            .ok_or_else(|| PayloadAdapterError::invalid_operand(field, value)),
        other => Ok(other.clone()),
    }
}

/// Map an operator and its operand onto Payload's operator object.
fn operator_condition(operator: &Operator, value: Value) -> Value {
    match operator {
        Operator::Eq => json!({ "equals": value }),
        Operator::Ne => json!({ "not_equals": value }),
        Operator::Gt => json!({ "greater_than": value }),
        Operator::Gte => json!({ "greater_than_equal": value }),
        Operator::Lt => json!({ "less_than": value }),
        Operator::Lte => json!({ "less_than_equal": value }),
        Operator::Contains => json!({ "contains": value }),
        Operator::In => match value {
            Value::Array(_) => json!({ "in": value }),
            scalar => json!({ "in": [scalar] }),
        },
        Operator::StartsWith => json!({ "like": format!("{}%", operand_text(&value)) }),
        Operator::EndsWith => json!({ "like": format!("%{}", operand_text(&value)) }),
    }
}

fn operand_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a Payload `select` map. `None` (or an empty list) selects everything.
pub fn convert_select(
    resolver: &FieldResolver<'_>,
    model: &str,
    fields: Option<&[String]>,
) -> Option<Map<String, Value>> {
    let fields = fields.filter(|f| !f.is_empty())?;
    Some(
        fields
            .iter()
            .map(|f| (resolver.resolve_field_name(model, f), Value::Bool(true)))
            .collect(),
    )
}

/// Build a Payload sort string: the storage field, prefixed with `-` when descending.
pub fn convert_sort(
    resolver: &FieldResolver<'_>,
    model: &str,
    sort: Option<&SortBy>,
) -> Option<String> {
    sort.map(|sort| {
        let field = resolver.resolve_field_name(model, &sort.field);
        match sort.direction {
            SortDirection::Asc => field,
            SortDirection::Desc => format!("-{field}"),
        }
    })
}
