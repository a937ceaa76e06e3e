// Document transforms between better-auth's logical shape and Payload's
// stored shape.
//
// Writes rename keys to their storage names and leave values alone. Reads copy
// storage keys back to their logical keys (keeping both), reduce populated
// relationship fields to ids and normalise date strings. Keys the schema does
// not declare as relationships keep their values.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::resolver::{is_id_field, FieldResolver};

/// ISO-8601 timestamp: `YYYY-MM-DDTHH:MM:SS[.fff][Z|±HH:MM]`.
static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("valid ISO timestamp regex")
});

/// Rename every key of `data` to its storage field name.
pub fn transform_input(resolver: &FieldResolver<'_>, model: &str, data: &Value) -> Value {
    let Value::Object(fields) = data else {
        return data.clone();
    };
    let renamed: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (resolver.resolve_field_name(model, key), value.clone()))
        .collect();
    Value::Object(renamed)
}

/// Bring a stored document back to the logical shape of `model`.
///
/// Non-object input is returned unchanged.
pub fn transform_output(resolver: &FieldResolver<'_>, model: &str, doc: Value) -> Value {
    let mut map = match doc {
        Value::Object(map) => map,
        other => return other,
    };

    // Keys of declared relationship fields, under both names.
    let mut relations: Vec<String> = Vec::new();
    for (key, field) in resolver.fields(model) {
        let storage = resolver.resolve_field_name(model, key);
        if !map.contains_key(key) {
            if let Some(value) = map.get(&storage).cloned() {
                map.insert(key.to_string(), value);
            }
        }
        if field.is_relationship() {
            relations.push(key.to_string());
            if storage != *key {
                relations.push(storage);
            }
        }
    }

    for key in relations {
        if is_id_field(&key) {
            continue;
        }
        let Some(reduced) = map.get(&key).and_then(reduce_relation) else {
            continue;
        };
        if reduced.is_array() && !key.ends_with("Ids") {
            map.entry(format!("{key}Ids")).or_insert_with(|| reduced.clone());
        }
        map.insert(key, reduced);
    }

    for (key, value) in map.iter_mut() {
        coerce_date(key, value);
    }

    Value::Object(map)
}

/// Reduce a populated relationship to its id, or an array of populated
/// relationships to an array of ids. `None` when there is nothing to reduce.
fn reduce_relation(value: &Value) -> Option<Value> {
    match value {
        Value::Object(obj) => obj.get("id").cloned(),
        Value::Array(items) if items.first().is_some_and(is_populated) => {
            Some(Value::Array(items.iter().map(relation_id).collect()))
        }
        _ => None,
    }
}

fn is_populated(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| obj.contains_key("id"))
}

fn relation_id(value: &Value) -> Value {
    match value {
        Value::Object(obj) => obj.get("id").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

// ─── Dates ───────────────────────────────────────────────────────

fn is_date_key(key: &str) -> bool {
    key == "date" || key.ends_with("At") || key.ends_with("Date")
}

/// Rewrite a date string in canonical RFC 3339 UTC form (millisecond precision).
fn coerce_date(key: &str, value: &mut Value) {
    let Value::String(s) = value else {
        return;
    };
    if !ISO_TIMESTAMP.is_match(s) && !is_date_key(key) {
        return;
    }
    if let Some(parsed) = parse_date(s) {
        *value = Value::String(parsed.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
}

/// Parse the date formats Payload and its database adapters hand back.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use better_auth_core::db::schema::{AuthSchema, AuthTable, FieldType, SchemaField};
    use better_auth_core::logger::AuthLogger;
    use serde_json::json;

    use crate::sync::ResolvedSchema;

    fn schema() -> ResolvedSchema {
        ResolvedSchema::unsynced(
            AuthSchema::core_schema()
                .table(
                    "member",
                    AuthTable::new("members")
                        .field(
                            "organizationId",
                            SchemaField::required_string()
                                .with_reference("organization", "id")
                                .with_field_name("organization"),
                        )
                        .field("role", SchemaField::required_string())
                        .field(
                            "metadata",
                            SchemaField::new(FieldType::Json).with_field_name("meta"),
                        )
                        .field("createdAt", SchemaField::date().with_field_name("joinedAt")),
                )
                .table(
                    "team",
                    AuthTable::new("teams").field(
                        "memberIds",
                        SchemaField::new(FieldType::StringArray)
                            .with_reference("member", "id")
                            .with_field_name("members"),
                    ),
                ),
        )
    }

    fn with_resolver<T>(f: impl FnOnce(&FieldResolver<'_>) -> T) -> T {
        let schema = schema();
        let resolver = FieldResolver::new(&schema, &AuthLogger::silent());
        f(&resolver)
    }

    #[test]
    fn test_input_renames_keys() {
        let stored = with_resolver(|r| {
            transform_input(
                r,
                "member",
                &json!({ "id": "m1", "organizationId": "o1", "role": "owner", "extra": 1 }),
            )
        });
        assert_eq!(
            stored,
            json!({ "id": "m1", "organization": "o1", "role": "owner", "extra": 1 })
        );
    }

    #[test]
    fn test_input_leaves_values_alone() {
        let stored = with_resolver(|r| {
            transform_input(r, "member", &json!({ "createdAt": "2024-05-01 10:00:00" }))
        });
        assert_eq!(stored, json!({ "joinedAt": "2024-05-01 10:00:00" }));
    }

    #[test]
    fn test_non_object_passes_through() {
        with_resolver(|r| {
            assert_eq!(transform_input(r, "member", &json!(null)), json!(null));
            assert_eq!(transform_output(r, "member", json!(null)), json!(null));
            assert_eq!(transform_output(r, "member", json!([1, 2])), json!([1, 2]));
        });
    }

    #[test]
    fn test_output_exposes_both_names() {
        let doc = with_resolver(|r| {
            transform_output(r, "member", json!({ "id": "m1", "organization": "o1" }))
        });
        assert_eq!(doc["organizationId"], json!("o1"));
        assert_eq!(doc["organization"], json!("o1"));
    }

    #[test]
    fn test_output_unwraps_populated_relationship() {
        let doc = with_resolver(|r| {
            transform_output(
                r,
                "member",
                json!({ "id": "m1", "organization": { "id": "o1", "name": "Acme" } }),
            )
        });
        assert_eq!(doc["organizationId"], json!("o1"));
        assert_eq!(doc["organization"], json!("o1"));
    }

    #[test]
    fn test_output_unwraps_relationship_arrays() {
        let doc = with_resolver(|r| {
            transform_output(
                r,
                "team",
                json!({ "id": "t1", "members": [{ "id": "m1" }, { "id": "m2" }] }),
            )
        });
        assert_eq!(doc["memberIds"], json!(["m1", "m2"]));
        assert_eq!(doc["members"], json!(["m1", "m2"]));
        assert_eq!(doc["membersIds"], json!(["m1", "m2"]));
        assert!(doc.get("memberIdsIds").is_none());
    }

    #[test]
    fn test_output_keeps_plain_json_fields() {
        let doc = with_resolver(|r| {
            transform_output(r, "member", json!({ "meta": { "id": "keep", "x": 1 } }))
        });
        assert_eq!(doc["metadata"], json!({ "id": "keep", "x": 1 }));
        assert_eq!(doc["meta"], json!({ "id": "keep", "x": 1 }));
    }

    #[test]
    fn test_output_keeps_undeclared_rows_and_groups() {
        let doc = with_resolver(|r| {
            transform_output(
                r,
                "user",
                json!({
                    "id": "u1",
                    "addresses": [{ "id": "row1", "street": "Main St" }],
                    "profile": { "id": "grp", "bio": "hi" }
                }),
            )
        });
        assert_eq!(doc["addresses"], json!([{ "id": "row1", "street": "Main St" }]));
        assert_eq!(doc["profile"], json!({ "id": "grp", "bio": "hi" }));
        assert!(doc.get("addressesIds").is_none());
    }

    #[test]
    fn test_output_coerces_dates() {
        let doc = with_resolver(|r| {
            transform_output(
                r,
                "member",
                json!({
                    "joinedAt": "2024-05-01 10:00:00",
                    "expiresAt": "2024-05-01",
                    "seen": "2024-05-01T10:00:00+02:00",
                    "role": "2024-05-01",
                    "note": "not a date",
                    "updatedAt": "soon"
                }),
            )
        });
        assert_eq!(doc["createdAt"], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(doc["joinedAt"], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(doc["expiresAt"], json!("2024-05-01T00:00:00.000Z"));
        assert_eq!(doc["seen"], json!("2024-05-01T08:00:00.000Z"));
        assert_eq!(doc["role"], json!("2024-05-01"));
        assert_eq!(doc["note"], json!("not a date"));
        assert_eq!(doc["updatedAt"], json!("soon"));
    }

    #[test]
    fn test_round_trip_preserves_logical_keys() {
        let data = json!({
            "id": "m1",
            "organizationId": "o1",
            "role": "admin",
            "metadata": { "invitedBy": "u9" },
            "createdAt": "2024-05-01T10:00:00.000Z"
        });
        let output = with_resolver(|r| {
            let stored = transform_input(r, "member", &data);
            transform_output(r, "member", stored)
        });
        for (key, value) in data.as_object().unwrap() {
            assert_eq!(&output[key], value, "key {key}");
        }
    }

    #[test]
    fn test_round_trip_unwraps_populated_input() {
        let data = json!({ "organizationId": { "id": "o1", "name": "Acme" }, "role": "admin" });
        let output = with_resolver(|r| {
            let stored = transform_input(r, "member", &data);
            transform_output(r, "member", stored)
        });
        assert_eq!(output["organizationId"], json!("o1"));
        assert_eq!(output["role"], json!("admin"));
    }
}
