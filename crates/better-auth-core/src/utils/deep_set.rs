// Deep-path setter for assembling nested JSON from flat `(path, value)` pairs.
//
// Path tokens are separated by `.`:
//
// - `key`      descend into (or create) the object at `key`
// - `key[]`    append to the array at `key`
// - `[]key`    prepend to the array at `key`
// - `key[n]`   write index `n` of the array at `key`, padding lower slots with null
//
// A bare `[]` / `[n]` token applies to the key before it, so `list.[]` prepends
// to `list`. Indices above `MAX_INDEX` are not array writes; the token is kept
// as a plain key. Paths are parsed once into `Path` and can be applied many times.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Largest index a `key[n]` token may address.
pub const MAX_INDEX: usize = 65_535;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Append(String),
    Prepend(String),
    Index(String, usize),
}

impl PathSegment {
    fn parse(token: &str) -> Self {
        // Checked first so that a bare `[]` reads as a prepend.
        if let Some(key) = token.strip_prefix("[]") {
            return Self::Prepend(key.to_string());
        }
        if let Some(key) = token.strip_suffix("[]") {
            return Self::Append(key.to_string());
        }
        if let Some(open) = token.rfind('[') {
            if let Some(inner) = token[open + 1..].strip_suffix(']') {
                if let Ok(index) = inner.parse::<usize>() {
                    if index <= MAX_INDEX {
                        return Self::Index(token[..open].to_string(), index);
                    }
                }
            }
        }
        Self::Key(token.to_string())
    }

    /// Key this segment addresses in its parent object.
    pub fn key(&self) -> &str {
        match self {
            Self::Key(k) | Self::Append(k) | Self::Prepend(k) | Self::Index(k, _) => k,
        }
    }

    /// Re-target an empty-keyed array step at `key`.
    fn with_key(self, key: String) -> Self {
        match self {
            Self::Key(_) => Self::Key(key),
            Self::Append(_) => Self::Append(key),
            Self::Prepend(_) => Self::Prepend(key),
            Self::Index(_, i) => Self::Index(key, i),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Append(k) => write!(f, "{k}[]"),
            Self::Prepend(k) => write!(f, "[]{k}"),
            Self::Index(k, i) => write!(f, "{k}[{i}]"),
        }
    }
}

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<PathSegment> = Vec::new();
        for token in path.split('.') {
            let segment = PathSegment::parse(token);
            let merges_into_previous = segment.key().is_empty()
                && !matches!(segment, PathSegment::Key(_))
                && matches!(segments.last(), Some(PathSegment::Key(_)));
            if merges_into_previous {
                if let Some(PathSegment::Key(key)) = segments.pop() {
                    segments.push(segment.with_key(key));
                    continue;
                }
            }
            segments.push(segment);
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Write `value` at this path inside `target`, creating containers on the way.
    ///
    /// A non-object `target` (or intermediate value) is replaced by an empty object.
    pub fn apply<'a>(&self, target: &'a mut Value, value: Value) -> &'a mut Value {
        let Some((last, parents)) = self.segments.split_last() else {
            return target;
        };

        let mut cursor: &mut Value = &mut *target;
        for segment in parents {
            cursor = descend(cursor, segment);
        }
        write(cursor, last, value);
        target
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Parse `path` and write `value` into `target`. Returns `target` for chaining.
pub fn set<'a>(target: &'a mut Value, path: &str, value: Value) -> &'a mut Value {
    Path::parse(path).apply(target, value)
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    let Value::Object(map) = value else {
        unreachable!("value was just replaced with an object")
    };
    map
}

fn array_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let slot = map.entry(key.to_string()).or_insert(Value::Null);
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    let Value::Array(items) = slot else {
        unreachable!("slot was just replaced with an array")
    };
    items
}

fn padded_slot(items: &mut Vec<Value>, index: usize) -> &mut Value {
    if items.len() <= index {
        items.resize(index + 1, Value::Null);
    }
    &mut items[index]
}

/// Move into the container addressed by a non-final segment.
fn descend<'a>(cursor: &'a mut Value, segment: &PathSegment) -> &'a mut Value {
    let map = object_mut(cursor);
    match segment {
        PathSegment::Key(key) => {
            let slot = map.entry(key.clone()).or_insert(Value::Null);
            object_mut(slot);
            slot
        }
        PathSegment::Append(key) => {
            let items = array_mut(map, key);
            items.push(Value::Object(Map::new()));
            let last = items.len() - 1;
            &mut items[last]
        }
        PathSegment::Prepend(key) => {
            let items = array_mut(map, key);
            items.insert(0, Value::Object(Map::new()));
            &mut items[0]
        }
        PathSegment::Index(key, index) => {
            let slot = padded_slot(array_mut(map, key), *index);
            object_mut(slot);
            slot
        }
    }
}

/// Perform the terminal write.
fn write(cursor: &mut Value, segment: &PathSegment, value: Value) {
    let map = object_mut(cursor);
    match segment {
        PathSegment::Key(key) => {
            map.insert(key.clone(), value);
        }
        PathSegment::Append(key) => array_mut(map, key).push(value),
        PathSegment::Prepend(key) => array_mut(map, key).insert(0, value),
        PathSegment::Index(key, index) => {
            *padded_slot(array_mut(map, key), *index) = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_segments() {
        let path = Path::parse("a.b[].[]c.d[3]");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".into()),
                PathSegment::Append("b".into()),
                PathSegment::Prepend("c".into()),
                PathSegment::Index("d".into(), 3),
            ]
        );
        assert_eq!(path.to_string(), "a.b[].[]c.d[3]");
    }

    #[test]
    fn test_bare_array_token_targets_previous_key() {
        let path: Path = "list.[]".parse().unwrap();
        assert_eq!(path.segments(), &[PathSegment::Prepend("list".into())]);

        let path = Path::parse("items.[1]");
        assert_eq!(path.segments(), &[PathSegment::Index("items".into(), 1)]);
    }

    #[test]
    fn test_nested_objects() {
        let mut target = json!({});
        set(&mut target, "emailAndPassword.enabled", json!(true));
        set(&mut target, "emailAndPassword.minPasswordLength", json!(12));
        assert_eq!(
            target,
            json!({ "emailAndPassword": { "enabled": true, "minPasswordLength": 12 } })
        );
    }

    #[test]
    fn test_indexed_write_fills_gaps() {
        let mut target = json!({});
        set(&mut target, "x.y[2]", json!(42));
        let arr = target["x"]["y"].as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert!(arr[0].is_null());
        assert!(arr[1].is_null());
        assert_eq!(arr[2], json!(42));
    }

    #[test]
    fn test_oversized_index_is_a_plain_key() {
        let path = Path::parse("a[18446744073709551615]");
        assert_eq!(
            path.segments(),
            &[PathSegment::Key("a[18446744073709551615]".into())]
        );

        let mut target = json!({});
        set(&mut target, "a[18446744073709551615]", json!(1));
        set(&mut target, "b[65536].c", json!(2));
        assert_eq!(
            target,
            json!({ "a[18446744073709551615]": 1, "b[65536]": { "c": 2 } })
        );

        let path = Path::parse(&format!("a[{MAX_INDEX}]"));
        assert_eq!(path.segments(), &[PathSegment::Index("a".into(), MAX_INDEX)]);
    }

    #[test]
    fn test_indexed_write_keeps_existing_slots() {
        let mut target = json!({ "y": [1, 2, 3, 4] });
        set(&mut target, "y[1]", json!("two"));
        assert_eq!(target, json!({ "y": [1, "two", 3, 4] }));
    }

    #[test]
    fn test_append() {
        let mut target = json!({});
        set(&mut target, "list[]", json!("a"));
        set(&mut target, "list[]", json!("b"));
        assert_eq!(target["list"], json!(["a", "b"]));
    }

    #[test]
    fn test_prepend() {
        let mut target = json!({});
        set(&mut target, "list.[]", json!("a"));
        set(&mut target, "list.[]", json!("b"));
        assert_eq!(target["list"], json!(["b", "a"]));

        let mut target = json!({ "foo": { "bar": ["z"] } });
        set(&mut target, "foo.[]bar", json!("y"));
        assert_eq!(target["foo"]["bar"], json!(["y", "z"]));
    }

    #[test]
    fn test_non_final_append_creates_container() {
        let mut target = json!({});
        set(&mut target, "plugins[].id", json!("admin"));
        set(&mut target, "plugins[].id", json!("organization"));
        set(&mut target, "[]plugins.id", json!("first"));
        assert_eq!(
            target["plugins"],
            json!([{ "id": "first" }, { "id": "admin" }, { "id": "organization" }])
        );
    }

    #[test]
    fn test_non_final_index_reuses_object() {
        let mut target = json!({});
        set(&mut target, "rows[1].name", json!("b"));
        set(&mut target, "rows[1].age", json!(3));
        assert_eq!(target["rows"], json!([null, { "name": "b", "age": 3 }]));
    }

    #[test]
    fn test_returns_same_target_for_chaining() {
        let mut target = json!({});
        set(&mut target, "a", json!(1))["b"] = json!(2);
        assert_eq!(target, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_scalar_intermediate_is_replaced() {
        let mut target = json!({ "a": 5 });
        set(&mut target, "a.b", json!(true));
        assert_eq!(target, json!({ "a": { "b": true } }));
    }
}
