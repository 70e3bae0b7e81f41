//! # Field filter
//!
//! Redacts JSON data down to the paths an attribute glob list selects.
//! The input is never modified; a filtered deep copy is returned.

use serde_json::{Map, Value};

use crate::glob::{segment_matches, sort_globs, Glob};

/// Filter an object, or each element of an array, by a glob list.
///
/// Globs are applied in application order (loose first, verbose last):
/// a leading `*` starts from a full copy, a positive glob copies matching
/// paths from the source, and a negated glob removes matching paths from
/// the result. `!account.*` empties `account` but keeps the key.
///
/// An empty glob list, or a non-object input, yields `{}`.
///
/// # Example
///
/// ```
/// use accessgate_notation::filter;
/// use serde_json::json;
///
/// let data = json!({ "name": "John", "age": 30, "account": { "id": 1, "country": "US" } });
/// let filtered = filter(&data, &["*", "!account.id", "!age"]);
///
/// assert_eq!(filtered, json!({ "name": "John", "account": { "country": "US" } }));
/// assert_eq!(data["account"]["id"], 1);
/// ```
pub fn filter<S: AsRef<str>>(data: &Value, globs: &[S]) -> Value {
    match data {
        Value::Array(items) => Value::Array(filter_all(items, globs)),
        other => filter_object(other, globs),
    }
}

/// Filter every element of a slice by the same glob list.
pub fn filter_all<S: AsRef<str>>(items: &[Value], globs: &[S]) -> Vec<Value> {
    items.iter().map(|item| filter_object(item, globs)).collect()
}

fn filter_object<S: AsRef<str>>(data: &Value, globs: &[S]) -> Value {
    let source = match data {
        Value::Object(map) => map,
        _ => return Value::Object(Map::new()),
    };

    let mut ordered: Vec<Glob> = Vec::with_capacity(globs.len());
    for glob in globs.iter().map(|g| g.as_ref().trim()).filter(|g| !g.is_empty()) {
        let glob = Glob::parse(glob);
        if !ordered.contains(&glob) {
            ordered.push(glob);
        }
    }
    sort_globs(&mut ordered);

    let mut globs = ordered.into_iter().peekable();
    let mut result = match globs.peek() {
        Some(first) if first.is_wildcard() => {
            globs.next();
            source.clone()
        }
        _ => Map::new(),
    };

    for glob in globs {
        let path: Vec<&str> = glob.segments().iter().map(String::as_str).collect();
        if glob.is_negated() {
            remove_matching(&mut result, &path);
        } else {
            copy_matching(source, &mut result, &path);
        }
    }

    Value::Object(result)
}

/// Copy every source path matching `path` into `target`, creating
/// intermediate objects only when something below them was copied.
fn copy_matching(source: &Map<String, Value>, target: &mut Map<String, Value>, path: &[&str]) -> bool {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return false,
    };

    let mut copied = false;
    for (key, value) in source {
        if !segment_matches(head, key) {
            continue;
        }

        if rest.is_empty() {
            target.insert(key.clone(), value.clone());
            copied = true;
            continue;
        }

        let child_source = match value {
            Value::Object(map) => map,
            _ => continue,
        };

        match target.get_mut(key) {
            Some(Value::Object(child_target)) => {
                copied |= copy_matching(child_source, child_target, rest);
            }
            Some(_) => {}
            None => {
                let mut child_target = Map::new();
                if copy_matching(child_source, &mut child_target, rest) {
                    target.insert(key.clone(), Value::Object(child_target));
                    copied = true;
                }
            }
        }
    }
    copied
}

fn remove_matching(target: &mut Map<String, Value>, path: &[&str]) {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        target.retain(|key, _| !segment_matches(head, key));
        return;
    }

    for (key, value) in target.iter_mut() {
        if let (true, Value::Object(child)) = (segment_matches(head, key), value) {
            remove_matching(child, rest);
        }
    }
}
