//! # Glob algebra
//!
//! Set operations over attribute glob lists. A list such as
//! `["*", "!id", "!pwd"]` stands for the set of paths it selects when its
//! globs are applied in [application order](crate::Glob::application_order).
//!
//! Lists produced here are compacted: globs that cannot change the selected
//! set are dropped and the rest are returned in application order.

use crate::glob::{sort_globs, Glob};

/// Compact a glob list and return it in application order.
///
/// Duplicates, positives already selected by an earlier or later positive,
/// negations with nothing to remove, and negations shadowed by a broader
/// negation are dropped.
///
/// # Example
///
/// ```
/// use accessgate_notation::normalize;
///
/// assert_eq!(normalize(&["title", "*", "!pwd"]), vec!["*", "!pwd"]);
/// assert_eq!(normalize(&["name", "!location"]), vec!["name"]);
/// ```
pub fn normalize<S: AsRef<str>>(globs: &[S]) -> Vec<String> {
    render(compact(parse_all(globs)))
}

/// Union of two glob lists.
///
/// An empty operand yields the other operand unchanged, and equal operands
/// yield the operand unchanged. Otherwise positives from both sides are
/// merged and an exclusion survives only where the other side does not
/// select the excluded paths. Paths the other side selects through a
/// glob that only partly overlaps a surviving exclusion are granted back.
///
/// # Arguments
///
/// * `a` - First glob list
/// * `b` - Second glob list
///
/// # Returns
///
/// The compacted union, in application order.
///
/// # Example
///
/// ```
/// use accessgate_notation::union;
///
/// // `b` grants `id`, so only the exclusion both sides share survives
/// let merged = union(&["*", "!pwd", "title"], &["*", "!id", "!pwd"]);
/// assert_eq!(merged, vec!["*", "!pwd"]);
///
/// assert_eq!(union(&["*"], &["*", "!id"]), vec!["*"]);
///
/// // `a.b` is granted back on the left, so the right's exclusion goes
/// assert_eq!(union(&["*", "!a", "a.b"], &["*", "!a.b"]), vec!["*"]);
/// ```
pub fn union<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> Vec<String> {
    if a.is_empty() {
        return to_strings(b);
    }
    if b.is_empty() || same_list(a, b) {
        return to_strings(a);
    }

    let mut left = parse_all(a);
    let mut right = parse_all(b);
    sort_globs(&mut left);
    sort_globs(&mut right);

    let mut merged: Vec<Glob> = Vec::with_capacity(left.len() + right.len());
    merged.extend(left.iter().filter(|g| !g.is_negated()).cloned());
    merged.extend(right.iter().filter(|g| !g.is_negated()).cloned());

    for (negations, other) in [(&left, &right), (&right, &left)] {
        for negation in negations.iter().filter(|g| g.is_negated()) {
            if selects(other, negation) {
                continue;
            }
            merged.push(negation.clone());

            // Positives nested in the exclusion already apply after it
            let partial = other.iter().filter(|g| {
                !g.is_negated()
                    && g.intersects(negation)
                    && !g.covers(negation)
                    && !negation.covers(g)
            });
            for positive in partial {
                if let Some(shared) = positive.intersection(negation) {
                    if selects(other, &shared) {
                        merged.push(shared);
                    }
                }
            }
        }
    }

    render(compact(merged))
}

/// Left-to-right union over any number of glob lists.
///
/// # Example
///
/// ```
/// use accessgate_notation::union_all;
///
/// let lists = vec![
///     vec!["image".to_string(), "name".to_string()],
///     vec!["name".to_string(), "!location".to_string()],
///     vec!["*".to_string(), "!location".to_string()],
/// ];
/// assert_eq!(union_all(&lists), vec!["*", "!location"]);
/// ```
pub fn union_all<L, S>(lists: &[L]) -> Vec<String>
where
    L: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut iter = lists.iter();
    let mut acc = match iter.next() {
        Some(first) => to_strings(first.as_ref()),
        None => return Vec::new(),
    };
    for list in iter {
        acc = union(&acc, list.as_ref());
    }
    acc
}

/// Paths selected by `a` but not by the positive globs of `b`.
///
/// Negations in `b` are not granted back, so the result never selects a
/// path that `b` selects through a positive glob. Exact for literal globs;
/// with wildcards on both sides the result may be narrower than the true
/// difference.
///
/// # Example
///
/// ```
/// use accessgate_notation::difference;
///
/// assert_eq!(difference(&["*"], &["pwd", "token"]), vec!["*", "!pwd", "!token"]);
/// assert_eq!(difference(&["name", "age"], &["age"]), vec!["name"]);
/// ```
pub fn difference<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> Vec<String> {
    let removed: Vec<Glob> = parse_all(b)
        .into_iter()
        .filter(|g| !g.is_negated())
        .collect();

    let mut result: Vec<Glob> = parse_all(a)
        .into_iter()
        .filter(|g| g.is_negated() || !removed.iter().any(|r| r.covers(g)))
        .collect();

    for glob in &removed {
        let touches = result
            .iter()
            .any(|g| !g.is_negated() && g.intersects(glob));
        if touches {
            result.push(glob.with_negation(true));
        }
    }

    render(compact(result))
}

/// Check if an application-ordered list selects the paths of `target`.
/// The last glob covering `target` decides; globs nested strictly inside
/// `target` are left to the caller.
fn selects(ordered: &[Glob], target: &Glob) -> bool {
    ordered
        .iter()
        .rev()
        .find(|g| g.covers(target))
        .is_some_and(|g| !g.is_negated())
}

/// Sort into application order and drop globs that cannot change the
/// selected set, one at a time until nothing else can be dropped.
fn compact(mut globs: Vec<Glob>) -> Vec<Glob> {
    let mut seen: Vec<Glob> = Vec::with_capacity(globs.len());
    globs.retain(|g| {
        if seen.contains(g) {
            false
        } else {
            seen.push(g.clone());
            true
        }
    });
    sort_globs(&mut globs);

    while let Some(idx) = (0..globs.len()).find(|&i| is_redundant(&globs, i)) {
        globs.remove(idx);
    }
    globs
}

fn is_redundant(globs: &[Glob], idx: usize) -> bool {
    let glob = &globs[idx];
    let (before, rest) = globs.split_at(idx);
    let after = &rest[1..];

    if glob.is_negated() {
        // Nothing selected yet that this exclusion could remove
        let removes_something = before
            .iter()
            .any(|g| !g.is_negated() && g.intersects(glob));
        if !removes_something {
            return true;
        }

        // Everything removed here is granted back later
        if after.iter().any(|g| !g.is_negated() && g.covers(glob)) {
            return true;
        }

        // A broader exclusion already removed it and nothing re-added it
        before.iter().enumerate().any(|(pos, broader)| {
            broader.is_negated()
                && broader.covers(glob)
                && !before[pos + 1..]
                    .iter()
                    .any(|g| !g.is_negated() && g.intersects(glob))
        })
    } else {
        // A later positive copies the same paths again
        if after.iter().any(|g| !g.is_negated() && g.covers(glob)) {
            return true;
        }

        // A later exclusion removes everything this adds
        if after.iter().any(|g| g.is_negated() && g.covers(glob)) {
            return true;
        }

        // An earlier positive already selected it and nothing in between
        // removed any part of it
        before.iter().enumerate().any(|(pos, broader)| {
            !broader.is_negated()
                && broader.covers(glob)
                && !before[pos + 1..]
                    .iter()
                    .any(|g| g.is_negated() && g.intersects(glob))
        })
    }
}

fn parse_all<S: AsRef<str>>(globs: &[S]) -> Vec<Glob> {
    globs
        .iter()
        .map(|g| g.as_ref().trim())
        .filter(|g| !g.is_empty())
        .map(Glob::parse)
        .collect()
}

fn render(globs: Vec<Glob>) -> Vec<String> {
    globs.iter().map(|g| g.to_string()).collect()
}

fn to_strings<S: AsRef<str>>(globs: &[S]) -> Vec<String> {
    globs.iter().map(|g| g.as_ref().to_string()).collect()
}

fn same_list<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    #[test]
    fn test_union_with_empty_returns_other() {
        let globs = ["*", "!id", "!pwd"];
        let empty: [&str; 0] = [];
        assert_eq!(union(&globs, &empty), vec!["*", "!id", "!pwd"]);
        assert_eq!(union(&empty, &globs), vec!["*", "!id", "!pwd"]);
    }

    #[test]
    fn test_union_is_idempotent_on_raw_lists() {
        let globs = ["title", "*", "!pwd"];
        assert_eq!(union(&globs, &globs), vec!["title", "*", "!pwd"]);
    }

    #[test]
    fn test_union_drops_exclusion_granted_by_other_side() {
        assert_eq!(union(&["*"], &["*", "!id", "!pwd"]), vec!["*"]);
        assert_eq!(union(&["*", "!a"], &["a"]), vec!["*"]);
    }

    #[test]
    fn test_union_keeps_shared_exclusions() {
        assert_eq!(
            union(&["*", "!pwd", "title"], &["*", "!id", "!pwd"]),
            vec!["*", "!pwd"]
        );
    }

    #[test]
    fn test_union_narrows_partial_exclusions() {
        // Everything except `x` on one side, everything except `x.secret`
        // on the other: only `x.secret` stays hidden.
        assert_eq!(union(&["*", "!x"], &["*", "!x.secret"]), vec!["*", "!x.secret"]);
    }

    #[test]
    fn test_union_keeps_reinclusion_inside_exclusion() {
        assert_eq!(union(&["a.b"], &["*", "!a"]), vec!["*", "!a", "a.b"]);
    }

    #[test]
    fn test_union_respects_reinclusion_on_other_side() {
        // The left side grants `a.b` back after excluding `a`
        assert_eq!(union(&["*", "!a", "a.b"], &["*", "!a.b"]), vec!["*"]);
        assert_eq!(union(&["*", "!a.b"], &["*", "!a", "a.b"]), vec!["*"]);

        let data = json!({ "a": { "b": 1, "c": 2 }, "x": 3 });
        let merged = union(&["*", "!a", "a.b"], &["*", "!a.b"]);
        assert_eq!(filter(&data, &merged), data);
    }

    #[test]
    fn test_union_grants_back_partial_overlap() {
        // `a` on the right keeps `a.b` although the left hides every `*.b`
        let merged = union(&["*", "!*.b"], &["a"]);
        assert_eq!(merged, vec!["*", "!*.b", "a.b"]);

        let data = json!({ "a": { "b": 1 }, "c": { "b": 2, "d": 3 } });
        assert_eq!(
            filter(&data, &merged),
            json!({ "a": { "b": 1 }, "c": { "d": 3 } })
        );
    }

    #[test]
    fn test_union_drops_dangling_exclusions() {
        assert_eq!(union(&["image", "name"], &["name", "!location"]), vec!["image", "name"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&["*", "*"]), vec!["*"]);
        assert_eq!(normalize(&["!a", "!a.b", "*"]), vec!["*", "!a"]);
        assert_eq!(normalize(&["*", "!a", "a.b", "!a.b.c"]), vec!["*", "!a", "a.b", "!a.b.c"]);
        assert_eq!(normalize(&["age", "!age"]), Vec::<String>::new());
        assert!(normalize::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_union_all() {
        let lists: Vec<Vec<&str>> = vec![vec!["name"], vec!["age"], vec!["*", "!pwd"]];
        assert_eq!(union_all(&lists), vec!["*", "!pwd"]);

        let none: Vec<Vec<&str>> = Vec::new();
        assert!(union_all(&none).is_empty());
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&["*", "!id"], &["pwd"]), vec!["*", "!id", "!pwd"]);
        assert_eq!(difference(&["name"], &["*"]), Vec::<String>::new());
        assert_eq!(difference(&["name"], &["pwd"]), vec!["name"]);
    }

    fn glob_strategy() -> impl Strategy<Value = String> {
        let segment = prop_oneof![
            Just("*".to_string()),
            Just("a".to_string()),
            Just("b".to_string()),
            Just("c".to_string()),
        ];
        (any::<bool>(), prop::collection::vec(segment, 1..3)).prop_map(|(negated, segments)| {
            let path = segments.join(".");
            if negated {
                format!("!{}", path)
            } else {
                path
            }
        })
    }

    fn data_strategy() -> impl Strategy<Value = Value> {
        let leaf = any::<u8>().prop_map(Value::from);
        leaf.prop_recursive(3, 24, 3, |inner| {
            prop::collection::btree_map("[a-c]", inner, 1..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect()))
        })
    }

    /// Scalar leaves of `value` keyed by JSON pointer.
    fn leaves(value: &Value, pointer: String, out: &mut Vec<(String, Value)>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    leaves(child, format!("{}/{}", pointer, key), out);
                }
            }
            other => out.push((pointer, other.clone())),
        }
    }

    proptest! {
        #[test]
        fn test_union_keeps_every_selected_leaf(
            data in data_strategy(),
            a in prop::collection::vec(glob_strategy(), 0..5),
            b in prop::collection::vec(glob_strategy(), 0..5),
        ) {
            let merged = filter(&data, &union(&a, &b));

            let mut expected = Vec::new();
            leaves(&filter(&data, &a), String::new(), &mut expected);
            leaves(&filter(&data, &b), String::new(), &mut expected);

            for (pointer, value) in expected {
                prop_assert_eq!(
                    merged.pointer(&pointer),
                    Some(&value),
                    "{} missing from union of {:?} and {:?}",
                    pointer,
                    a,
                    b
                );
            }
        }

        #[test]
        fn test_union_idempotent(globs in prop::collection::vec(glob_strategy(), 0..5)) {
            prop_assert_eq!(union(&globs, &globs), globs.clone());
        }

        #[test]
        fn test_union_identity(globs in prop::collection::vec(glob_strategy(), 0..5)) {
            let empty: Vec<String> = Vec::new();
            prop_assert_eq!(union(&globs, &empty), globs.clone());
            prop_assert_eq!(union(&empty, &globs), globs);
        }

        #[test]
        fn test_normalize_is_stable(globs in prop::collection::vec(glob_strategy(), 0..5)) {
            let once = normalize(&globs);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
