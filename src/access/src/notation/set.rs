//! Decisions and union over lists of attribute globs

use super::glob::{AttributeGlob, NotationError, WILDCARD};
use std::cmp::Ordering;

/// Parse every glob of a list
pub fn parse_all<S: AsRef<str>>(globs: &[S]) -> Result<Vec<AttributeGlob>, NotationError> {
    globs.iter().map(|g| AttributeGlob::parse(g.as_ref())).collect()
}

/// The glob that decides `path`: the covering glob with the highest precedence
pub fn governing<'a, S: AsRef<str>>(
    globs: &'a [AttributeGlob],
    path: &[S],
) -> Option<&'a AttributeGlob> {
    globs
        .iter()
        .filter(|g| g.covers(path))
        .max_by(|a, b| a.precedence(b))
}

/// Whether `path` is allowed by `globs`. Paths no glob covers are denied.
pub fn is_allowed<S: AsRef<str>>(globs: &[AttributeGlob], path: &[S]) -> bool {
    governing(globs, path).is_some_and(|g| !g.is_negated())
}

/// Union of two glob lists: a path is allowed by the result iff it is
/// allowed by `a` or by `b`.
///
/// Every glob of either side, and every intersection of two globs, names a
/// region of paths on which both sides decide uniformly. Each region gets the
/// polarity of `a || b` at its most general path, then redundant globs are
/// pruned, so `["*", "!secret"] ∪ ["secret"]` is `["*"]`.
pub fn union(a: &[AttributeGlob], b: &[AttributeGlob]) -> Vec<AttributeGlob> {
    let mut regions: Vec<Vec<String>> = Vec::with_capacity(a.len() + b.len());
    for glob in a.iter().chain(b) {
        if !regions.iter().any(|r| r.as_slice() == glob.segments()) {
            regions.push(glob.segments().to_vec());
        }
    }

    // Close under intersection; new regions are paired with all earlier ones
    let mut idx = 0;
    while idx < regions.len() {
        for other in 0..idx {
            if let Some(region) = meet(&regions[idx], &regions[other]) {
                if !regions.contains(&region) {
                    regions.push(region);
                }
            }
        }
        idx += 1;
    }

    let merged = regions
        .into_iter()
        .map(|segments| {
            let path = witness(&segments);
            let allowed = is_allowed(a, &path) || is_allowed(b, &path);
            AttributeGlob::from_segments(segments, !allowed)
        })
        .collect();

    prune(merged)
}

/// Segment standing for a field no glob names. Parsed globs never hold
/// control characters, so it cannot collide with a real segment.
const UNNAMED: &str = "\u{0}";

/// Intersection of two glob regions, if they overlap
fn meet(a: &[String], b: &[String]) -> Option<Vec<String>> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut segments = long.to_vec();
    for (segment, other) in segments.iter_mut().zip(short) {
        if segment.as_str() == other.as_str() || other.as_str() == WILDCARD {
            continue;
        }
        if segment.as_str() == WILDCARD {
            *segment = other.clone();
        } else {
            return None;
        }
    }
    Some(segments)
}

/// Most general concrete path inside a glob region
fn witness(segments: &[String]) -> Vec<&str> {
    segments
        .iter()
        .map(|s| if s == WILDCARD { UNNAMED } else { s.as_str() })
        .collect()
}

/// Drop globs whose removal does not change any decision
fn prune(mut globs: Vec<AttributeGlob>) -> Vec<AttributeGlob> {
    let mut idx = 0;
    while idx < globs.len() {
        let glob = globs.remove(idx);
        if changes_decisions(&glob, &globs) {
            globs.insert(idx, glob);
            idx += 1;
        }
    }
    globs
}

/// Whether adding `glob` to `rest` flips the decision of some path.
///
/// A flip, if any, shows at the most general path of `glob` itself or of its
/// intersection with the glob that would otherwise govern, so those are the
/// only paths checked.
fn changes_decisions(glob: &AttributeGlob, rest: &[AttributeGlob]) -> bool {
    std::iter::once(glob.segments().to_vec())
        .chain(rest.iter().filter_map(|other| meet(glob.segments(), other.segments())))
        .any(|region| {
            let path = witness(&region);
            let without = governing(rest, &path);
            let with = match without {
                Some(current) if current.precedence(glob) != Ordering::Less => !current.is_negated(),
                _ => !glob.is_negated(),
            };
            with != without.is_some_and(|g| !g.is_negated())
        })
}

/// Union of two raw attribute lists
pub fn union_strs<S: AsRef<str>>(a: &[S], b: &[S]) -> Result<Vec<String>, NotationError> {
    let a = parse_all(a)?;
    let b = parse_all(b)?;
    Ok(union(&a, &b)
        .into_iter()
        .map(|g| g.as_str().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globs(list: &[&str]) -> Vec<AttributeGlob> {
        parse_all(list).unwrap()
    }

    fn strs(list: Vec<AttributeGlob>) -> Vec<String> {
        list.into_iter().map(|g| g.as_str().to_string()).collect()
    }

    #[test]
    fn test_decisions() {
        let list = globs(&["*", "!password", "password.hint"]);
        assert!(is_allowed(&list, &["name"]));
        assert!(!is_allowed(&list, &["password"]));
        assert!(!is_allowed(&list, &["password", "hash"]));
        assert!(is_allowed(&list, &["password", "hint"]));
        assert!(!is_allowed::<&str>(&list, &[]));
    }

    #[test]
    fn test_union_restores_negated_field() {
        let result = union(&globs(&["*", "!secret"]), &globs(&["secret"]));
        assert_eq!(strs(result), vec!["*"]);
    }

    #[test]
    fn test_union_keeps_common_negations() {
        let result = union(&globs(&["*", "!secret"]), &globs(&["name"]));
        assert_eq!(strs(result), vec!["*", "!secret"]);
    }

    #[test]
    fn test_union_with_empty() {
        let result = union(&globs(&[]), &globs(&["*", "!id"]));
        assert_eq!(strs(result), vec!["*", "!id"]);

        assert!(union(&globs(&[]), &globs(&[])).is_empty());
    }

    #[test]
    fn test_union_of_disjoint_fields() {
        let result = union(&globs(&["title"]), &globs(&["title", "views"]));
        assert_eq!(strs(result), vec!["title", "views"]);
    }

    #[test]
    fn test_union_nested_negations() {
        let a = globs(&["*", "!account"]);
        let b = globs(&["account", "!account.password"]);
        let result = union(&a, &b);

        assert!(is_allowed(&result, &["name"]));
        assert!(is_allowed(&result, &["account", "id"]));
        assert!(!is_allowed(&result, &["account", "password"]));
    }

    #[test]
    fn test_union_is_commutative_on_decisions() {
        let a = globs(&["account.*", "!account.balance", "name"]);
        let b = globs(&["*", "!name", "!account"]);
        let ab = union(&a, &b);
        let ba = union(&b, &a);

        for path in [
            vec!["name"],
            vec!["age"],
            vec!["account", "id"],
            vec!["account", "balance"],
        ] {
            assert_eq!(is_allowed(&ab, &path), is_allowed(&ba, &path), "{:?}", path);
            assert_eq!(
                is_allowed(&ab, &path),
                is_allowed(&a, &path) || is_allowed(&b, &path),
                "{:?}",
                path
            );
        }
    }

    #[test]
    fn test_union_keeps_wildcard_exceptions() {
        // "*.b" outranks "!meta" on meta.b and must survive pruning
        let a = globs(&["*", "!meta", "*.b"]);
        let result = union(&a, &[]);
        assert!(is_allowed(&result, &["meta", "b"]));
        assert!(!is_allowed(&result, &["meta", "c"]));
        assert!(is_allowed(&result, &["name"]));
    }

    #[test]
    fn test_union_patches_wildcard_negation() {
        let a = globs(&["*", "!*.x"]);
        let b = globs(&["meta"]);
        let result = union(&a, &b);

        assert!(is_allowed(&result, &["meta", "x"]));
        assert!(!is_allowed(&result, &["other", "x"]));
        assert!(is_allowed(&result, &["other", "y"]));
        assert!(strs(result).contains(&"meta.x".to_string()));
    }

    #[test]
    fn test_meet() {
        let seg = |s: &str| s.split('.').map(str::to_string).collect::<Vec<_>>();
        assert_eq!(meet(&seg("*.x"), &seg("meta")), Some(seg("meta.x")));
        assert_eq!(meet(&seg("a.*"), &seg("*.b.c")), Some(seg("a.b.c")));
        assert_eq!(meet(&seg("a"), &seg("b")), None);
    }

    #[test]
    fn test_union_strs_rejects_invalid_globs() {
        assert!(union_strs(&["*"], &["a..b"]).is_err());
        assert!(union_strs(&["*", "!meta"], &["meta.\u{0}"]).is_err());
    }
}
