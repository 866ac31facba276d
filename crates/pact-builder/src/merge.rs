//! Merging of path-indexed declaration maps from sibling sub-trees.

use crate::path::Path;
use crate::rules::PathMap;

/// Union of two maps whose paths must be disjoint.
///
/// Siblings that address distinct positions never share a path, so a shared
/// key means the path builder produced a collision. The offending path is
/// returned instead of picking a winner.
pub fn merge<T>(mut into: PathMap<T>, other: PathMap<T>) -> Result<PathMap<T>, Path> {
    for (path, declaration) in other {
        if into.contains_key(&path) {
            return Err(path);
        }
        into.insert(path, declaration);
    }
    Ok(into)
}

/// Union of two maps whose siblings share one path by construction.
///
/// Elements of a repeated collection (and values of one query parameter) are
/// addressed by the same path; the later sibling's declaration is kept.
pub fn overlay<T>(mut into: PathMap<T>, other: PathMap<T>) -> PathMap<T> {
    into.extend(other);
    into
}
