//! Version-chain rules for generated layouts.
//!
//! A chain is a rooted tree linked by `parent_layout_id`. Labels of the form
//! `v1.<n>` are display-only; `created_at` is the authoritative order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Label given to every root layout.
pub const ROOT_VERSION_LABEL: &str = "v1.0";

/// Maximum allowed length for a layout title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Upper bound on parent hops when walking to a root. Guards against cycles
/// introduced by bad data.
pub const MAX_CHAIN_DEPTH: usize = 1_000;

/// Anything that can sit in a version chain.
pub trait VersionNode {
    fn node_id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn created_at(&self) -> Timestamp;
}

/// Label for a new version given how many non-root versions the chain
/// already holds.
pub fn version_label(existing_versions: i64) -> String {
    format!("v1.{}", existing_versions + 1)
}

/// Validate and normalise a root layout title.
pub fn normalize_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Layout title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Layout title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Walk parent pointers from `start` to the root of its chain.
///
/// `parent_of` returns `None` when the node does not exist and
/// `Some(parent)` otherwise. The returned path starts at `start` and ends at
/// the root.
pub fn walk_to_root<F>(start: DbId, mut parent_of: F) -> Result<Vec<DbId>, CoreError>
where
    F: FnMut(DbId) -> Option<Option<DbId>>,
{
    let mut path = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;

    loop {
        let parent = parent_of(current).ok_or(CoreError::NotFound {
            entity: "GeneratedLayout",
            id: current,
        })?;

        let Some(parent) = parent else {
            return Ok(path);
        };

        if !seen.insert(parent) || path.len() >= MAX_CHAIN_DEPTH {
            return Err(CoreError::Internal(format!(
                "Version chain of layout {start} is cyclic or exceeds {MAX_CHAIN_DEPTH} nodes"
            )));
        }
        path.push(parent);
        current = parent;
    }
}

/// Collect every node reachable from `root` (root included), ordered by
/// `created_at` descending with ties broken by id descending.
///
/// Nodes in `nodes` that are not in the subtree are ignored, so callers may
/// pass a superset.
pub fn build_history<T: VersionNode>(root: DbId, nodes: Vec<T>) -> Vec<T> {
    let mut children: HashMap<DbId, Vec<DbId>> = HashMap::new();
    for node in &nodes {
        if let Some(parent) = node.parent_id() {
            children.entry(parent).or_default().push(node.node_id());
        }
    }

    let mut reachable = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().copied());
        }
    }

    let mut history: Vec<T> = nodes
        .into_iter()
        .filter(|n| reachable.contains(&n.node_id()))
        .collect();
    history.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.node_id().cmp(&a.node_id()))
    });
    history
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[derive(Debug, Clone)]
    struct Node {
        id: DbId,
        parent: Option<DbId>,
        at: Timestamp,
    }

    impl VersionNode for Node {
        fn node_id(&self) -> DbId {
            self.id
        }
        fn parent_id(&self) -> Option<DbId> {
            self.parent
        }
        fn created_at(&self) -> Timestamp {
            self.at
        }
    }

    fn node(id: DbId, parent: Option<DbId>, minutes: i64) -> Node {
        Node {
            id,
            parent,
            at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn labels_increment_from_root() {
        assert_eq!(version_label(0), "v1.1");
        assert_eq!(version_label(1), "v1.2");
        assert_eq!(version_label(9), "v1.10");
    }

    #[test]
    fn title_is_trimmed() {
        assert_eq!(normalize_title("  Landing v1 ").unwrap(), "Landing v1");
    }

    #[test]
    fn empty_title_rejected() {
        assert!(normalize_title("   ").is_err());
    }

    #[test]
    fn overlong_title_rejected() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(normalize_title(&title).is_err());
    }

    #[test]
    fn walk_reaches_root() {
        let parents = HashMap::from([(1, None), (2, Some(1)), (3, Some(2))]);
        let path = walk_to_root(3, |id| parents.get(&id).copied()).unwrap();
        assert_eq!(path, vec![3, 2, 1]);
    }

    #[test]
    fn walk_on_root_returns_itself() {
        let parents = HashMap::from([(1, None)]);
        assert_eq!(walk_to_root(1, |id| parents.get(&id).copied()).unwrap(), vec![1]);
    }

    #[test]
    fn walk_detects_cycles() {
        let parents = HashMap::from([(1, Some(2)), (2, Some(1))]);
        let err = walk_to_root(1, |id| parents.get(&id).copied()).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn walk_reports_missing_node() {
        let parents: HashMap<DbId, Option<DbId>> = HashMap::new();
        let err = walk_to_root(5, |id| parents.get(&id).copied()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { id: 5, .. }));
    }

    #[test]
    fn history_is_newest_first() {
        let nodes = vec![node(1, None, 0), node(2, Some(1), 1), node(3, Some(1), 2)];
        let ids: Vec<DbId> = build_history(1, nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn history_includes_nested_branches() {
        let nodes = vec![
            node(1, None, 0),
            node(2, Some(1), 1),
            node(3, Some(2), 2),
            node(4, Some(3), 3),
        ];
        let ids: Vec<DbId> = build_history(1, nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn history_excludes_other_chains() {
        let nodes = vec![node(1, None, 0), node(2, Some(1), 1), node(9, None, 2)];
        let ids: Vec<DbId> = build_history(1, nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn history_ties_break_by_id() {
        let at = Utc::now();
        let nodes = vec![
            Node { id: 1, parent: None, at },
            Node { id: 2, parent: Some(1), at },
        ];
        let ids: Vec<DbId> = build_history(1, nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
