//! Category breadcrumb paths.
//!
//! Paths are built by walking `parent_id` pointers upward from a leaf and
//! joining names with [`PATH_SEPARATOR`]. Every fully resolved node is cached
//! on the request context, so repeated leaves (and leaves sharing ancestors)
//! cost a map lookup after the first walk.

use std::collections::HashSet;

use crate::context::RequestContext;
use crate::error::MissingReference;
use crate::projector::FeedItem;

pub const PATH_SEPARATOR: &str = " > ";

/// Where an upward walk stopped.
enum WalkEnd {
    /// Reached a root node.
    Root,
    /// Reached a node whose path is already cached.
    Cached(String),
    /// Hit a node id that does not exist.
    Missing(String),
    /// Hit a node already visited on this walk.
    Cycle(String),
}

/// Resolves the breadcrumb path of `leaf_id`, e.g. `"A > B > C"`.
///
/// A missing leaf yields an empty path. A missing ancestor yields the path
/// from the highest node that could be resolved. A cycle truncates the path
/// at the first repeated node. Each of these is recorded on `ctx` and never
/// fails the request.
pub fn resolve_path(leaf_id: &str, ctx: &mut RequestContext) -> String {
    if let Some(path) = ctx.paths.get(leaf_id) {
        return path.clone();
    }
    ctx.traversals += 1;

    let mut chain: Vec<(String, String)> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = leaf_id.to_owned();

    let end = loop {
        if !chain.is_empty() && !ctx.cyclic.contains(&current) {
            if let Some(path) = ctx.paths.get(&current) {
                break WalkEnd::Cached(path.clone());
            }
        }
        if !visited.insert(current.clone()) {
            break WalkEnd::Cycle(current);
        }
        let Some(node) = ctx.category(&current) else {
            break WalkEnd::Missing(current);
        };
        chain.push((node.id.clone(), node.name.clone()));
        match node.parent() {
            Some(parent) => current = parent.to_owned(),
            None => break WalkEnd::Root,
        }
    };

    let mut prefix = String::new();
    let mut cache_ancestors = true;
    match end {
        WalkEnd::Root => {}
        WalkEnd::Cached(path) => prefix = path,
        WalkEnd::Missing(missing_id) if chain.is_empty() => {
            ctx.record_missing(MissingReference::CategoryLeaf {
                category_id: missing_id,
            });
        }
        WalkEnd::Missing(missing_id) => {
            ctx.record_missing(MissingReference::CategoryAncestor {
                category_id: leaf_id.to_owned(),
                missing_id,
            });
        }
        WalkEnd::Cycle(repeated_id) => {
            // Paths inside a cycle depend on the entry point: only the leaf is
            // cached, and never reused as another walk's prefix.
            cache_ancestors = false;
            ctx.cyclic.insert(leaf_id.to_owned());
            ctx.record_missing(MissingReference::CategoryCycle {
                category_id: leaf_id.to_owned(),
                repeated_id,
            });
        }
    }

    let mut path = prefix;
    for (id, name) in chain.iter().rev() {
        if path.is_empty() {
            path.clone_from(name);
        } else {
            path = format!("{path}{PATH_SEPARATOR}{name}");
        }
        if cache_ancestors || id == leaf_id {
            ctx.paths.insert(id.clone(), path.clone());
        }
    }
    if chain.is_empty() {
        ctx.paths.insert(leaf_id.to_owned(), path.clone());
    }

    path
}

/// Resolves every id, skipping ids that resolve to an empty path.
pub fn resolve_paths<'a>(
    ids: impl IntoIterator<Item = &'a String>,
    ctx: &mut RequestContext,
) -> Vec<String> {
    ids.into_iter()
        .map(|id| resolve_path(id, ctx))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Fills `categories` on every row and nested variant from `category_ids`.
pub fn annotate_categories(rows: &mut [FeedItem], ctx: &mut RequestContext) {
    for row in rows {
        row.categories = resolve_paths(&row.category_ids, ctx);
        annotate_categories(&mut row.variants, ctx);
    }
}

#[cfg(test)]
mod tests {
    use catfeed_core::{CategoryNode, ItemKind};

    use super::*;

    fn node(id: &str, name: &str, parent: Option<&str>) -> CategoryNode {
        CategoryNode {
            id: id.into(),
            name: name.into(),
            parent_id: parent.map(Into::into),
        }
    }

    fn abc() -> RequestContext {
        RequestContext::with_categories([
            node("a", "A", None),
            node("b", "B", Some("a")),
            node("c", "C", Some("b")),
        ])
    }

    #[test]
    fn resolves_full_ancestor_path() {
        let mut ctx = abc();
        assert_eq!(resolve_path("c", &mut ctx), "A > B > C");
    }

    #[test]
    fn second_lookup_is_a_cache_hit() {
        let mut ctx = abc();
        let first = resolve_path("c", &mut ctx);
        let second = resolve_path("c", &mut ctx);
        assert_eq!(first, second);
        assert_eq!(ctx.traversals(), 1);
    }

    #[test]
    fn ancestors_are_cached_along_the_way() {
        let mut ctx = abc();
        resolve_path("c", &mut ctx);
        assert_eq!(resolve_path("b", &mut ctx), "A > B");
        assert_eq!(resolve_path("a", &mut ctx), "A");
        assert_eq!(ctx.traversals(), 1);
    }

    #[test]
    fn walk_stops_at_cached_ancestor() {
        let mut ctx = abc();
        ctx.load_categories([node("d", "D", Some("b"))]);
        resolve_path("c", &mut ctx);
        assert_eq!(resolve_path("d", &mut ctx), "A > B > D");
        assert_eq!(ctx.traversals(), 2);
    }

    #[test]
    fn missing_leaf_is_empty_and_recorded() {
        let mut ctx = abc();
        assert_eq!(resolve_path("zz", &mut ctx), "");
        assert_eq!(
            ctx.missing_references(),
            &[MissingReference::CategoryLeaf {
                category_id: "zz".into()
            }]
        );
        // Cached, so the miss is recorded once.
        assert_eq!(resolve_path("zz", &mut ctx), "");
        assert_eq!(ctx.missing_references().len(), 1);
    }

    #[test]
    fn missing_ancestor_starts_at_highest_resolvable_node() {
        let mut ctx = RequestContext::with_categories([
            node("b", "B", Some("gone")),
            node("c", "C", Some("b")),
        ]);
        assert_eq!(resolve_path("c", &mut ctx), "B > C");
        assert!(matches!(
            ctx.missing_references(),
            [MissingReference::CategoryAncestor { missing_id, .. }] if missing_id == "gone"
        ));
    }

    #[test]
    fn cycle_is_truncated_and_recorded() {
        let mut ctx = RequestContext::with_categories([
            node("x", "X", Some("y")),
            node("y", "Y", Some("x")),
        ]);
        assert_eq!(resolve_path("x", &mut ctx), "Y > X");
        assert!(matches!(
            ctx.missing_references(),
            [MissingReference::CategoryCycle { repeated_id, .. }] if repeated_id == "x"
        ));
        // The other entry point gets its own view of the cycle.
        assert_eq!(resolve_path("y", &mut ctx), "X > Y");
    }

    #[test]
    fn self_parent_is_a_root() {
        let mut ctx = RequestContext::with_categories([node("r", "Root", Some("r"))]);
        assert_eq!(resolve_path("r", &mut ctx), "Root");
        assert!(ctx.missing_references().is_empty());
    }

    #[test]
    fn annotate_fills_rows_and_variants() {
        let mut ctx = abc();
        let mut parent = FeedItem::new("p", ItemKind::Parent);
        parent.category_ids = vec!["c".into(), "zz".into()];
        let mut variant = FeedItem::new("v", ItemKind::Variant);
        variant.category_ids = vec!["b".into()];
        parent.variants.push(variant);

        let mut rows = vec![parent];
        annotate_categories(&mut rows, &mut ctx);

        assert_eq!(rows[0].categories, vec!["A > B > C".to_string()]);
        assert_eq!(rows[0].variants[0].categories, vec!["A > B".to_string()]);
    }
}
