//! State scoped to a single feed request.

use std::collections::{HashMap, HashSet};

use catfeed_core::CategoryNode;

use crate::error::MissingReference;

/// Caches and diagnostics for one pipeline run.
///
/// Created fresh for every request and dropped when the document is built, so
/// category data is never served stale across requests.
#[derive(Debug, Default)]
pub struct RequestContext {
    nodes: HashMap<String, CategoryNode>,
    pub(crate) paths: HashMap<String, String>,
    pub(crate) cyclic: HashSet<String>,
    pub(crate) traversals: usize,
    missing: Vec<MissingReference>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context pre-filled with category nodes.
    #[must_use]
    pub fn with_categories(nodes: impl IntoIterator<Item = CategoryNode>) -> Self {
        let mut ctx = Self::new();
        ctx.load_categories(nodes);
        ctx
    }

    /// Adds category nodes to the node cache. Later nodes replace earlier
    /// ones with the same id.
    pub fn load_categories(&mut self, nodes: impl IntoIterator<Item = CategoryNode>) {
        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&CategoryNode> {
        self.nodes.get(id)
    }

    /// Number of upward walks performed; cache hits do not count.
    #[must_use]
    pub fn traversals(&self) -> usize {
        self.traversals
    }

    /// Records a reference miss and logs it.
    pub fn record_missing(&mut self, reference: MissingReference) {
        tracing::warn!(reference = %reference, "missing reference");
        self.missing.push(reference);
    }

    #[must_use]
    pub fn missing_references(&self) -> &[MissingReference] {
        &self.missing
    }
}
