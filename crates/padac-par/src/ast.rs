//! The AST graph: two parallel arenas (node id → kind string, node id →
//! children) plus the side tables the later phases attach to. This is
//! deliberately *not* a recursive enum tree — spec.md's Data Model calls
//! for an integer-ID graph so that `padac-sem` and `padac-gen` can each
//! attach their own per-node side tables (`node_scope`, `node_label`,
//! `node_type`) without threading extra fields through every node
//! constructor. Grounded on
//! `examples/original_source/parser/symbols.go`'s `Graph` (`types`,
//! `gmap`, `scopes`, `symbols`, all keyed by a plain `int` node index).

use padac_util::{define_idx, IndexVec, LexiconIndex};
use rustc_hash::FxHashMap;

define_idx!(NodeId);

#[derive(Debug, Default)]
pub struct Ast {
    kinds: IndexVec<NodeId, String>,
    children: IndexVec<NodeId, Vec<NodeId>>,
    literals: FxHashMap<NodeId, LexiconIndex>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with the given kind string and children, returning its
    /// freshly minted id. Ids are assigned in construction order and are
    /// never reused, matching the node-index discipline of the original's
    /// `Graph`.
    pub fn add_node(&mut self, kind: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        let id = self.kinds.push(kind.into());
        let child_id = self.children.push(children);
        debug_assert_eq!(id, child_id);
        id
    }

    pub fn add_leaf(&mut self, kind: impl Into<String>, literal: Option<LexiconIndex>) -> NodeId {
        let id = self.add_node(kind, Vec::new());
        if let Some(lit) = literal {
            self.literals.insert(id, lit);
        }
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> NodeId {
        self.root.expect("ast root set after a successful parse")
    }

    pub fn kind(&self, node: NodeId) -> &str {
        &self.kinds[node]
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.children[node]
    }

    pub fn literal(&self, node: NodeId) -> Option<LexiconIndex> {
        self.literals.get(&node).copied()
    }

    pub fn node_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.kinds.indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_and_children_preserved() {
        let mut ast = Ast::new();
        let leaf_a = ast.add_leaf("ident", None);
        let leaf_b = ast.add_leaf("ident", None);
        let plus = ast.add_node("+", vec![leaf_a, leaf_b]);
        assert_ne!(leaf_a, leaf_b);
        assert_eq!(ast.kind(plus), "+");
        assert_eq!(ast.children(plus), &[leaf_a, leaf_b]);
    }
}
