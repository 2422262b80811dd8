//! Lowers a [`crate::cst::Node`] tree into the [`crate::ast::Ast`] graph.
//!
//! The parser already folds operator-precedence chains and grammar-
//! factoring productions (`parse_relational`/`parse_additive`/...) while
//! building the concrete tree, so lowering here is a straightforward
//! structural copy: every CST node becomes exactly one AST node with the
//! same kind string and recursively-lowered children. Kept as its own
//! pass (rather than building the AST directly in the parser) because
//! spec.md's Data Model describes the AST as a distinct representation
//! from the parse tree, and because the side tables `padac-sem` and
//! `padac-gen` populate only make sense once the tree has settled into
//! its final node-id-addressed form.

use crate::ast::{Ast, NodeId};
use crate::cst::Node;

pub fn lower(root: &Node) -> Ast {
    let mut ast = Ast::new();
    let root_id = lower_node(&mut ast, root);
    ast.set_root(root_id);
    ast
}

fn lower_node(ast: &mut Ast, node: &Node) -> NodeId {
    if node.children.is_empty() {
        ast.add_leaf(node.kind.clone(), node.literal)
    } else {
        let children: Vec<NodeId> = node.children.iter().map(|c| lower_node(ast, c)).collect();
        ast.add_node(node.kind.clone(), children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padac_util::Span;

    #[test]
    fn leaves_and_branches_lower_one_to_one() {
        let a = Node::new("ident", Span::DUMMY);
        let b = Node::new("ident", Span::DUMMY);
        let plus = Node::new("+", Span::DUMMY).with_children(vec![a, b]);

        let ast = lower(&plus);
        assert_eq!(ast.kind(ast.root()), "+");
        assert_eq!(ast.children(ast.root()).len(), 2);
    }
}
