//! The concrete parse tree. Exists only between parsing and lowering; once
//! [`crate::lower::lower`] has built the [`crate::ast::Ast`] graph, the
//! `Node` tree is dropped. Grounded on
//! `examples/original_source/parser/parser.go`'s `Node{Type, Index,
//! Children}`.

use padac_util::{LexiconIndex, Span};

#[derive(Clone, Debug)]
pub struct Node {
    /// The grammar production or terminal spelling this node stands for,
    /// e.g. `"if"`, `"+"`, `"sameType"`, `"ident"`.
    pub kind: String,
    pub span: Span,
    /// Set for terminal nodes carrying a literal spelling (identifiers,
    /// int/char/string literals).
    pub literal: Option<LexiconIndex>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            span,
            literal: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: impl Into<String>, span: Span, literal: LexiconIndex) -> Self {
        Self {
            kind: kind.into(),
            span,
            literal: Some(literal),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }
}
