//! Recursive-descent parser with error recovery, producing a
//! [`crate::cst::Node`] tree. Grounded on
//! `examples/original_source/parser/parser.go`'s `readFichier`/`readDecl`/
//! `readInstr`/`readExpr` family, but never panics: every production that
//! the original aborts on instead reports through the shared
//! `padac_util::Handler` and applies one of the three recovery strategies
//! spec.md §4.2 names.

use padac_util::{Handler, Span};
use padac_lex::{OpCode, Token};

use crate::cst::Node;
use crate::error::ParseError;

pub struct Parser<'t, 'h> {
    tokens: &'t [Token],
    pos: usize,
    handler: &'h mut Handler,
    fatal: Option<ParseError>,
}

type PResult<T> = Result<T, ()>;

impl<'t, 'h> Parser<'t, 'h> {
    pub fn new(tokens: &'t [Token], handler: &'h mut Handler) -> Self {
        Self {
            tokens,
            pos: 0,
            handler,
            fatal: None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    // -- token stream navigation -------------------------------------------------

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn at(&self, op: OpCode) -> bool {
        self.current().op == op
    }

    fn bump(&mut self) -> Token {
        let tok = self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consumes `op` if present, otherwise reports and recovers via
    /// strategy 1 (treat the terminal as implicitly inserted) so callers
    /// can keep parsing the rest of the construct.
    fn expect(&mut self, op: OpCode, what: &str) -> Token {
        if self.at(op) {
            self.bump()
        } else {
            let found = format!("{:?}", self.current().op);
            self.handler.error(
                ParseError::Unexpected {
                    expected: what.to_string(),
                    found,
                }
                .to_string(),
                self.current_span(),
            );
            self.current()
        }
    }

    fn expect_semicolon(&mut self) {
        if self.at(OpCode::Semicolon) {
            self.bump();
        } else {
            // Recovery strategy 1: missing-semicolon insertion. We report
            // and proceed as if the `;` were there, instead of eating
            // tokens that belong to the next statement.
            self.handler
                .error(ParseError::MissingSemicolon.to_string(), self.current_span());
        }
    }

    fn fatal(&mut self, msg: impl Into<String>) {
        let err = ParseError::Fatal(msg.into());
        self.handler.error(err.to_string(), self.current_span());
        self.fatal = Some(err);
    }

    /// Recovery strategy 2: skip tokens until one in `follow` (or EOF),
    /// so a malformed statement/declaration doesn't cascade into
    /// misparsing everything after it.
    fn recover_to(&mut self, follow: &[OpCode]) {
        while !self.at(OpCode::Eof) && !follow.contains(&self.current().op) {
            self.bump();
        }
    }

    // -- top level ----------------------------------------------------------------

    pub fn parse(mut self) -> Option<Node> {
        let root = self.parse_fichier();
        if self.fatal.is_some() {
            None
        } else {
            Some(root)
        }
    }

    fn parse_fichier(&mut self) -> Node {
        let begin = self.current_span();
        if !self.at(OpCode::With) {
            self.fatal("expected 'with Ada.Text_IO;' prologue");
            return Node::new("file", begin);
        }
        self.bump();
        self.expect_ident("Ada");
        self.expect(OpCode::Period, "'.'");
        self.expect_ident("Text_IO");
        self.expect_semicolon();

        if !self.at(OpCode::Use) {
            self.fatal("expected 'use Ada.Text_IO;' prologue");
            return Node::new("file", begin);
        }
        self.bump();
        self.expect_ident("Ada");
        self.expect(OpCode::Period, "'.'");
        self.expect_ident("Text_IO");
        self.expect_semicolon();

        if !self.at(OpCode::Procedure) {
            self.fatal("expected top-level 'procedure' declaration");
            return Node::new("file", begin);
        }
        self.bump();
        let name_tok = self.current();
        let name = self.expect_ident_node();

        let mut file = Node::new("file", begin);
        file.push(name);

        self.expect(OpCode::Is, "'is'");
        let decl = self.parse_decl_list();
        file.push(decl);

        self.expect(OpCode::Begin, "'begin'");
        let body = self.parse_body();
        file.push(body);

        self.expect(OpCode::End, "'end'");
        self.check_closing_ident(&name_tok);
        self.expect_semicolon();

        file
    }

    fn expect_ident(&mut self, _what: &str) -> Token {
        if self.current().op == OpCode::Ident {
            self.bump()
        } else {
            self.expect(OpCode::Ident, "identifier")
        }
    }

    fn expect_ident_node(&mut self) -> Node {
        let span = self.current_span();
        if self.current().op == OpCode::Ident {
            let tok = self.bump();
            Node::leaf("ident", span, tok.position.unwrap())
        } else {
            self.expect(OpCode::Ident, "identifier");
            Node::new("ident", span)
        }
    }

    /// Recovery strategy 3: a missing or mismatched closing identifier
    /// after `end` is a warning, not an error — Ada only requires it to
    /// *repeat* the opening name, it carries no new information.
    fn check_closing_ident(&mut self, opening: &Token) {
        if self.current().op == OpCode::Ident {
            let closing = self.bump();
            if closing.position != opening.position {
                self.handler.warn(
                    "closing identifier does not repeat the opening name",
                    closing.span,
                );
            }
        }
    }

    // -- declarations ---------------------------------------------------------------

    fn starts_decl(&self) -> bool {
        matches!(
            self.current().op,
            OpCode::Ident | OpCode::Type | OpCode::Procedure | OpCode::Function
        )
    }

    fn parse_decl_list(&mut self) -> Node {
        let begin = self.current_span();
        let mut decl = Node::new("decl", begin);
        while self.starts_decl() && self.fatal.is_none() {
            let before = self.pos;
            match self.parse_one_decl() {
                Ok(node) => decl.push(node),
                Err(()) => {
                    self.recover_to(&[OpCode::Semicolon, OpCode::Begin, OpCode::End]);
                    if self.at(OpCode::Semicolon) {
                        self.bump();
                    }
                }
            }
            if self.pos == before {
                // Nothing was consumed; avoid an infinite loop on unexpected input.
                self.bump();
            }
        }
        decl
    }

    fn parse_one_decl(&mut self) -> PResult<Node> {
        match self.current().op {
            OpCode::Type => self.parse_type_decl(),
            OpCode::Procedure => self.parse_proc_or_fn_decl(false),
            OpCode::Function => self.parse_proc_or_fn_decl(true),
            OpCode::Ident => self.parse_var_decl(),
            _ => Err(()),
        }
    }

    fn parse_var_decl(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        let mut names = vec![self.expect_ident_node()];
        while self.at(OpCode::Comma) {
            self.bump();
            names.push(self.expect_ident_node());
        }
        self.expect(OpCode::Colon, "':'");
        let ty = self.expect_ident_node();

        let mut var = Node::new("var", begin);
        if names.len() > 1 {
            var.push(Node::new("sameType", begin).with_children(names));
        } else {
            var.push(names.remove(0));
        }
        var.push(ty);

        if self.at(OpCode::Assign) {
            self.bump();
            let init = self.parse_expr();
            var.push(init);
        }
        self.expect_semicolon();
        Ok(var)
    }

    fn parse_type_decl(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'type'
        let name = self.expect_ident_node();
        let mut ty = Node::new("type", begin);
        ty.push(name);

        if self.at(OpCode::Semicolon) {
            self.bump();
            return Ok(ty);
        }
        self.expect(OpCode::Is, "'is'");
        if self.at(OpCode::Access) {
            self.bump();
            let target = self.expect_ident_node();
            ty.push(Node::new("access", begin).with_children(vec![target]));
        } else if self.at(OpCode::Record) {
            self.bump();
            let fields_begin = self.current_span();
            let mut fields = Node::new("fields", fields_begin);
            while self.current().op == OpCode::Ident {
                let fname = self.expect_ident_node();
                self.expect(OpCode::Colon, "':'");
                let fty = self.expect_ident_node();
                self.expect_semicolon();
                fields.push(Node::new("field", fields_begin).with_children(vec![fname, fty]));
            }
            self.expect(OpCode::End, "'end'");
            self.expect(OpCode::Record, "'record'");
            ty.push(fields);
        }
        self.expect_semicolon();
        Ok(ty)
    }

    fn parse_proc_or_fn_decl(&mut self, is_function: bool) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'procedure' | 'function'
        let name_tok = self.current();
        let name = self.expect_ident_node();

        let mut node = Node::new(if is_function { "function" } else { "procedure" }, begin);
        node.push(name);

        if self.at(OpCode::Lparen) {
            node.push(self.parse_params());
        }

        if is_function {
            self.expect(OpCode::Return, "'return'");
            node.push(self.expect_ident_node());
        }

        self.expect(OpCode::Is, "'is'");
        node.push(self.parse_decl_list());
        self.expect(OpCode::Begin, "'begin'");
        node.push(self.parse_body());
        self.expect(OpCode::End, "'end'");
        self.check_closing_ident(&name_tok);
        self.expect_semicolon();
        Ok(node)
    }

    fn parse_params(&mut self) -> Node {
        let begin = self.current_span();
        self.bump(); // '('
        let mut params = Node::new("params", begin);
        loop {
            let group_begin = self.current_span();
            let mut names = vec![self.expect_ident_node()];
            while self.at(OpCode::Comma) {
                self.bump();
                names.push(self.expect_ident_node());
            }
            self.expect(OpCode::Colon, "':'");

            let mode = if self.at(OpCode::In) {
                self.bump();
                if self.at(OpCode::Out) {
                    self.bump();
                    Some("inout")
                } else {
                    Some("in")
                }
            } else if self.at(OpCode::Out) {
                self.bump();
                Some("out")
            } else {
                None
            };
            let ty = self.expect_ident_node();

            let group = if names.len() > 1 {
                Node::new("sameType", group_begin).with_children(names)
            } else {
                names.remove(0)
            };

            let mut param = Node::new("param", group_begin);
            param.push(group);
            if let Some(mode) = mode {
                param.push(Node::new(mode, group_begin));
            }
            param.push(ty);
            params.push(param);

            if self.at(OpCode::Semicolon) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(OpCode::Rparen, "')'");
        params
    }

    // -- statements -----------------------------------------------------------------

    fn starts_body_end(&self) -> bool {
        matches!(self.current().op, OpCode::End | OpCode::Elsif | OpCode::Else | OpCode::Eof)
    }

    fn parse_body(&mut self) -> Node {
        let begin = self.current_span();
        let mut body = Node::new("body", begin);
        while !self.starts_body_end() && self.fatal.is_none() {
            let before = self.pos;
            match self.parse_stmt() {
                Ok(stmt) => body.push(stmt),
                Err(()) => {
                    self.recover_to(&[OpCode::Semicolon, OpCode::End, OpCode::Elsif, OpCode::Else]);
                    if self.at(OpCode::Semicolon) {
                        self.bump();
                    }
                }
            }
            if self.pos == before {
                self.bump();
            }
        }
        body
    }

    fn parse_stmt(&mut self) -> PResult<Node> {
        match self.current().op {
            OpCode::If => self.parse_if(),
            OpCode::While => self.parse_while(),
            OpCode::For => self.parse_for(),
            OpCode::Return => self.parse_return(),
            OpCode::Ident => self.parse_assign_or_call(),
            _ => Err(()),
        }
    }

    /// Disambiguates, after the leading identifier, between an assignment
    /// target (plain or qualified by `.field`) and a call — the single
    /// post-identifier lookahead point spec.md §4.2 describes.
    fn parse_assign_or_call(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        let name = self.expect_ident_node();

        let target = if self.at(OpCode::Period) {
            self.bump();
            let field = self.expect_ident_node();
            Node::new("access", begin).with_children(vec![name, field])
        } else {
            name
        };

        match self.current().op {
            OpCode::Assign => {
                self.bump();
                let value = self.parse_expr();
                self.expect_semicolon();
                Ok(Node::new(":=", begin).with_children(vec![target, value]))
            }
            OpCode::Lparen => {
                let args = self.parse_args();
                self.expect_semicolon();
                Ok(Node::new("call", begin).with_children(vec![target, args]))
            }
            OpCode::Semicolon => {
                self.bump();
                Ok(Node::new("call", begin).with_children(vec![target]))
            }
            _ => {
                self.handler.error(
                    ParseError::Unexpected {
                        expected: "':=' or '(' or ';'".to_string(),
                        found: format!("{:?}", self.current().op),
                    }
                    .to_string(),
                    self.current_span(),
                );
                Err(())
            }
        }
    }

    fn parse_args(&mut self) -> Node {
        let begin = self.current_span();
        self.bump(); // '('
        let mut args = Node::new("args", begin);
        if !self.at(OpCode::Rparen) {
            args.push(self.parse_expr());
            while self.at(OpCode::Comma) {
                self.bump();
                args.push(self.parse_expr());
            }
        }
        self.expect(OpCode::Rparen, "')'");
        args
    }

    fn parse_if(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'if'
        let cond = self.parse_expr();
        self.expect(OpCode::Then, "'then'");
        let body = self.parse_body();

        let mut node = Node::new("if", begin).with_children(vec![cond, body]);
        node.children.extend(self.parse_elsif_else_tail(begin)?);

        self.expect(OpCode::End, "'end'");
        self.expect(OpCode::If, "'if'");
        self.expect_semicolon();
        Ok(node)
    }

    /// Parses the `elsif`/`else` tail of an `if`, matching `ReadIf`'s
    /// recursion: an `elsif` becomes a nested `"elif"` node (itself
    /// carrying its own tail), `else` becomes a bare body, and having
    /// neither leaves the `if` node with just its condition and body.
    fn parse_elsif_else_tail(&mut self, begin: Span) -> PResult<Vec<Node>> {
        if self.at(OpCode::Elsif) {
            self.bump();
            let cond = self.parse_expr();
            self.expect(OpCode::Then, "'then'");
            let body = self.parse_body();
            let mut elif = Node::new("elif", begin).with_children(vec![cond, body]);
            elif.children.extend(self.parse_elsif_else_tail(begin)?);
            Ok(vec![elif])
        } else if self.at(OpCode::Else) {
            self.bump();
            Ok(vec![self.parse_body()])
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'while'
        let cond = self.parse_expr();
        self.expect(OpCode::Loop, "'loop'");
        let body = self.parse_body();
        self.expect(OpCode::End, "'end'");
        self.expect(OpCode::Loop, "'loop'");
        self.expect_semicolon();
        Ok(Node::new("while", begin).with_children(vec![cond, body]))
    }

    fn parse_for(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'for'
        let index = self.expect_ident_node();
        self.expect(OpCode::In, "'in'");
        let reverse = if self.at(OpCode::Reverse) {
            self.bump();
            true
        } else {
            false
        };
        let lo = self.parse_expr();
        self.expect(OpCode::Range, "'..'");
        let hi = self.parse_expr();
        self.expect(OpCode::Loop, "'loop'");
        let body = self.parse_body();
        self.expect(OpCode::End, "'end'");
        self.expect(OpCode::Loop, "'loop'");
        self.expect_semicolon();

        let direction = Node::new(if reverse { "reverse" } else { "not reverse" }, begin);
        Ok(Node::new("for", begin).with_children(vec![index, direction, lo, hi, body]))
    }

    fn parse_return(&mut self) -> PResult<Node> {
        let begin = self.current_span();
        self.bump(); // 'return'
        if self.at(OpCode::Semicolon) {
            self.bump();
            return Ok(Node::new("return", begin));
        }
        let value = self.parse_expr();
        self.expect_semicolon();
        Ok(Node::new("return", begin).with_children(vec![value]))
    }

    // -- expressions (precedence climbing) -------------------------------------------

    fn parse_expr(&mut self) -> Node {
        self.parse_or()
    }

    /// `or` / `or else`, the lowest-precedence level. `or else` is
    /// recognized by peeking the keyword right after a consumed `or` —
    /// the lexer only ever emits plain `or`/`else` tokens, matching
    /// spec.md's note that the compound keywords are a parser-level
    /// concept, not a lexer one.
    fn parse_or(&mut self) -> Node {
        let mut lhs = self.parse_and();
        while self.at(OpCode::Or) {
            let begin = self.current_span();
            self.bump();
            let op = if self.at(OpCode::Else) {
                self.bump();
                "or else"
            } else {
                "or"
            };
            let rhs = self.parse_and();
            lhs = Node::new(op, begin).with_children(vec![lhs, rhs]);
        }
        lhs
    }

    /// `and` / `and then`, one level above `or`/`or else` and below the
    /// relational operators.
    fn parse_and(&mut self) -> Node {
        let mut lhs = self.parse_relational();
        while self.at(OpCode::And) {
            let begin = self.current_span();
            self.bump();
            let op = if self.at(OpCode::Then) {
                self.bump();
                "and then"
            } else {
                "and"
            };
            let rhs = self.parse_relational();
            lhs = Node::new(op, begin).with_children(vec![lhs, rhs]);
        }
        lhs
    }

    fn parse_relational(&mut self) -> Node {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.current().op {
                OpCode::Eql => "=",
                OpCode::Neq => "/=",
                OpCode::Lss => "<",
                OpCode::Leq => "<=",
                OpCode::Gtr => ">",
                OpCode::Geq => ">=",
                _ => break,
            };
            let begin = self.current_span();
            self.bump();
            let rhs = self.parse_additive();
            lhs = Node::new(op, begin).with_children(vec![lhs, rhs]);
        }
        lhs
    }

    fn parse_additive(&mut self) -> Node {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.current().op {
                OpCode::Add => "+",
                OpCode::Sub => "-",
                _ => break,
            };
            let begin = self.current_span();
            self.bump();
            let rhs = self.parse_multiplicative();
            lhs = Node::new(op, begin).with_children(vec![lhs, rhs]);
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Node {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.current().op {
                OpCode::Mul => "*",
                OpCode::Quo => "/",
                OpCode::Rem => "rem",
                _ => break,
            };
            let begin = self.current_span();
            self.bump();
            let rhs = self.parse_unary();
            lhs = Node::new(op, begin).with_children(vec![lhs, rhs]);
        }
        lhs
    }

    /// A leading unary `-` lowers to a `"call"` node whose first child is
    /// a bare `"-"` leaf, matching the shape
    /// `examples/original_source/parser/asm.go`'s `ReadOperand` dispatches
    /// on (`children[0]` kind `"-"`) — see DESIGN.md for why this quirk is
    /// kept rather than given its own node kind.
    fn parse_unary(&mut self) -> Node {
        if self.at(OpCode::Sub) {
            let begin = self.current_span();
            self.bump();
            let operand = self.parse_unary();
            let minus = Node::new("-", begin);
            return Node::new("call", begin).with_children(vec![minus, operand]);
        }
        if self.at(OpCode::Not) {
            let begin = self.current_span();
            self.bump();
            let operand = self.parse_unary();
            return Node::new("not", begin).with_children(vec![operand]);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Node {
        let begin = self.current_span();
        match self.current().op {
            OpCode::Int => {
                let tok = self.bump();
                Node::leaf("int", begin, tok.position.unwrap())
            }
            OpCode::Char => {
                let tok = self.bump();
                Node::leaf("char", begin, tok.position.unwrap())
            }
            OpCode::Str => {
                let tok = self.bump();
                Node::leaf("string", begin, tok.position.unwrap())
            }
            OpCode::True => {
                self.bump();
                Node::new("true", begin)
            }
            OpCode::False => {
                self.bump();
                Node::new("false", begin)
            }
            OpCode::Null => {
                self.bump();
                Node::new("null", begin)
            }
            OpCode::New => {
                self.bump();
                let target = self.expect_ident_node();
                Node::new("new", begin).with_children(vec![target])
            }
            OpCode::Lparen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(OpCode::Rparen, "')'");
                inner
            }
            OpCode::Ident => {
                let name = self.expect_ident_node();
                if self.at(OpCode::Period) {
                    self.bump();
                    let field = self.expect_ident_node();
                    return Node::new("access", begin).with_children(vec![name, field]);
                }
                if self.at(OpCode::Lparen) {
                    let args = self.parse_args();
                    return Node::new("call", begin).with_children(vec![name, args]);
                }
                name
            }
            _ => {
                self.handler.error(
                    ParseError::Unexpected {
                        expected: "an expression".to_string(),
                        found: format!("{:?}", self.current().op),
                    }
                    .to_string(),
                    begin,
                );
                Node::new("error", begin)
            }
        }
    }
}

