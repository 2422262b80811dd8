//! padac-par — Recursive-Descent Parsing
//!
//! Parses a token stream into a concrete parse tree ([`cst::Node`]) with
//! error recovery, then lowers it into the [`ast::Ast`] graph the rest of
//! the pipeline operates on.

pub mod ast;
pub mod cst;
pub mod error;
pub mod lower;
pub mod parser;

pub use ast::{Ast, NodeId};
pub use error::ParseError;
pub use lower::lower;
pub use parser::Parser;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use padac_lex::Lexer;
    use padac_util::{Handler, Lexicon};

    fn parse_source(src: &str) -> (Option<Ast>, Handler) {
        let mut handler = Handler::new();
        let mut lexicon = Lexicon::new();
        let tokens = Lexer::new(src, &mut handler, &mut lexicon).tokenize();
        let parser = Parser::new(&tokens, &mut handler);
        let cst = parser.parse();
        (cst.as_ref().map(lower), handler)
    }

    const PRELUDE: &str = "with Ada.Text_IO; use Ada.Text_IO; procedure main is";

    #[test]
    fn parses_a_minimal_program() {
        let src = format!("{PRELUDE} begin put(1); end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let ast = ast.expect("parse succeeds");
        assert_eq!(ast.kind(ast.root()), "file");
    }

    #[test]
    fn parses_nested_procedure_with_static_link_access() {
        let src = format!(
            "{PRELUDE} \
             x : integer; \
             procedure inner is \
             begin \
               x := 1; \
             end inner; \
             begin \
               inner(); \
             end main;"
        );
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert!(ast.is_some());
    }

    #[test]
    fn parses_reverse_for_loop() {
        let src = format!(
            "{PRELUDE} begin \
               for i in reverse 1 .. 10 loop \
                 put(i); \
               end loop; \
             end main;"
        );
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert!(ast.is_some());
    }

    #[test]
    fn operator_precedence_builds_the_expected_shape() {
        let src = format!("{PRELUDE} x : integer := 1 + 2 * 3; begin null; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors());
        let ast = ast.unwrap();
        // file -> [name, decl, body]; decl -> [var]; var -> [name, ty, init]
        let file_children = ast.children(ast.root());
        let decl = file_children[1];
        let var = ast.children(decl)[0];
        let init = ast.children(var)[2];
        assert_eq!(ast.kind(init), "+");
        let rhs = ast.children(init)[1];
        assert_eq!(ast.kind(rhs), "*");
    }

    #[test]
    fn and_or_bind_looser_than_relational_operators() {
        let src = format!("{PRELUDE} x : integer := a = b and c = d or e; begin null; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let ast = ast.unwrap();
        let decl = ast.children(ast.root())[1];
        let var = ast.children(decl)[0];
        let init = ast.children(var)[2];
        // a = b and c = d or e  ==>  or( and( =(a,b), =(c,d) ), e )
        assert_eq!(ast.kind(init), "or");
        let and_node = ast.children(init)[0];
        assert_eq!(ast.kind(and_node), "and");
        let lhs_eq = ast.children(and_node)[0];
        assert_eq!(ast.kind(lhs_eq), "=");
        let rhs_eq = ast.children(and_node)[1];
        assert_eq!(ast.kind(rhs_eq), "=");
    }

    #[test]
    fn and_then_or_else_are_recognized_as_compound_keywords() {
        let src = format!("{PRELUDE} begin if a and then b then null; end if; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let ast = ast.unwrap();
        let body = ast.children(ast.root())[2];
        let if_node = ast.children(body)[0];
        assert_eq!(ast.kind(if_node), "if");
        let cond = ast.children(if_node)[0];
        assert_eq!(ast.kind(cond), "and then");

        let src = format!("{PRELUDE} begin if a or else b then null; end if; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let ast = ast.unwrap();
        let body = ast.children(ast.root())[2];
        let if_node = ast.children(body)[0];
        let cond = ast.children(if_node)[0];
        assert_eq!(ast.kind(cond), "or else");
    }

    #[test]
    fn missing_semicolon_is_recoverable_not_fatal() {
        let src = format!("{PRELUDE} x : integer := 1 begin null; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(handler.has_errors());
        assert!(ast.is_some(), "a missing ';' must not abort the whole parse");
    }

    #[test]
    fn division_and_rem_parse_as_distinct_operators() {
        let src = format!("{PRELUDE} x : integer := 7 / 2; y : integer := 7 rem 2; begin null; end main;");
        let (ast, handler) = parse_source(&src);
        assert!(!handler.has_errors());
        let ast = ast.unwrap();
        let decl = ast.children(ast.root())[1];
        let var_x = ast.children(decl)[0];
        let var_y = ast.children(decl)[1];
        assert_eq!(ast.kind(ast.children(var_x)[2]), "/");
        assert_eq!(ast.kind(ast.children(var_y)[2]), "rem");
    }
}
