use padac_util::{Handler, Lexicon, Pos, Span};

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{OpCode, Token};

/// Recognizes the source's reserved words, literals, operators and
/// separators and produces a flat token stream plus the accompanying
/// [`Lexicon`] of literal spellings.
///
/// Grounded on `examples/original_source/lexer/lexer.go`'s `Read` method:
/// same dispatch shape (peek-ahead on `-`, `/`, `:`, `<`, `>`, `.`; skip
/// whitespace via a Unicode-aware predicate; scan digits/letters into
/// runs), but recoverable rather than `panic!`-based.
pub struct Lexer<'a, 'h> {
    cursor: Cursor<'a>,
    handler: &'h mut Handler,
    lexicon: &'h mut Lexicon,
}

impl<'a, 'h> Lexer<'a, 'h> {
    pub fn new(source: &'a str, handler: &'h mut Handler, lexicon: &'h mut Lexicon) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            lexicon,
        }
    }

    /// Tokenizes the entire source, always terminating with one `Eof`
    /// token so callers never need to special-case running out of input.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.op == OpCode::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn pos(&self) -> Pos {
        Pos::new(self.cursor.line(), self.cursor.column())
    }

    fn simple(&self, op: OpCode, begin: Pos) -> Token {
        Token {
            op,
            span: Span::new(begin, self.pos()),
            position: None,
        }
    }

    fn literal(&mut self, op: OpCode, begin: Pos, spelling: String) -> Token {
        let position = self.lexicon.record(spelling);
        Token {
            op,
            span: Span::new(begin, self.pos()),
            position: Some(position),
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let begin = self.pos();
        let Some(c) = self.cursor.peek() else {
            return self.simple(OpCode::Eof, begin);
        };

        if c.is_ascii_digit() {
            return self.lex_number(begin);
        }
        if can_start_identifier(c) {
            return self.lex_identifier(begin);
        }

        match c {
            '\'' => self.lex_char(begin),
            '"' => self.lex_string(begin),
            '+' => {
                self.cursor.advance();
                self.simple(OpCode::Add, begin)
            }
            '-' => {
                self.cursor.advance();
                self.simple(OpCode::Sub, begin)
            }
            '*' => {
                self.cursor.advance();
                self.simple(OpCode::Mul, begin)
            }
            '/' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.simple(OpCode::Neq, begin)
                } else {
                    self.simple(OpCode::Quo, begin)
                }
            }
            '=' => {
                self.cursor.advance();
                self.simple(OpCode::Eql, begin)
            }
            '.' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('.') {
                    self.cursor.advance();
                    self.simple(OpCode::Range, begin)
                } else {
                    self.simple(OpCode::Period, begin)
                }
            }
            ';' => {
                self.cursor.advance();
                self.simple(OpCode::Semicolon, begin)
            }
            ',' => {
                self.cursor.advance();
                self.simple(OpCode::Comma, begin)
            }
            ':' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.simple(OpCode::Assign, begin)
                } else {
                    self.simple(OpCode::Colon, begin)
                }
            }
            '(' => {
                self.cursor.advance();
                self.simple(OpCode::Lparen, begin)
            }
            ')' => {
                self.cursor.advance();
                self.simple(OpCode::Rparen, begin)
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.simple(OpCode::Geq, begin)
                } else {
                    self.simple(OpCode::Gtr, begin)
                }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.simple(OpCode::Leq, begin)
                } else {
                    self.simple(OpCode::Lss, begin)
                }
            }
            other => {
                self.cursor.advance();
                self.report(LexError::UnexpectedChar(other), begin);
                // Recover by treating it as whitespace and re-tokenizing.
                self.next_token()
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('-') if self.cursor.peek2() == Some('-') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    fn lex_identifier(&mut self, begin: Pos) -> Token {
        let name = self.cursor.eat_while(can_continue_identifier);
        if let Some(op) = OpCode::keyword_from_ident(&name.to_ascii_lowercase()) {
            return self.simple(op, begin);
        }
        self.literal(OpCode::Ident, begin, name)
    }

    fn lex_number(&mut self, begin: Pos) -> Token {
        let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
        self.literal(OpCode::Int, begin, digits)
    }

    fn lex_char(&mut self, begin: Pos) -> Token {
        self.cursor.advance(); // opening quote
        if self.cursor.peek() == Some('\'') {
            self.cursor.advance(); // closing quote
            self.report(LexError::EmptyCharLiteral, begin);
            return self.literal(OpCode::Char, begin, "''".to_string());
        }
        let Some(c) = self.cursor.advance() else {
            self.report(LexError::UnterminatedCharLiteral, begin);
            return self.simple(OpCode::Eof, begin);
        };
        if self.cursor.peek() == Some('\'') {
            self.cursor.advance();
            return self.literal(OpCode::Char, begin, format!("'{c}'"));
        }
        // Recovery strategy 3 (original `lexer.go`): collect the unexpected
        // run up to the next quote or EOF and report it, instead of
        // aborting the whole compilation.
        let mut junk = String::new();
        junk.push(c);
        loop {
            match self.cursor.peek() {
                Some('\'') => {
                    self.cursor.advance();
                    break;
                }
                Some(_) => junk.push(self.cursor.advance().unwrap()),
                None => break,
            }
        }
        self.report(LexError::UnterminatedCharLiteral, begin);
        self.literal(OpCode::Char, begin, format!("'{}'", junk.chars().next().unwrap_or(c)))
    }

    fn lex_string(&mut self, begin: Pos) -> Token {
        self.cursor.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.cursor.peek() {
                Some('"') => {
                    self.cursor.advance();
                    return self.literal(OpCode::Str, begin, text);
                }
                Some(_) => text.push(self.cursor.advance().unwrap()),
                None => {
                    self.report(LexError::UnterminatedStringLiteral, begin);
                    return self.literal(OpCode::Str, begin, text);
                }
            }
        }
    }

    fn report(&mut self, err: LexError, begin: Pos) {
        let span = Span::new(begin, self.pos());
        self.handler.error(err.to_string(), span);
    }
}

fn can_start_identifier(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn can_continue_identifier(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> (Vec<Token>, Handler, Lexicon) {
        let mut handler = Handler::new();
        let mut lexicon = Lexicon::new();
        let tokens = {
            let lexer = Lexer::new(src, &mut handler, &mut lexicon);
            lexer.tokenize()
        };
        (tokens, handler, lexicon)
    }

    #[test]
    fn recognizes_prologue_keywords() {
        let (tokens, handler, _) = tokenize("with Ada.Text_IO;");
        assert!(!handler.has_errors());
        assert_eq!(tokens[0].op, OpCode::With);
        assert_eq!(tokens[1].op, OpCode::Ident);
        assert_eq!(tokens[2].op, OpCode::Period);
        assert_eq!(tokens[3].op, OpCode::Ident);
        assert_eq!(tokens[4].op, OpCode::Semicolon);
        assert_eq!(tokens[5].op, OpCode::Eof);
    }

    #[test]
    fn range_requires_two_periods() {
        let (tokens, _, _) = tokenize("1..10");
        assert_eq!(tokens[0].op, OpCode::Int);
        assert_eq!(tokens[1].op, OpCode::Range);
        assert_eq!(tokens[2].op, OpCode::Int);
    }

    #[test]
    fn single_period_stays_a_period() {
        let (tokens, _, _) = tokenize("x.y");
        assert_eq!(tokens[1].op, OpCode::Period);
    }

    #[test]
    fn assign_vs_bare_colon() {
        let (tokens, _, _) = tokenize("x := 1; y : integer;");
        assert_eq!(tokens[1].op, OpCode::Assign);
        assert_eq!(tokens[6].op, OpCode::Colon);
    }

    #[test]
    fn rem_is_an_operator_not_a_keyword() {
        let (tokens, _, _) = tokenize("x rem y");
        assert_eq!(tokens[1].op, OpCode::Rem);
        assert_eq!(tokens[1].kind(), crate::token::TokenKind::Operator);
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let (tokens, _, _) = tokenize("x -- comment\n:= 1;");
        assert_eq!(tokens[0].op, OpCode::Ident);
        assert_eq!(tokens[1].op, OpCode::Assign);
    }

    #[test]
    fn unexpected_character_is_reported_but_not_fatal() {
        let (tokens, handler, _) = tokenize("x @ y");
        assert!(handler.has_errors());
        assert_eq!(tokens[0].op, OpCode::Ident);
        assert_eq!(tokens[1].op, OpCode::Ident);
    }

    #[test]
    fn literal_spellings_land_in_the_lexicon() {
        let (tokens, _, lexicon) = tokenize("counter");
        let pos = tokens[0].position.expect("ident carries a lexicon index");
        assert_eq!(lexicon.get(pos), "counter");
    }

    #[test]
    fn empty_char_literal_is_reported_without_consuming_the_rest_of_the_line() {
        let (tokens, handler, _) = tokenize("x := ''; y := 1;");
        assert!(handler.has_errors());
        assert!(matches!(
            handler.diagnostics()[0].message.as_str(),
            "empty character literal"
        ));
        // lexing must have stopped at the literal's own closing quote,
        // not run on looking for some later one.
        assert_eq!(tokens[2].op, OpCode::Char);
        assert_eq!(tokens[3].op, OpCode::Semicolon);
        assert_eq!(tokens[4].op, OpCode::Ident);
    }

    #[test]
    fn non_empty_char_literal_still_lexes_normally() {
        let (tokens, handler, lexicon) = tokenize("'a'");
        assert!(!handler.has_errors());
        assert_eq!(tokens[0].op, OpCode::Char);
        let pos = tokens[0].position.unwrap();
        assert_eq!(lexicon.get(pos), "'a'");
    }
}
