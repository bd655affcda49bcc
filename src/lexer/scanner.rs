use crate::diagnostic::Diagnostic;
use crate::lexer::token::{Token, TokenKind};
use crate::session::Session;
use crate::span::Span;

/// Lexes the session's source file into a token vector terminated by an
/// [`TokenKind::Eof`] token whose span is empty at end-of-input.
pub fn lex(sess: &mut Session) -> Vec<Token> {
    Scanner::new(sess).scan()
}

/// Scanner for Lue source text.
///
/// Operates on raw bytes; identifiers, numbers and operators are all ASCII.
/// Problems (unterminated strings, unknown escapes) are reported to the
/// session's diagnostic bag, never panicked on; the scanner always produces
/// a token stream the parser can make progress over.
pub struct Scanner<'a> {
    sess: &'a mut Session,
    /// Current position in the source, in bytes.
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner at the start of the session's file.
    pub fn new(sess: &'a mut Session) -> Self {
        Scanner { sess, pos: 0 }
    }

    /// Scans all tokens from the source.
    pub fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.eat_while(is_whitespace);
            let Some(b) = self.peek() else { break };

            let start = self.pos;
            self.advance();

            // Line comment, skipped like whitespace.
            if b == b'/' && self.peek() == Some(b'/') {
                self.eat_while(|b| b != b'\n');
                continue;
            }

            let (kind, lexeme) = self.scan_token(b);
            tokens.push(Token::new(kind, lexeme, Span::new(start, self.pos)));
        }

        tokens.push(Token::new(TokenKind::Eof, "", Span::empty(self.pos)));
        tokens
    }

    fn scan_token(&mut self, first: u8) -> (TokenKind, String) {
        match first {
            b'+' => (TokenKind::Plus, String::new()),
            b'-' => (TokenKind::Minus, String::new()),
            b'*' => (TokenKind::Star, String::new()),
            b'/' => (TokenKind::Slash, String::new()),
            b'>' => {
                if self.match_byte(b'=') {
                    (TokenKind::GtEq, String::new())
                } else {
                    (TokenKind::Gt, String::new())
                }
            }
            b'<' => {
                if self.match_byte(b'=') {
                    (TokenKind::LtEq, String::new())
                } else {
                    (TokenKind::Lt, String::new())
                }
            }
            b'=' => {
                if self.match_byte(b'=') {
                    (TokenKind::Eq, String::new())
                } else {
                    (TokenKind::Assign, String::new())
                }
            }
            b'!' => {
                if self.match_byte(b'=') {
                    (TokenKind::NotEq, String::new())
                } else {
                    (TokenKind::Unknown, "!".to_string())
                }
            }
            b':' => (TokenKind::Colon, String::new()),
            b',' => (TokenKind::Comma, String::new()),
            b'.' => (TokenKind::Dot, String::new()),
            b'(' => (TokenKind::LeftParen, String::new()),
            b'[' => (TokenKind::LeftBracket, String::new()),
            b'{' => (TokenKind::LeftBrace, String::new()),
            b')' => (TokenKind::RightParen, String::new()),
            b']' => (TokenKind::RightBracket, String::new()),
            b'}' => (TokenKind::RightBrace, String::new()),
            b'0'..=b'9' => self.scan_number(first),
            b'"' => self.scan_string(),
            _ if is_ident_start(first) => self.scan_ident(first),
            _ => (TokenKind::Unknown, (first as char).to_string()),
        }
    }

    /// Scans the remaining digits of an integer literal. The lexeme is kept
    /// as written; numeric parsing is deferred to the binder.
    fn scan_number(&mut self, first: u8) -> (TokenKind, String) {
        (TokenKind::Number, self.collect(first, is_digit))
    }

    /// Scans a string literal, opening `"` already eaten.
    ///
    /// Recognizes the `\"` and `\\` escapes. An unknown escape is reported
    /// and the escaped byte is kept verbatim; end of line or end of file
    /// before the closing quote is reported as an unterminated string and
    /// the content scanned so far becomes the token's lexeme.
    fn scan_string(&mut self) -> (TokenKind, String) {
        // Collected as bytes; every split point is ASCII, so the content
        // is always valid UTF-8.
        let mut content = Vec::new();

        loop {
            match self.peek() {
                None | Some(b'\r') | Some(b'\n') => {
                    Diagnostic::builder("unterminated string", Span::empty(self.pos))
                        .label("expected `\"` here")
                        .emit(&mut self.sess.diags);
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.peek() {
                        Some(esc @ (b'"' | b'\\')) => {
                            content.push(esc);
                            self.advance();
                        }
                        Some(esc) => {
                            let msg = format!("unknown character escape `{}`", esc as char);
                            Diagnostic::builder(msg, Span::empty(self.pos))
                                .label("unknown character escape here")
                                .emit(&mut self.sess.diags);
                        }
                        // Let the next iteration report the unterminated string.
                        None => {}
                    }
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b) => {
                    self.advance();
                    content.push(b);
                }
            }
        }

        (TokenKind::Str, String::from_utf8_lossy(&content).into_owned())
    }

    /// Scans an identifier or keyword.
    fn scan_ident(&mut self, first: u8) -> (TokenKind, String) {
        let lexeme = self.collect(first, is_ident_cont);
        let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Ident);
        (kind, lexeme)
    }

    /// Collects bytes into a string while `matches` returns true.
    fn collect(&mut self, first: u8, matches: impl Fn(u8) -> bool) -> String {
        let mut s = String::new();
        s.push(first as char);

        while let Some(b) = self.peek() {
            if !matches(b) {
                break;
            }
            s.push(b as char);
            self.advance();
        }

        s
    }

    /// Returns the next byte without advancing, or `None` at end of file.
    fn peek(&self) -> Option<u8> {
        self.sess.file.src().as_bytes().get(self.pos).copied()
    }

    /// Advances the scanner to the next byte.
    fn advance(&mut self) {
        if self.pos < self.sess.file.src().len() {
            self.pos += 1;
        }
    }

    /// Advances past the next byte if it equals `b`.
    fn match_byte(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Eats bytes while `matches` returns true.
    fn eat_while(&mut self, matches: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if !matches(b) {
                break;
            }
            self.advance();
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_cont(b: u8) -> bool {
    is_ident_start(b) || is_digit(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_src(src: &str) -> (Vec<Token>, Session) {
        let mut sess = Session::new("test", src);
        let tokens = lex(&mut sess);
        (tokens, sess)
    }

    fn first_token(src: &str) -> Token {
        lex_src(src).0.remove(0)
    }

    #[test]
    fn single_tokens() {
        let cases: &[(&str, Token)] = &[
            ("", Token::new(TokenKind::Eof, "", Span::empty(0))),
            (" ", Token::new(TokenKind::Eof, "", Span::empty(1))),
            ("\t", Token::new(TokenKind::Eof, "", Span::empty(1))),
            ("\r\n", Token::new(TokenKind::Eof, "", Span::empty(2))),
            ("// comment", Token::new(TokenKind::Eof, "", Span::empty(10))),
            ("foo", Token::new(TokenKind::Ident, "foo", Span::new(0, 3))),
            ("_foo", Token::new(TokenKind::Ident, "_foo", Span::new(0, 4))),
            ("foo123", Token::new(TokenKind::Ident, "foo123", Span::new(0, 6))),
            ("123", Token::new(TokenKind::Number, "123", Span::new(0, 3))),
            (r#""foo""#, Token::new(TokenKind::Str, "foo", Span::new(0, 5))),
            (
                r#""foo\"bar\"""#,
                Token::new(TokenKind::Str, r#"foo"bar""#, Span::new(0, 12)),
            ),
            ("+", Token::new(TokenKind::Plus, "", Span::new(0, 1))),
            ("-", Token::new(TokenKind::Minus, "", Span::new(0, 1))),
            ("*", Token::new(TokenKind::Star, "", Span::new(0, 1))),
            ("/", Token::new(TokenKind::Slash, "", Span::new(0, 1))),
            ("=", Token::new(TokenKind::Assign, "", Span::new(0, 1))),
            (">", Token::new(TokenKind::Gt, "", Span::new(0, 1))),
            ("<", Token::new(TokenKind::Lt, "", Span::new(0, 1))),
            (">=", Token::new(TokenKind::GtEq, "", Span::new(0, 2))),
            ("<=", Token::new(TokenKind::LtEq, "", Span::new(0, 2))),
            ("==", Token::new(TokenKind::Eq, "", Span::new(0, 2))),
            ("!=", Token::new(TokenKind::NotEq, "", Span::new(0, 2))),
            (":", Token::new(TokenKind::Colon, "", Span::new(0, 1))),
            (",", Token::new(TokenKind::Comma, "", Span::new(0, 1))),
            (".", Token::new(TokenKind::Dot, "", Span::new(0, 1))),
            ("(", Token::new(TokenKind::LeftParen, "", Span::new(0, 1))),
            ("[", Token::new(TokenKind::LeftBracket, "", Span::new(0, 1))),
            ("{", Token::new(TokenKind::LeftBrace, "", Span::new(0, 1))),
            (")", Token::new(TokenKind::RightParen, "", Span::new(0, 1))),
            ("]", Token::new(TokenKind::RightBracket, "", Span::new(0, 1))),
            ("}", Token::new(TokenKind::RightBrace, "", Span::new(0, 1))),
            ("break", Token::new(TokenKind::Break, "break", Span::new(0, 5))),
            ("class", Token::new(TokenKind::Class, "class", Span::new(0, 5))),
            ("else", Token::new(TokenKind::Else, "else", Span::new(0, 4))),
            ("false", Token::new(TokenKind::False, "false", Span::new(0, 5))),
            ("fn", Token::new(TokenKind::Fn, "fn", Span::new(0, 2))),
            ("for", Token::new(TokenKind::For, "for", Span::new(0, 3))),
            ("if", Token::new(TokenKind::If, "if", Span::new(0, 2))),
            ("let", Token::new(TokenKind::Let, "let", Span::new(0, 3))),
            ("return", Token::new(TokenKind::Return, "return", Span::new(0, 6))),
            ("true", Token::new(TokenKind::True, "true", Span::new(0, 4))),
            ("?", Token::new(TokenKind::Unknown, "?", Span::new(0, 1))),
            ("!", Token::new(TokenKind::Unknown, "!", Span::new(0, 1))),
        ];

        for (src, want) in cases {
            assert_eq!(first_token(src), *want, "lex({src:?})");
        }
    }

    #[test]
    fn token_stream_with_spans() {
        let (tokens, sess) = lex_src("let x = 10");
        assert!(sess.diags.is_empty());

        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[1].span, Span::new(4, 5));
        assert_eq!(tokens[3].span, Span::new(8, 10));
        assert_eq!(tokens[4].span, Span::empty(10));
    }

    #[test]
    fn comments_are_skipped_to_end_of_line() {
        let (tokens, sess) = lex_src("1 // one\n2");
        assert!(sess.diags.is_empty());
        let lexemes: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(TokenKind::Number))
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(lexemes, ["1", "2"]);
    }

    #[test]
    fn unterminated_string_reports_and_keeps_content() {
        let (tokens, sess) = lex_src("\"abc");
        assert_eq!(sess.diags.len(), 1);
        assert_eq!(sess.diags.iter().next().unwrap().msg, "unterminated string");
        assert_eq!(tokens[0], Token::new(TokenKind::Str, "abc", Span::new(0, 4)));
    }

    #[test]
    fn string_ends_at_newline() {
        let (tokens, sess) = lex_src("\"abc\ndef");
        assert_eq!(sess.diags.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "abc");
        // Lexing resumes after the broken string.
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].lexeme, "def");
    }

    #[test]
    fn unknown_escape_keeps_byte() {
        let (tokens, sess) = lex_src(r#""a\qb""#);
        assert_eq!(sess.diags.len(), 1);
        assert_eq!(
            sess.diags.iter().next().unwrap().msg,
            "unknown character escape `q`"
        );
        assert_eq!(tokens[0].lexeme, "aqb");
    }

    #[test]
    fn lexing_is_idempotent() {
        let src = "fn main() { let x = 1 + 2 }";
        let (a, _) = lex_src(src);
        let (b, _) = lex_src(src);
        assert_eq!(a, b);
    }
}
