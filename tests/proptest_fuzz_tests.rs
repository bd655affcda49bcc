//! Property-based fuzzing for the front end.
//!
//! These tests generate adversarial inputs and verify that:
//! 1. The lexer never panics and is idempotent on arbitrary input
//! 2. Token spans are in bounds and ordered
//! 3. The parser and binder never panic on token soup
//! 4. A bind without diagnostics leaves no error placeholders behind

use lue::{binder, lexer, parser, Session};
use proptest::prelude::*;

/// Arbitrary ASCII soup, including control characters the lexer treats
/// as unknown bytes.
fn arbitrary_source() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,300}").unwrap()
}

/// Streams of things that look like Lue tokens, glued with spaces. Much
/// more likely than raw soup to reach deep parser paths.
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(token_like(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn token_like() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("fn".to_string()),
        Just("class".to_string()),
        Just("let".to_string()),
        Just("if".to_string()),
        Just("else".to_string()),
        Just("for".to_string()),
        Just("break".to_string()),
        Just("return".to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("main".to_string()),
        Just("x".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(":".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("!=".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        Just("\"s\"".to_string()),
        Just("int".to_string()),
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
    ]
}

proptest! {
    #[test]
    fn lexing_never_panics_and_is_idempotent(src in arbitrary_source()) {
        let mut first = Session::new("fuzz", src.clone());
        let a = lexer::lex(&mut first);

        let mut second = Session::new("fuzz", src);
        let b = lexer::lex(&mut second);

        prop_assert_eq!(a, b);
        prop_assert_eq!(first.diags.len(), second.diags.len());
    }

    #[test]
    fn token_spans_are_in_bounds_and_ordered(src in arbitrary_source()) {
        let len = src.len();
        let mut sess = Session::new("fuzz", src);
        let tokens = lexer::lex(&mut sess);

        let mut prev_end = 0;
        for token in &tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.end <= len);
            prop_assert!(token.span.start >= prev_end);
            prev_end = token.span.end;
        }

        // The stream always ends with an empty eof span at the end.
        let eof = tokens.last().unwrap();
        prop_assert_eq!(eof.kind, lexer::TokenKind::Eof);
        prop_assert_eq!(eof.span, lue::Span::empty(len));
    }

    #[test]
    fn front_end_never_panics_on_raw_soup(src in arbitrary_source()) {
        let mut sess = Session::new("fuzz", src);
        let items = parser::parse(&mut sess);
        let _ = binder::bind(&items, &mut sess);
    }

    #[test]
    fn front_end_never_panics_on_token_soup(src in token_soup()) {
        let mut sess = Session::new("fuzz", src);
        let items = parser::parse(&mut sess);
        let _ = binder::bind(&items, &mut sess);
    }

    #[test]
    fn clean_binds_leave_no_error_placeholders(src in token_soup()) {
        let mut sess = Session::new("fuzz", src);
        let items = parser::parse(&mut sess);
        let program = binder::bind(&items, &mut sess);

        if sess.diags.is_empty() {
            for def in program.fns.values() {
                prop_assert!(!def.body.is_err());
            }
        }
    }
}
