use crate::diagnostic::Diagnostic;
use crate::lexer::{lex, Token, TokenKind};
use crate::parser::ast::{
    BinOp, BinOpKind, Assoc, ClassDecl, Expr, ExprField, FnDecl, Ident, Item, Ty, TyKind, VarDecl,
};
use crate::session::Session;
use crate::span::Span;

/// Lexes and parses the session's source file into a list of items.
pub fn parse(sess: &mut Session) -> Vec<Item> {
    let tokens = lex(sess);
    Parser::new(sess, tokens).parse_items()
}

/// Hand-written recursive descent parser with precedence climbing for
/// binary operators.
///
/// The parser never aborts: a mismatch reports a diagnostic labelled
/// `here` at the current token, then either substitutes an error
/// placeholder node or skips a single token, so parsing always makes
/// forward progress and later stages always receive a complete tree.
pub struct Parser<'a> {
    sess: &'a mut Session,
    tokens: Vec<Token>,
    /// Index of the token after `tok`.
    pos: usize,
    /// Current token.
    tok: Token,
    /// Most recently eaten token.
    prev: Token,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a lexed token stream. The stream must be
    /// terminated by an [`TokenKind::Eof`] token.
    pub fn new(sess: &'a mut Session, tokens: Vec<Token>) -> Self {
        let tok = tokens[0].clone();
        Parser {
            sess,
            tokens,
            pos: 1,
            tok,
            prev: Token::new(TokenKind::Eof, "", Span::empty(0)),
        }
    }

    /// Parses items until end of input.
    pub fn parse_items(mut self) -> Vec<Item> {
        let mut items = Vec::new();

        while !self.tok.is(TokenKind::Eof) {
            if let Some(span) = self.eat(TokenKind::Fn) {
                items.push(self.parse_fn_decl(span));
            } else if let Some(span) = self.eat(TokenKind::Class) {
                items.push(self.parse_class_decl(span));
            } else {
                self.error("expected item");
                self.advance();
            }
        }

        items
    }

    /// Parses a function declaration, `fn` token already eaten.
    /// `fn ident([params]) [: ty] { exprs }`
    fn parse_fn_decl(&mut self, fn_span: Span) -> Item {
        let ident = self.parse_ident();
        if ident.is_none() {
            self.error(format!("expected function name, but got `{}`", self.tok.kind));
        }

        let Some(params) = self.parse_params() else {
            return Item::Err {
                span: fn_span.to(self.tok.span),
            };
        };

        let has_colon = self.eat(TokenKind::Colon).is_some();
        let out = if has_colon {
            let ty = self.parse_ty();
            if ty.is_none() {
                self.error("expected type after `:`");
            }
            ty
        } else {
            Some(Ty::unit(self.prev.span.end))
        };

        let body = self.parse_block_expr();
        let span = fn_span.to(body.span());

        match (ident, out) {
            (Some(ident), Some(out)) => Item::Fn(FnDecl {
                ident,
                params,
                out,
                body,
                span,
            }),
            _ => Item::Err { span },
        }
    }

    /// Parses a parenthesized, comma-separated parameter list.
    fn parse_params(&mut self) -> Option<Vec<VarDecl>> {
        let mut params = Vec::new();

        if self.eat(TokenKind::LeftParen).is_none() {
            self.error("expected opening delimiter `(`");
            return None;
        }

        while !self.tok.is_one_of(&[TokenKind::RightParen, TokenKind::Eof]) {
            let Some(ident) = self.parse_ident() else {
                self.error(format!("expected parameter name, but got `{}`", self.tok.kind));
                self.advance();
                continue;
            };

            if self.eat(TokenKind::Colon).is_none() {
                self.error("expected `:`");
            }

            let Some(ty) = self.parse_ty() else {
                self.error("expected parameter type");
                self.advance();
                continue;
            };

            params.push(VarDecl { ident, ty });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.eat(TokenKind::RightParen).is_none() {
            self.error("expected closing delimiter `)`");
            return None;
        }

        Some(params)
    }

    /// Parses a class declaration, `class` token already eaten.
    /// `class ident { field: ty, ... }`
    fn parse_class_decl(&mut self, class_span: Span) -> Item {
        let ident = self.parse_ident();
        if ident.is_none() {
            self.error(format!("expected class name, but got `{}`", self.tok.kind));
        }

        if self.eat(TokenKind::LeftBrace).is_none() {
            self.error("expected opening delimiter `{`");
            return Item::Err {
                span: class_span.to(self.tok.span),
            };
        }

        let mut fields = Vec::new();
        while !self.tok.is_one_of(&[TokenKind::RightBrace, TokenKind::Eof]) {
            let Some(field) = self.parse_ident() else {
                self.error(format!("expected field name, but got `{}`", self.tok.kind));
                self.advance();
                continue;
            };

            if self.eat(TokenKind::Colon).is_none() {
                self.error("expected `:`");
            }

            let Some(ty) = self.parse_ty() else {
                self.error("expected field type");
                self.advance();
                continue;
            };

            fields.push(VarDecl { ident: field, ty });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        let Some(close_span) = self.eat(TokenKind::RightBrace) else {
            self.error("expected closing delimiter `}`");
            return Item::Err {
                span: class_span.to(self.tok.span),
            };
        };

        let span = class_span.to(close_span);
        match ident {
            Some(ident) => Item::Class(ClassDecl {
                ident,
                fields,
                span,
            }),
            None => Item::Err { span },
        }
    }

    /// Parses a written type: `[elem]` or a named type.
    fn parse_ty(&mut self) -> Option<Ty> {
        if let Some(open_span) = self.eat(TokenKind::LeftBracket) {
            let elem = self.parse_ident()?;
            let close_span = match self.eat(TokenKind::RightBracket) {
                Some(span) => span,
                None => {
                    self.error("expected closing delimiter `]`");
                    elem.span
                }
            };
            return Some(Ty {
                span: open_span.to(close_span),
                kind: TyKind::Array(elem),
            });
        }

        let ident = self.parse_ident()?;
        Some(Ty {
            span: ident.span,
            kind: TyKind::Ident(ident),
        })
    }

    /// Parses an expression. Statement-like prefixes (`let`, `return`,
    /// `break`) are picked off first; everything else goes through the
    /// precedence climber.
    fn parse_expr(&mut self) -> Expr {
        if let Some(span) = self.eat(TokenKind::Let) {
            return self.parse_let_expr(span);
        }
        if let Some(span) = self.eat(TokenKind::Return) {
            let expr = self.parse_trailing_operand(span);
            let span = match &expr {
                Some(e) => span.to(e.span()),
                None => span,
            };
            return Expr::Return {
                expr: expr.map(Box::new),
                span,
            };
        }
        if let Some(span) = self.eat(TokenKind::Break) {
            let expr = self.parse_trailing_operand(span);
            let span = match &expr {
                Some(e) => span.to(e.span()),
                None => span,
            };
            return Expr::Break {
                expr: expr.map(Box::new),
                span,
            };
        }
        self.parse_prec_expr(0)
    }

    /// Parses the operand of a `return`/`break` if one is present: the next
    /// token must start on the same source line as the keyword and be able
    /// to begin an expression.
    fn parse_trailing_operand(&mut self, kw_span: Span) -> Option<Expr> {
        let kw_line = self.sess.file.line(kw_span.start);
        let tok_line = self.sess.file.line(self.tok.span.start);
        if kw_line == tok_line && self.tok.kind.begins_expr() {
            Some(self.parse_expr())
        } else {
            None
        }
    }

    /// Parses a let binding, `let` token already eaten.
    /// `let ident [: ty] = init`
    fn parse_let_expr(&mut self, let_span: Span) -> Expr {
        let ident = self.parse_ident();
        if ident.is_none() {
            self.error(format!(
                "expected identifier in let binding, but got `{}`",
                self.tok.kind
            ));
        }

        let has_colon = self.eat(TokenKind::Colon).is_some();
        let ty = if has_colon {
            let ty = self.parse_ty();
            if ty.is_none() {
                self.error("expected type after `:`");
            }
            ty
        } else {
            Some(Ty::infer(self.prev.span.end))
        };

        if self.eat(TokenKind::Assign).is_none() {
            self.error(format!("expected `=`, but got `{}`", self.tok.kind));
        }

        let init = self.parse_expr();

        match (ident, ty) {
            (Some(ident), Some(ty)) => {
                let span = let_span.to(init.span());
                Expr::Let {
                    decl: VarDecl { ident, ty },
                    init: Box::new(init),
                    span,
                }
            }
            _ => Expr::Err {
                span: let_span.to(init.span()),
            },
        }
    }

    /// Precedence climbing over binary operators.
    ///
    /// Parses a postfix expression, then keeps combining while the current
    /// token is a binary operator of precedence at least `min_prec`.
    /// Left-associative operators recurse one level tighter; the
    /// right-associative `=` recurses at its own level.
    fn parse_prec_expr(&mut self, min_prec: u8) -> Expr {
        let mut expr = self.parse_postfix_expr();

        while let Some(op) = BinOp::from_token(&self.tok) {
            let prec = op.kind.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();

            let next_min = match op.kind.assoc() {
                Assoc::Left => prec + 1,
                Assoc::Right => prec,
            };

            let rhs = self.parse_prec_expr(next_min);
            let span = expr.span().to(rhs.span());
            expr = match op.kind {
                BinOpKind::Assign => Expr::Assign {
                    x: Box::new(expr),
                    y: Box::new(rhs),
                    span,
                },
                _ => Expr::Binary {
                    x: Box::new(expr),
                    op,
                    y: Box::new(rhs),
                    span,
                },
            };
        }

        expr
    }

    /// Parses a bot expression followed by any number of postfix
    /// applications: `(args)` calls, `[i]` indexing and `.field` access.
    fn parse_postfix_expr(&mut self) -> Expr {
        let mut expr = self.parse_bot_expr();

        loop {
            if self.eat(TokenKind::LeftParen).is_some() {
                let mut args = Vec::new();
                while !self.tok.is_one_of(&[TokenKind::RightParen, TokenKind::Eof]) {
                    args.push(self.parse_expr());
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }

                let Some(close_span) = self.eat(TokenKind::RightParen) else {
                    self.error("expected closing delimiter `)`");
                    return Expr::Err {
                        span: expr.span().to(self.tok.span),
                    };
                };

                let span = expr.span().to(close_span);
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                };
            } else if self.eat(TokenKind::LeftBracket).is_some() {
                let index = self.parse_expr();
                let Some(close_span) = self.eat(TokenKind::RightBracket) else {
                    self.error("expected closing delimiter `]`");
                    return Expr::Err {
                        span: expr.span().to(self.tok.span),
                    };
                };

                let span = expr.span().to(close_span);
                expr = Expr::Index {
                    arr: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.eat(TokenKind::Dot).is_some() {
                let Some(ident) = self.parse_ident() else {
                    self.error(format!("expected field name, but got `{}`", self.tok.kind));
                    return Expr::Err {
                        span: expr.span().to(self.tok.span),
                    };
                };

                let span = expr.span().to(ident.span);
                expr = Expr::Field {
                    expr: Box::new(expr),
                    ident,
                    span,
                };
            } else {
                break;
            }
        }

        expr
    }

    /// Parses the atoms the precedence climber builds on: control forms,
    /// literals, array literals, identifiers and class literals.
    fn parse_bot_expr(&mut self) -> Expr {
        if let Some(span) = self.eat(TokenKind::If) {
            return self.parse_if_expr(span);
        }

        if let Some(span) = self.eat(TokenKind::For) {
            let body = self.parse_block_expr();
            let span = span.to(body.span());
            return Expr::For {
                body: Box::new(body),
                span,
            };
        }

        if self.eat(TokenKind::Number).is_some() {
            return Expr::Integer {
                lexeme: self.prev.lexeme.clone(),
                span: self.prev.span,
            };
        }

        if self.eat(TokenKind::Str).is_some() {
            return Expr::Str {
                value: self.prev.lexeme.clone(),
                span: self.prev.span,
            };
        }

        if let Some(span) = self.eat(TokenKind::True) {
            return Expr::Boolean { value: true, span };
        }

        if let Some(span) = self.eat(TokenKind::False) {
            return Expr::Boolean { value: false, span };
        }

        if let Some(open_span) = self.eat(TokenKind::LeftBracket) {
            return self.parse_array_expr(open_span);
        }

        if let Some(ident) = self.parse_ident() {
            if self.at_class_literal() {
                return self.parse_class_literal(ident);
            }
            return Expr::Ident(ident);
        }

        let span = self.tok.span;
        self.error(format!("expected expression, but got `{}`", self.tok.kind));
        self.advance();
        Expr::Err { span }
    }

    /// Parses an array literal, `[` already eaten.
    fn parse_array_expr(&mut self, open_span: Span) -> Expr {
        let mut exprs = Vec::new();
        while !self.tok.is_one_of(&[TokenKind::RightBracket, TokenKind::Eof]) {
            exprs.push(self.parse_expr());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        let Some(close_span) = self.eat(TokenKind::RightBracket) else {
            self.error("expected closing delimiter `]`");
            return Expr::Err {
                span: open_span.to(self.tok.span),
            };
        };

        Expr::Array {
            exprs,
            span: open_span.to(close_span),
        }
    }

    /// Returns true if the parser sits at a class literal body: the current
    /// token is `{` and it is followed by `ident :`. The lookahead keeps
    /// `if x { ... }` parsing `x` as a plain identifier.
    fn at_class_literal(&self) -> bool {
        self.tok.is(TokenKind::LeftBrace)
            && self.tokens.get(self.pos).is_some_and(|t| t.is(TokenKind::Ident))
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| t.is(TokenKind::Colon))
    }

    /// Parses a class literal, the class name already eaten.
    /// `Name { field: expr, ... }`
    fn parse_class_literal(&mut self, ident: Ident) -> Expr {
        // The caller checked for `{`.
        self.eat(TokenKind::LeftBrace);

        let mut fields = Vec::new();
        while !self.tok.is_one_of(&[TokenKind::RightBrace, TokenKind::Eof]) {
            let Some(field) = self.parse_ident() else {
                self.error(format!("expected field name, but got `{}`", self.tok.kind));
                self.advance();
                continue;
            };

            if self.eat(TokenKind::Colon).is_none() {
                self.error("expected `:`");
            }

            let expr = self.parse_expr();
            fields.push(ExprField { ident: field, expr });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        let Some(close_span) = self.eat(TokenKind::RightBrace) else {
            self.error("expected closing delimiter `}`");
            return Expr::Err {
                span: ident.span.to(self.tok.span),
            };
        };

        let span = ident.span.to(close_span);
        Expr::ClassLiteral {
            ident,
            fields,
            span,
        }
    }

    /// Parses `if cond { exprs } [else [if cond] { exprs }]`, the `if`
    /// token already eaten. `else if` recurses into another if-expression.
    fn parse_if_expr(&mut self, if_span: Span) -> Expr {
        let cond = self.parse_expr();
        let then = self.parse_block_expr();

        let mut span = if_span.to(then.span());
        let els = if self.eat(TokenKind::Else).is_some() {
            let els = if let Some(nested_span) = self.eat(TokenKind::If) {
                self.parse_if_expr(nested_span)
            } else {
                self.parse_block_expr()
            };
            span = if_span.to(els.span());
            Some(Box::new(els))
        } else {
            None
        };

        Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            els,
            span,
        }
    }

    /// Parses a block expression, `{ exprs }`. Expressions are parsed
    /// back-to-back without separators.
    fn parse_block_expr(&mut self) -> Expr {
        let Some(open_span) = self.eat(TokenKind::LeftBrace) else {
            self.error("expected opening delimiter `{`");
            return Expr::Err {
                span: self.tok.span,
            };
        };

        let mut exprs = Vec::new();
        while !self.tok.is_one_of(&[TokenKind::RightBrace, TokenKind::Eof]) {
            exprs.push(self.parse_expr());
        }

        let Some(close_span) = self.eat(TokenKind::RightBrace) else {
            self.error("expected closing delimiter `}`");
            return Expr::Err {
                span: open_span.to(self.tok.span),
            };
        };

        Expr::Block {
            exprs,
            span: open_span.to(close_span),
        }
    }

    /// Parses a single identifier, if the current token is one.
    fn parse_ident(&mut self) -> Option<Ident> {
        self.eat(TokenKind::Ident).map(|span| Ident {
            name: self.prev.lexeme.clone(),
            span,
        })
    }

    /// Advances past the current token and returns its span if it is of
    /// kind `kind`.
    fn eat(&mut self, kind: TokenKind) -> Option<Span> {
        if self.tok.is(kind) {
            let span = self.tok.span;
            self.advance();
            Some(span)
        } else {
            None
        }
    }

    /// Advances the parser to the next token.
    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.prev = std::mem::replace(&mut self.tok, self.tokens[self.pos].clone());
            self.pos += 1;
        }
    }

    /// Reports a diagnostic at the current token with a `here` label.
    fn error(&mut self, msg: impl Into<String>) {
        Diagnostic::builder(msg, self.tok.span)
            .label("here")
            .emit(&mut self.sess.diags);
    }
}
