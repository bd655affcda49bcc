//! Name resolution and type checking.
//!
//! The binder lowers parsed items into [`bir`] in two phases. Phase one
//! walks the top level and registers every global signature — intrinsics,
//! class shells, class fields, then function signatures — so bodies can
//! reference any global regardless of source order. Phase two binds each
//! function body inside a fresh scope seeded with its parameters.
//!
//! Every rule degrades instead of aborting: a failed bind reports one
//! diagnostic, produces [`bir::Expr::Err`], and later checks treat the
//! sentinel `err` type as compatible with everything so a single mistake
//! does not cascade.

mod scope;

pub use scope::Scope;

use std::rc::Rc;

use tracing::debug;

use crate::bir::{
    self, bind_bin_op, ClassDef, ClassId, DeclId, Definition, FnDef, FnSig, Intrinsic, Program, Ty,
    VarDecl,
};
use crate::diagnostic::Diagnostic;
use crate::parser::ast;
use crate::session::Session;
use crate::span::Span;

/// Binds parsed items into an executable program, reporting every name
/// and type error to the session's diagnostic bag.
pub fn bind(items: &[ast::Item], sess: &mut Session) -> Program {
    Binder::new(sess).bind_items(items)
}

struct Binder<'a> {
    sess: &'a mut Session,
    scope: Scope,
    /// Finalized class table, indexed by [`ClassId`].
    classes: Vec<Rc<ClassDef>>,
    next_decl: u32,
    /// Lexical `for` nesting depth of the expression being bound.
    loop_depth: u32,
    /// Declared return type of the function whose body is being bound.
    current_out: Ty,
}

impl<'a> Binder<'a> {
    fn new(sess: &'a mut Session) -> Self {
        Binder {
            sess,
            scope: Scope::new(),
            classes: Vec::new(),
            next_decl: 0,
            loop_depth: 0,
            current_out: Ty::Unit,
        }
    }

    fn bind_items(mut self, items: &[ast::Item]) -> Program {
        // Phase one: globals. Intrinsics first so user definitions may
        // shadow them, then class shells so class-typed fields and
        // parameters resolve regardless of declaration order.
        for intrinsic in Intrinsic::all() {
            self.scope
                .insert(intrinsic.name(), Definition::Intrinsic(*intrinsic));
        }

        let mut class_decls = Vec::new();
        for item in items {
            if let ast::Item::Class(decl) = item {
                let id = ClassId(class_decls.len() as u32);
                let shadowed = self
                    .scope
                    .insert(decl.ident.name.clone(), Definition::Class(id));
                if matches!(shadowed, Some(def) if !matches!(def, Definition::Intrinsic(_))) {
                    self.error(
                        decl.ident.span,
                        format!("class `{}` already exists", decl.ident.name),
                    );
                }
                class_decls.push(decl);
            }
        }

        for (idx, decl) in class_decls.iter().enumerate() {
            let class = self.bind_class_decl(ClassId(idx as u32), decl);
            self.classes.push(Rc::new(class));
        }

        let mut fn_decls = Vec::new();
        for item in items {
            if let ast::Item::Fn(decl) = item {
                let out = self.lookup_ty(&decl.out);
                let sig = Rc::new(FnSig {
                    name: decl.ident.name.clone(),
                    param_count: decl.params.len(),
                    out,
                });
                let shadowed = self
                    .scope
                    .insert(decl.ident.name.clone(), Definition::Fn(sig.clone()));
                if matches!(shadowed, Some(def) if !matches!(def, Definition::Intrinsic(_))) {
                    self.error(
                        decl.ident.span,
                        format!("function `{}` already exists", decl.ident.name),
                    );
                }
                fn_decls.push((decl, sig));
            }
        }

        // Phase two: bodies, each in a fresh scope over the globals.
        let mut fns = std::collections::HashMap::new();
        for (decl, sig) in fn_decls {
            let def = self.bind_fn_body(decl, sig);
            fns.insert(def.sig.name.clone(), Rc::new(def));
        }

        debug!(
            functions = fns.len(),
            classes = self.classes.len(),
            diagnostics = self.sess.diags.len(),
            "bound program"
        );

        Program {
            fns,
            classes: self.classes,
        }
    }

    /// Resolves the field list of a class declaration. Duplicate fields
    /// are reported and dropped; the surviving fields keep their
    /// declaration order.
    fn bind_class_decl(&mut self, id: ClassId, decl: &ast::ClassDecl) -> ClassDef {
        let mut fields: Vec<Rc<VarDecl>> = Vec::new();
        for field in &decl.fields {
            if fields.iter().any(|f| f.name == field.ident.name) {
                self.error(
                    field.ident.span,
                    format!("field `{}` already exists", field.ident.name),
                );
                continue;
            }
            let ty = self.lookup_ty(&field.ty);
            fields.push(self.fresh_decl(&field.ident.name, ty));
        }

        ClassDef {
            id,
            name: decl.ident.name.clone(),
            fields,
        }
    }

    /// Binds one function body: parameters into a fresh scope, then the
    /// body, then the declared-return-type check.
    fn bind_fn_body(&mut self, decl: &ast::FnDecl, sig: Rc<FnSig>) -> FnDef {
        self.current_out = sig.out.clone();
        self.loop_depth = 0;
        self.push_scope();

        let mut params = Vec::new();
        for param in &decl.params {
            let ty = self.lookup_ty(&param.ty);
            let var = self.fresh_decl(&param.ident.name, ty);
            let shadowed = self
                .scope
                .insert(param.ident.name.clone(), Definition::Var(var.clone()));
            if shadowed.is_some() {
                self.error(
                    param.ident.span,
                    format!("parameter `{}` already exists", param.ident.name),
                );
            }
            params.push(var);
        }

        let mut body = self.bind_expr(&decl.body);
        if !self.check_fn_return(decl, &sig.out, &body) {
            // Do not run a function whose body failed its return check.
            body = bir::Expr::Err;
        }

        self.pop_scope();

        FnDef { sig, params, body }
    }

    /// Checks the bound body against the declared return type. Returns
    /// false if the function must not run.
    fn check_fn_return(&mut self, decl: &ast::FnDecl, out: &Ty, body: &bir::Expr) -> bool {
        let body_ty = body.ty();
        if out.is_err() || body_ty.is_err() {
            return !body.is_err();
        }

        if let bir::Expr::Block { exprs } = body {
            if exprs.is_empty() && *out != Ty::Unit {
                self.error(
                    decl.out.span,
                    format!("expected `{out}`, but the body is empty"),
                );
                return false;
            }
        }

        if body_ty != *out {
            // Point at the annotation when there is one, else at the last
            // body expression.
            let span = if decl.out.span.is_empty() {
                match &decl.body {
                    ast::Expr::Block { exprs, .. } if !exprs.is_empty() => {
                        exprs.last().unwrap().span()
                    }
                    other => other.span(),
                }
            } else {
                decl.out.span
            };
            self.error(span, format!("expected `{out}`, but got `{body_ty}`"));
            return false;
        }

        true
    }

    fn bind_expr(&mut self, expr: &ast::Expr) -> bir::Expr {
        match expr {
            ast::Expr::Ident(ident) => self.bind_ident(ident),
            ast::Expr::Integer { lexeme, span } => match lexeme.parse::<i64>() {
                Ok(v) => bir::Expr::Integer(v),
                Err(_) => {
                    self.error(*span, format!("`{lexeme}` is not valid integer"));
                    bir::Expr::Err
                }
            },
            ast::Expr::Boolean { value, .. } => bir::Expr::Boolean(*value),
            ast::Expr::Str { value, .. } => bir::Expr::Str(value.clone()),
            ast::Expr::Binary { x, op, y, .. } => self.bind_binary_expr(x, *op, y),
            ast::Expr::Let { decl, init, .. } => self.bind_let_expr(decl, init),
            ast::Expr::Assign { x, y, .. } => self.bind_assign_expr(x, y),
            ast::Expr::If {
                cond,
                then,
                els,
                span,
            } => self.bind_if_expr(cond, then, els.as_deref(), *span),
            ast::Expr::Block { exprs, .. } => {
                self.push_scope();
                let exprs = exprs.iter().map(|e| self.bind_expr(e)).collect();
                self.pop_scope();
                bir::Expr::Block { exprs }
            }
            ast::Expr::Call { callee, args, span } => self.bind_call_expr(callee, args, *span),
            ast::Expr::Array { exprs, .. } => self.bind_array_expr(exprs),
            ast::Expr::Index { arr, index, .. } => self.bind_index_expr(arr, index),
            ast::Expr::For { body, .. } => {
                self.loop_depth += 1;
                let body = self.bind_expr(body);
                self.loop_depth -= 1;
                bir::Expr::For {
                    body: Box::new(body),
                }
            }
            ast::Expr::Break { expr, span } => self.bind_break_expr(expr.as_deref(), *span),
            ast::Expr::Return { expr, span } => self.bind_return_expr(expr.as_deref(), *span),
            ast::Expr::ClassLiteral {
                ident,
                fields,
                span,
            } => self.bind_class_literal(ident, fields, *span),
            ast::Expr::Field { expr, ident, .. } => self.bind_field_expr(expr, ident),
            ast::Expr::Err { .. } => bir::Expr::Err,
        }
    }

    fn bind_ident(&mut self, ident: &ast::Ident) -> bir::Expr {
        match self.scope.get(&ident.name).cloned() {
            Some(Definition::Var(decl)) => bir::Expr::Var(decl),
            Some(Definition::Fn(sig)) => bir::Expr::Fn(sig),
            Some(Definition::Intrinsic(intrinsic)) => bir::Expr::Intrinsic(intrinsic),
            Some(Definition::Class(_)) => {
                self.error(
                    ident.span,
                    format!("cannot use class `{}` as a value", ident.name),
                );
                bir::Expr::Err
            }
            None => {
                self.error(
                    ident.span,
                    format!(
                        "could not find anything named `{}` in this scope",
                        ident.name
                    ),
                );
                bir::Expr::Err
            }
        }
    }

    fn bind_binary_expr(&mut self, x: &ast::Expr, op: ast::BinOp, y: &ast::Expr) -> bir::Expr {
        let bx = self.bind_expr(x);
        let by = self.bind_expr(y);
        let (xt, yt) = (bx.ty(), by.ty());
        if xt.is_err() || yt.is_err() {
            return bir::Expr::Err;
        }

        match bind_bin_op(op.kind, &xt, &yt) {
            Some(bound) => bir::Expr::Binary {
                x: Box::new(bx),
                op: bound,
                y: Box::new(by),
            },
            None => {
                let msg = match op.kind {
                    ast::BinOpKind::Add => format!("cannot add `{xt}` to `{yt}`"),
                    ast::BinOpKind::Sub => format!("cannot subtract `{yt}` from `{xt}`"),
                    ast::BinOpKind::Mul => format!("cannot multiply `{xt}` by `{yt}`"),
                    ast::BinOpKind::Div => format!("cannot divide `{xt}` by `{yt}`"),
                    ast::BinOpKind::Gt
                    | ast::BinOpKind::Lt
                    | ast::BinOpKind::Ge
                    | ast::BinOpKind::Le
                    | ast::BinOpKind::Eq
                    | ast::BinOpKind::Ne => format!("cannot compare `{xt}` with `{yt}`"),
                    // The parser rewrites `=` into an assignment node.
                    ast::BinOpKind::Assign => unreachable!("assignment is not a binary op"),
                };
                self.error(op.span, msg);
                bir::Expr::Err
            }
        }
    }

    fn bind_let_expr(&mut self, decl: &ast::VarDecl, init: &ast::Expr) -> bir::Expr {
        let bound_init = self.bind_expr(init);
        let init_ty = bound_init.ty();

        let mut failed = false;
        let ty = match &decl.ty.kind {
            ast::TyKind::Infer => init_ty.clone(),
            _ => {
                let annotated = self.lookup_ty(&decl.ty);
                if annotated.is_err() {
                    failed = true;
                } else if !init_ty.is_err() && init_ty != annotated {
                    self.error(
                        init.span(),
                        format!("expected `{annotated}`, but got `{init_ty}`"),
                    );
                    failed = true;
                }
                annotated
            }
        };

        // Insert even on failure so later uses resolve instead of
        // cascading into unknown-name errors.
        let var = self.fresh_decl(&decl.ident.name, ty);
        self.scope
            .insert(decl.ident.name.clone(), Definition::Var(var.clone()));

        if failed {
            bir::Expr::Err
        } else {
            bir::Expr::Let {
                decl: var,
                init: Box::new(bound_init),
            }
        }
    }

    fn bind_assign_expr(&mut self, x: &ast::Expr, y: &ast::Expr) -> bir::Expr {
        let target = self.bind_expr(x);
        let value = self.bind_expr(y);

        match target {
            bir::Expr::Var(decl) => {
                let vt = value.ty();
                if !vt.is_err() && !decl.ty.is_err() && vt != decl.ty {
                    self.error(y.span(), format!("expected `{}`, but got `{vt}`", decl.ty));
                    return bir::Expr::Err;
                }
                bir::Expr::Assign {
                    decl,
                    value: Box::new(value),
                }
            }
            bir::Expr::Err => bir::Expr::Err,
            _ => {
                self.error(x.span(), "can only assign to identifiers for now".to_string());
                bir::Expr::Err
            }
        }
    }

    fn bind_if_expr(
        &mut self,
        cond: &ast::Expr,
        then: &ast::Expr,
        els: Option<&ast::Expr>,
        span: Span,
    ) -> bir::Expr {
        let bound_cond = self.bind_expr(cond);
        let bound_then = self.bind_expr(then);
        let bound_els = els.map(|e| self.bind_expr(e));

        let ct = bound_cond.ty();
        if ct.is_err() {
            return bir::Expr::Err;
        }
        if ct != Ty::Bool {
            self.error(cond.span(), format!("expected `bool`, but got `{ct}`"));
            return bir::Expr::Err;
        }

        if let Some(bound_els) = &bound_els {
            let (tt, et) = (bound_then.ty(), bound_els.ty());
            if !tt.is_err() && !et.is_err() && tt != et {
                self.error(span, "`if` and else have incompatible types".to_string());
                return bir::Expr::Err;
            }
        }

        bir::Expr::If {
            cond: Box::new(bound_cond),
            then: Box::new(bound_then),
            els: bound_els.map(Box::new),
        }
    }

    fn bind_call_expr(&mut self, callee: &ast::Expr, args: &[ast::Expr], span: Span) -> bir::Expr {
        let bound_callee = self.bind_expr(callee);

        let expected = match &bound_callee {
            bir::Expr::Fn(sig) => sig.param_count,
            bir::Expr::Intrinsic(intrinsic) => intrinsic.arity(),
            bir::Expr::Err => return bir::Expr::Err,
            _ => {
                self.error(callee.span(), "expected a function".to_string());
                return bir::Expr::Err;
            }
        };

        if args.len() != expected {
            let noun = if expected == 1 { "argument" } else { "arguments" };
            self.error(
                span,
                format!("expected {expected} {noun}, but got {}", args.len()),
            );
            return bir::Expr::Err;
        }

        let args = args.iter().map(|a| self.bind_expr(a)).collect();
        bir::Expr::Call {
            callee: Box::new(bound_callee),
            args,
        }
    }

    fn bind_array_expr(&mut self, exprs: &[ast::Expr]) -> bir::Expr {
        let bound: Vec<bir::Expr> = exprs.iter().map(|e| self.bind_expr(e)).collect();

        if let Some(first) = bound.first() {
            let first_ty = first.ty();
            for (ast_elem, elem) in exprs.iter().zip(&bound).skip(1) {
                let elem_ty = elem.ty();
                if !first_ty.is_err() && !elem_ty.is_err() && elem_ty != first_ty {
                    self.error(
                        ast_elem.span(),
                        format!("expected `{first_ty}`, but got `{elem_ty}`"),
                    );
                    return bir::Expr::Err;
                }
            }
        }

        bir::Expr::Array { exprs: bound }
    }

    fn bind_index_expr(&mut self, arr: &ast::Expr, index: &ast::Expr) -> bir::Expr {
        let bound_arr = self.bind_expr(arr);
        let bound_index = self.bind_expr(index);

        let elem_ty = match bound_arr.ty() {
            Ty::Array(elem) => *elem,
            Ty::Err => return bir::Expr::Err,
            other => {
                self.error(arr.span(), format!("cannot index into `{other}`"));
                return bir::Expr::Err;
            }
        };

        let it = bound_index.ty();
        if !it.is_err() && it != Ty::Int {
            self.error(index.span(), format!("expected `int`, but got `{it}`"));
            return bir::Expr::Err;
        }

        bir::Expr::Index {
            arr: Box::new(bound_arr),
            index: Box::new(bound_index),
            elem_ty,
        }
    }

    fn bind_break_expr(&mut self, expr: Option<&ast::Expr>, span: Span) -> bir::Expr {
        let bound = expr.map(|e| self.bind_expr(e));

        if self.loop_depth == 0 {
            self.error(span, "cannot `break` outside a `for` loop".to_string());
            return bir::Expr::Err;
        }

        bir::Expr::Break {
            expr: bound.map(Box::new),
        }
    }

    fn bind_return_expr(&mut self, expr: Option<&ast::Expr>, span: Span) -> bir::Expr {
        let bound = expr.map(|e| self.bind_expr(e));

        if matches!(self.current_out, Ty::Unit) {
            if let Some(bound) = &bound {
                let bt = bound.ty();
                if !bt.is_err() {
                    self.error(
                        span,
                        format!("expected this function to return `()`, but got `{bt}`"),
                    );
                    return bir::Expr::Err;
                }
            }
        }

        bir::Expr::Return {
            expr: bound.map(Box::new),
        }
    }

    fn bind_class_literal(
        &mut self,
        ident: &ast::Ident,
        fields: &[ast::ExprField],
        span: Span,
    ) -> bir::Expr {
        // Initializers are bound in literal order so their own errors
        // surface even when the class itself is broken.
        let bound: Vec<bir::Expr> = fields.iter().map(|f| self.bind_expr(&f.expr)).collect();

        let class = match self.scope.get(&ident.name).cloned() {
            Some(Definition::Class(id)) => self.classes[id.0 as usize].clone(),
            Some(_) => {
                self.error(ident.span, format!("`{}` is not a class", ident.name));
                return bir::Expr::Err;
            }
            None => {
                self.error(
                    ident.span,
                    format!(
                        "could not find anything named `{}` in this scope",
                        ident.name
                    ),
                );
                return bir::Expr::Err;
            }
        };

        let mut used = vec![false; class.fields.len()];
        let mut out_fields = Vec::new();
        let mut failed = false;

        for (field, bound_expr) in fields.iter().zip(bound) {
            let Some(idx) = class.field_index(&field.ident.name) else {
                self.error(
                    field.ident.span,
                    format!(
                        "could not find field `{}` in class `{}`",
                        field.ident.name, class.name
                    ),
                );
                failed = true;
                continue;
            };

            if used[idx] {
                self.error(
                    field.ident.span,
                    format!("field `{}` bound more than once", field.ident.name),
                );
                failed = true;
                continue;
            }
            used[idx] = true;

            let want = &class.fields[idx].ty;
            let got = bound_expr.ty();
            if !want.is_err() && !got.is_err() && got != *want {
                self.error(
                    field.expr.span(),
                    format!("expected `{want}`, but got `{got}`"),
                );
                failed = true;
            }

            out_fields.push((idx, bound_expr));
        }

        for (idx, field) in class.fields.iter().enumerate() {
            if !used[idx] {
                self.error(
                    span,
                    format!("missing field `{}` in initializer", field.name),
                );
                failed = true;
            }
        }

        if failed {
            bir::Expr::Err
        } else {
            bir::Expr::ClassLiteral {
                class,
                fields: out_fields,
            }
        }
    }

    fn bind_field_expr(&mut self, expr: &ast::Expr, ident: &ast::Ident) -> bir::Expr {
        let receiver = self.bind_expr(expr);

        match receiver.ty() {
            Ty::Class { id, .. } => {
                let class = self.classes[id.0 as usize].clone();
                match class.field_index(&ident.name) {
                    Some(idx) => bir::Expr::Field {
                        expr: Box::new(receiver),
                        index: idx,
                        ty: class.fields[idx].ty.clone(),
                    },
                    None => {
                        self.error(
                            ident.span,
                            format!(
                                "could not find field `{}` in class `{}`",
                                ident.name, class.name
                            ),
                        );
                        bir::Expr::Err
                    }
                }
            }
            Ty::Err => bir::Expr::Err,
            other => {
                self.error(
                    ident.span,
                    format!("cannot access field `{}` on `{other}`", ident.name),
                );
                bir::Expr::Err
            }
        }
    }

    /// Maps written type syntax to a resolved type, reporting unknown
    /// names. `infer` is passed through for the caller to resolve.
    fn lookup_ty(&mut self, ty: &ast::Ty) -> Ty {
        match &ty.kind {
            ast::TyKind::Infer => Ty::Infer,
            ast::TyKind::Unit => Ty::Unit,
            ast::TyKind::Ident(ident) => self.lookup_named_ty(ident),
            ast::TyKind::Array(elem) => Ty::Array(Box::new(self.lookup_named_ty(elem))),
        }
    }

    fn lookup_named_ty(&mut self, ident: &ast::Ident) -> Ty {
        match ident.name.as_str() {
            "int" => Ty::Int,
            "bool" => Ty::Bool,
            "string" => Ty::Str,
            name => match self.scope.get(name).cloned() {
                Some(Definition::Class(id)) => Ty::Class {
                    id,
                    name: Rc::from(name),
                },
                _ => {
                    self.error(
                        ident.span,
                        format!("cannot find type `{name}` in this scope"),
                    );
                    Ty::Err
                }
            },
        }
    }

    fn fresh_decl(&mut self, name: &str, ty: Ty) -> Rc<VarDecl> {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        Rc::new(VarDecl {
            id,
            name: name.to_string(),
            ty,
        })
    }

    fn push_scope(&mut self) {
        let outer = std::mem::take(&mut self.scope);
        self.scope = Scope::with_outer(outer);
    }

    fn pop_scope(&mut self) {
        self.scope = std::mem::take(&mut self.scope).into_outer();
    }

    fn error(&mut self, span: Span, msg: String) {
        Diagnostic::builder(msg, span)
            .label("here")
            .emit(&mut self.sess.diags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn bind_src(src: &str) -> (Program, Session) {
        let mut sess = Session::new("test", src);
        let items = parser::parse(&mut sess);
        let program = bind(&items, &mut sess);
        (program, sess)
    }

    fn msgs(sess: &Session) -> Vec<String> {
        sess.diags.iter().map(|d| d.msg.clone()).collect()
    }

    #[test]
    fn clean_program_binds_without_diagnostics() {
        let (program, sess) = bind_src(
            "fn add(a: int, b: int): int { return a + b }\n\
             fn main() { println(add(2, 40)) }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
        let main = &program.fns["main"];
        assert!(!main.body.is_err());
        assert_eq!(program.fns["add"].params.len(), 2);
    }

    #[test]
    fn globals_are_visible_regardless_of_order() {
        let (_, sess) = bind_src(
            "fn main() { println(helper()) }\n\
             fn helper(): int { 7 }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn unknown_name_is_reported() {
        let (_, sess) = bind_src("fn main() { println(x) }");
        assert_eq!(
            msgs(&sess),
            ["could not find anything named `x` in this scope"]
        );
    }

    #[test]
    fn oversized_integer_is_reported() {
        let (_, sess) = bind_src("fn main() { let x = 99999999999999999999 }");
        assert_eq!(msgs(&sess), ["`99999999999999999999` is not valid integer"]);
    }

    #[test]
    fn operator_mismatches_have_specific_messages() {
        let cases = [
            ("fn main() { let a = 1 + true }", "cannot add `int` to `bool`"),
            (
                "fn main() { let a = 1 - \"s\" }",
                "cannot subtract `string` from `int`",
            ),
            (
                "fn main() { let a = true * 2 }",
                "cannot multiply `bool` by `int`",
            ),
            (
                "fn main() { let a = \"s\" / 2 }",
                "cannot divide `string` by `int`",
            ),
            (
                "fn main() { let a = true < false }",
                "cannot compare `bool` with `bool`",
            ),
            (
                "fn main() { let a = 1 == true }",
                "cannot compare `int` with `bool`",
            ),
        ];
        for (src, want) in cases {
            let (_, sess) = bind_src(src);
            assert_eq!(msgs(&sess), [want], "for {src:?}");
        }
    }

    #[test]
    fn error_operands_do_not_cascade() {
        // `x` is unknown; the addition must not add a second diagnostic.
        let (_, sess) = bind_src("fn main() { let a = x + 1 }");
        assert_eq!(sess.diags.len(), 1);
    }

    #[test]
    fn let_annotation_mismatch() {
        let (_, sess) = bind_src("fn main() { let x: bool = 1 }");
        assert_eq!(msgs(&sess), ["expected `bool`, but got `int`"]);
    }

    #[test]
    fn let_unknown_annotation() {
        let (_, sess) = bind_src("fn main() { let x: Widget = 1 }");
        assert_eq!(msgs(&sess), ["cannot find type `Widget` in this scope"]);
    }

    #[test]
    fn shadowing_changes_the_type() {
        let (_, sess) = bind_src(
            "fn main() {\n\
             let x = 1\n\
             let y = x + 1\n\
             let x = true\n\
             let z = x == false\n\
             }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn assignment_requires_matching_type() {
        let (_, sess) = bind_src("fn main() { let x = 1 x = true }");
        assert_eq!(msgs(&sess), ["expected `int`, but got `bool`"]);
    }

    #[test]
    fn assignment_target_must_be_an_identifier() {
        let (_, sess) = bind_src("fn main() { 1 = 2 }");
        assert_eq!(msgs(&sess), ["can only assign to identifiers for now"]);
    }

    #[test]
    fn if_condition_must_be_bool() {
        let (_, sess) = bind_src("fn main() { if 1 { } }");
        assert_eq!(msgs(&sess), ["expected `bool`, but got `int`"]);
    }

    #[test]
    fn if_branches_must_agree() {
        let (_, sess) = bind_src("fn main() { let x = if true { 1 } else { false } }");
        assert_eq!(msgs(&sess), ["`if` and else have incompatible types"]);
    }

    #[test]
    fn call_argument_count_is_checked() {
        let (_, sess) = bind_src(
            "fn add(a: int, b: int): int { a + b }\n\
             fn main() { add(1) }",
        );
        assert_eq!(msgs(&sess), ["expected 2 arguments, but got 1"]);
    }

    #[test]
    fn println_takes_exactly_one_argument() {
        let (_, sess) = bind_src("fn main() { println(1, 2) }");
        assert_eq!(msgs(&sess), ["expected 1 argument, but got 2"]);
    }

    #[test]
    fn callee_must_be_a_function() {
        let (_, sess) = bind_src("fn main() { let x = 1 x(2) }");
        assert_eq!(msgs(&sess), ["expected a function"]);
    }

    #[test]
    fn duplicate_globals_are_reported() {
        let (_, sess) = bind_src("fn f() { } fn f() { }");
        assert_eq!(msgs(&sess), ["function `f` already exists"]);

        let (_, sess) = bind_src("class A { } class A { }");
        assert_eq!(msgs(&sess), ["class `A` already exists"]);
    }

    #[test]
    fn user_function_may_shadow_an_intrinsic() {
        let (_, sess) = bind_src("fn println(x: string) { } fn main() { }");
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn duplicate_parameter_is_reported() {
        let (_, sess) = bind_src("fn f(a: int, a: int) { } fn main() { }");
        assert_eq!(msgs(&sess), ["parameter `a` already exists"]);
    }

    #[test]
    fn duplicate_class_field_is_reported() {
        let (_, sess) = bind_src("class P { x: int, x: int } fn main() { }");
        assert_eq!(msgs(&sess), ["field `x` already exists"]);
    }

    #[test]
    fn break_outside_loop_is_reported() {
        let (_, sess) = bind_src("fn main() { break }");
        assert_eq!(msgs(&sess), ["cannot `break` outside a `for` loop"]);
    }

    #[test]
    fn break_in_nested_block_inside_for_is_allowed() {
        let (_, sess) = bind_src("fn main() { for { if true { break } } }");
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn break_after_a_loop_is_outside_it() {
        let (_, sess) = bind_src("fn main() { for { break } break }");
        assert_eq!(msgs(&sess), ["cannot `break` outside a `for` loop"]);
    }

    #[test]
    fn return_with_value_from_unit_function() {
        let (_, sess) = bind_src("fn main() { return 1 }");
        assert_eq!(
            msgs(&sess),
            ["expected this function to return `()`, but got `int`"]
        );
    }

    #[test]
    fn fn_body_type_must_match_declared_return() {
        let (program, sess) = bind_src("fn f(): int { true } fn main() { }");
        assert_eq!(msgs(&sess), ["expected `int`, but got `bool`"]);
        // The offending function must not run.
        assert!(program.fns["f"].body.is_err());
    }

    #[test]
    fn fn_with_return_type_and_empty_body() {
        let (_, sess) = bind_src("fn f(): int { } fn main() { }");
        assert_eq!(msgs(&sess), ["expected `int`, but the body is empty"]);
    }

    #[test]
    fn class_literal_binds_fields_in_any_order() {
        let (_, sess) = bind_src(
            "class Point { x: int, y: int }\n\
             fn main() { let p = Point { y: 2, x: 1 } }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn class_literal_missing_field() {
        let (_, sess) = bind_src(
            "class Point { x: int, y: int }\n\
             fn main() { let p = Point { x: 1 } }",
        );
        assert_eq!(msgs(&sess), ["missing field `y` in initializer"]);
    }

    #[test]
    fn class_literal_unknown_field() {
        let (_, sess) = bind_src(
            "class Point { x: int }\n\
             fn main() { let p = Point { x: 1, z: 2 } }",
        );
        assert_eq!(msgs(&sess), ["could not find field `z` in class `Point`"]);
    }

    #[test]
    fn class_literal_field_type_mismatch() {
        let (_, sess) = bind_src(
            "class Point { x: int }\n\
             fn main() { let p = Point { x: true } }",
        );
        assert_eq!(msgs(&sess), ["expected `int`, but got `bool`"]);
    }

    #[test]
    fn class_literal_of_non_class() {
        let (_, sess) = bind_src("fn f() { } fn main() { let p = f { x: 1 } }");
        assert_eq!(msgs(&sess), ["`f` is not a class"]);
    }

    #[test]
    fn field_access_resolves_declared_fields() {
        let (_, sess) = bind_src(
            "class Point { x: int, y: int }\n\
             fn main() { let p = Point { x: 1, y: 2 } println(p.x + p.y) }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn field_access_unknown_field() {
        let (_, sess) = bind_src(
            "class Point { x: int }\n\
             fn main() { let p = Point { x: 1 } println(p.z) }",
        );
        assert_eq!(msgs(&sess), ["could not find field `z` in class `Point`"]);
    }

    #[test]
    fn field_access_on_non_class() {
        let (_, sess) = bind_src("fn main() { let x = 1 println(x.y) }");
        assert_eq!(msgs(&sess), ["cannot access field `y` on `int`"]);
    }

    #[test]
    fn classes_may_reference_classes_declared_later() {
        let (_, sess) = bind_src(
            "class Line { a: Point, b: Point }\n\
             class Point { x: int, y: int }\n\
             fn main() { }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn array_elements_must_share_a_type() {
        let (_, sess) = bind_src("fn main() { let a = [1, true] }");
        assert_eq!(msgs(&sess), ["expected `int`, but got `bool`"]);
    }

    #[test]
    fn index_receiver_must_be_an_array() {
        let (_, sess) = bind_src("fn main() { let x = 1 let y = x[0] }");
        assert_eq!(msgs(&sess), ["cannot index into `int`"]);
    }

    #[test]
    fn index_must_be_an_integer() {
        let (_, sess) = bind_src("fn main() { let a = [1] let y = a[true] }");
        assert_eq!(msgs(&sess), ["expected `int`, but got `bool`"]);
    }

    #[test]
    fn index_result_has_the_element_type() {
        let (_, sess) = bind_src("fn main() { let a = [1, 2] let y = a[0] + 3 }");
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
    }

    #[test]
    fn clean_bind_produces_no_error_placeholders() {
        let (program, sess) = bind_src(
            "fn main() { let n = for { break 7 } println(n) }",
        );
        assert!(sess.diags.is_empty(), "diags: {:?}", msgs(&sess));
        assert!(!program.fns["main"].body.is_err());
    }
}
