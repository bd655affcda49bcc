//! The bound intermediate representation.
//!
//! The binder lowers the AST into this tree: identifier references are
//! replaced by shared handles to the [`VarDecl`] they resolve to, written
//! types are replaced by resolved [`Ty`] values, and every operator carries
//! the result type the type checker assigned to it. Use-sites share
//! identity with their binding site through [`DeclId`], which is what lets
//! the interpreter key call frames by declaration instead of by name.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::parser::ast;

/// Crate-unique identity of a variable declaration. Stable for the whole
/// run; frames key on it so shadowing needs no name mangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// Index of a class declaration in [`Program::classes`]. Class type
/// equality is `ClassId` equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// A bound variable declaration: a `let` binding, function parameter or
/// class field.
#[derive(Debug, PartialEq)]
pub struct VarDecl {
    /// Identity of this declaration.
    pub id: DeclId,
    /// Declared name.
    pub name: String,
    /// Resolved type.
    pub ty: Ty,
}

/// A bound function signature. The body lives in [`FnDef`]; keeping it
/// out of the signature lets call sites and recursion reference a function
/// through the globals map without building a cyclic graph.
#[derive(Debug, PartialEq)]
pub struct FnSig {
    /// Function name.
    pub name: String,
    /// Number of declared parameters, as written.
    pub param_count: usize,
    /// Declared return type.
    pub out: Ty,
}

/// A fully bound function: signature, parameter declarations and body.
#[derive(Debug, PartialEq)]
pub struct FnDef {
    /// The signature call sites resolve against.
    pub sig: Rc<FnSig>,
    /// Parameter declarations, in source order.
    pub params: Vec<Rc<VarDecl>>,
    /// Bound body. [`Expr::Err`] when binding rejected the function.
    pub body: Expr,
}

/// A bound class declaration.
#[derive(Debug, PartialEq)]
pub struct ClassDef {
    /// Identity of this class.
    pub id: ClassId,
    /// Class name.
    pub name: String,
    /// Field declarations, in declaration order.
    pub fields: Vec<Rc<VarDecl>>,
}

impl ClassDef {
    /// Returns the index of the field named `name`, if the class has one.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// The binder's output: every top-level definition, ready to interpret.
#[derive(Debug, Default)]
pub struct Program {
    /// Bound functions by name.
    pub fns: HashMap<String, Rc<FnDef>>,
    /// Bound classes, indexed by [`ClassId`].
    pub classes: Vec<Rc<ClassDef>>,
}

impl Program {
    /// Returns the class with the given id.
    pub fn class(&self, id: ClassId) -> &Rc<ClassDef> {
        &self.classes[id.0 as usize]
    }
}

/// A definition a name in scope can resolve to.
#[derive(Debug, Clone)]
pub enum Definition {
    /// A top-level function.
    Fn(Rc<FnSig>),
    /// A top-level class.
    Class(ClassId),
    /// A local binding or parameter.
    Var(Rc<VarDecl>),
    /// A built-in callable provided by the host.
    Intrinsic(Intrinsic),
}

/// Built-in callables provided by the host kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `println(string)`: write a line of program output.
    Println,
}

impl Intrinsic {
    /// Every intrinsic, for seeding the root scope.
    pub fn all() -> &'static [Intrinsic] {
        &[Intrinsic::Println]
    }

    /// The name the intrinsic is reachable under.
    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Println => "println",
        }
    }

    /// Number of arguments the intrinsic requires.
    pub fn arity(&self) -> usize {
        match self {
            Intrinsic::Println => 1,
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved type.
///
/// `Err` is the absorbing sentinel produced for failed binds: every check
/// involving it succeeds silently, which keeps one error from cascading
/// into a storm of follow-ups.
#[derive(Debug, Clone)]
pub enum Ty {
    /// Sentinel for failed binds.
    Err,
    /// Not yet known; only observable through empty array literals.
    Infer,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `string`
    Str,
    /// `[elem]`
    Array(Box<Ty>),
    /// A class type; equality is by declaration identity.
    Class {
        /// The declaration this type refers to.
        id: ClassId,
        /// Class name, for rendering.
        name: Rc<str>,
    },
    /// `()`
    Unit,
}

impl Ty {
    /// Returns true for the error sentinel.
    pub fn is_err(&self) -> bool {
        matches!(self, Ty::Err)
    }

    /// Returns true if the kinds of `self` and `other` match, ignoring any
    /// payload. This is the comparison used for array element types.
    fn kind_matches(&self, other: &Ty) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Arrays compare by element kind.
            (Ty::Array(a), Ty::Array(b)) => a.kind_matches(b),
            // Class types compare by declaration.
            (Ty::Class { id: a, .. }, Ty::Class { id: b, .. }) => a == b,
            _ => self.kind_matches(other),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Err | Ty::Infer => write!(f, "?"),
            Ty::Int => write!(f, "int"),
            Ty::Bool => write!(f, "bool"),
            Ty::Str => write!(f, "string"),
            Ty::Array(elem) => write!(f, "[{elem}]"),
            Ty::Class { name, .. } => write!(f, "{name}"),
            Ty::Unit => write!(f, "()"),
        }
    }
}

/// A type-checked binary operator: the operation to perform plus the
/// result type the typing table assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct BinOp {
    /// Which operation.
    pub kind: BinOpKind,
    /// Result type.
    pub ty: Ty,
}

/// Bound binary operations. Assignment never reaches here; the parser
/// already rewrote it into its own expression shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    /// `+` (addition)
    Add,
    /// `-` (subtraction)
    Sub,
    /// `*` (multiplication)
    Mul,
    /// `/` (division)
    Div,
    /// `>` (greater than)
    Gt,
    /// `<` (less than)
    Lt,
    /// `>=` (greater than or equal)
    Ge,
    /// `<=` (less than or equal)
    Le,
    /// `==` (equality)
    Eq,
    /// `!=` (not equal)
    Ne,
}

/// The binary-operator typing table: maps an AST operator and its operand
/// types to the bound operation and result type. Arithmetic is defined on
/// integers, comparisons on integers, equality on matching primitives; no
/// implicit coercions exist.
pub fn bind_bin_op(op: ast::BinOpKind, x: &Ty, y: &Ty) -> Option<BinOp> {
    use ast::BinOpKind as Op;

    let (kind, ty) = match (op, x, y) {
        (Op::Add, Ty::Int, Ty::Int) => (BinOpKind::Add, Ty::Int),
        (Op::Sub, Ty::Int, Ty::Int) => (BinOpKind::Sub, Ty::Int),
        (Op::Mul, Ty::Int, Ty::Int) => (BinOpKind::Mul, Ty::Int),
        (Op::Div, Ty::Int, Ty::Int) => (BinOpKind::Div, Ty::Int),

        (Op::Gt, Ty::Int, Ty::Int) => (BinOpKind::Gt, Ty::Bool),
        (Op::Lt, Ty::Int, Ty::Int) => (BinOpKind::Lt, Ty::Bool),
        (Op::Ge, Ty::Int, Ty::Int) => (BinOpKind::Ge, Ty::Bool),
        (Op::Le, Ty::Int, Ty::Int) => (BinOpKind::Le, Ty::Bool),

        (Op::Eq, Ty::Int, Ty::Int) => (BinOpKind::Eq, Ty::Bool),
        (Op::Eq, Ty::Bool, Ty::Bool) => (BinOpKind::Eq, Ty::Bool),
        (Op::Eq, Ty::Str, Ty::Str) => (BinOpKind::Eq, Ty::Bool),

        (Op::Ne, Ty::Int, Ty::Int) => (BinOpKind::Ne, Ty::Bool),
        (Op::Ne, Ty::Bool, Ty::Bool) => (BinOpKind::Ne, Ty::Bool),
        (Op::Ne, Ty::Str, Ty::Str) => (BinOpKind::Ne, Ty::Bool),

        _ => return None,
    };

    Some(BinOp { kind, ty })
}

/// Bound expressions. Shapes mirror the AST, but every node is resolved
/// and typed; spans are no longer needed past binding.
#[derive(Debug, PartialEq)]
pub enum Expr {
    /// A reference to a top-level function.
    Fn(Rc<FnSig>),
    /// A reference to a variable; shares identity with its declaration.
    Var(Rc<VarDecl>),
    /// An integer literal.
    Integer(i64),
    /// A boolean literal.
    Boolean(bool),
    /// A string literal.
    Str(String),
    /// A type-checked binary expression.
    Binary {
        /// Left operand.
        x: Box<Expr>,
        /// Bound operator with result type.
        op: BinOp,
        /// Right operand.
        y: Box<Expr>,
    },
    /// A let binding.
    Let {
        /// The introduced declaration.
        decl: Rc<VarDecl>,
        /// Initializer.
        init: Box<Expr>,
    },
    /// An assignment to a local binding.
    Assign {
        /// The assigned declaration.
        decl: Rc<VarDecl>,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// An if expression.
    If {
        /// Condition, typed `bool`.
        cond: Box<Expr>,
        /// Then branch.
        then: Box<Expr>,
        /// Optional else branch.
        els: Option<Box<Expr>>,
    },
    /// A block expression.
    Block {
        /// Child expressions in source order.
        exprs: Vec<Expr>,
    },
    /// A call of a function or intrinsic.
    Call {
        /// Callee expression.
        callee: Box<Expr>,
        /// Arguments in source order.
        args: Vec<Expr>,
    },
    /// An array literal.
    Array {
        /// Element expressions in source order.
        exprs: Vec<Expr>,
    },
    /// An indexing expression.
    Index {
        /// Receiver, typed as an array.
        arr: Box<Expr>,
        /// Index, typed `int`.
        index: Box<Expr>,
        /// The array's element type.
        elem_ty: Ty,
    },
    /// An unconditional loop.
    For {
        /// Loop body.
        body: Box<Expr>,
    },
    /// `break [expr]`
    Break {
        /// Optional loop result.
        expr: Option<Box<Expr>>,
    },
    /// `return [expr]`
    Return {
        /// Optional returned value.
        expr: Option<Box<Expr>>,
    },
    /// A class literal.
    ClassLiteral {
        /// The instantiated class.
        class: Rc<ClassDef>,
        /// `(declared-field index, initializer)` pairs in literal order.
        fields: Vec<(usize, Expr)>,
    },
    /// A field access on a class instance.
    Field {
        /// Receiver, typed as a class.
        expr: Box<Expr>,
        /// Index of the field in the class declaration.
        index: usize,
        /// The field's type.
        ty: Ty,
    },
    /// An intrinsic in callee position.
    Intrinsic(Intrinsic),
    /// Placeholder for a parse or bind error.
    Err,
}

impl Expr {
    /// Returns the type of this expression.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Fn(sig) => sig.out.clone(),
            Expr::Var(decl) => decl.ty.clone(),
            Expr::Integer(_) => Ty::Int,
            Expr::Boolean(_) => Ty::Bool,
            Expr::Str(_) => Ty::Str,
            Expr::Binary { op, .. } => op.ty.clone(),
            Expr::Let { .. } | Expr::Assign { .. } => Ty::Unit,
            Expr::If { then, .. } => then.ty(),
            Expr::Block { exprs } => match exprs.last() {
                Some(last) => last.ty(),
                None => Ty::Unit,
            },
            Expr::Call { callee, .. } => callee.ty(),
            Expr::Array { exprs } => {
                let elem = match exprs.first() {
                    Some(first) => first.ty(),
                    None => Ty::Infer,
                };
                Ty::Array(Box::new(elem))
            }
            Expr::Index { elem_ty, .. } => elem_ty.clone(),
            Expr::For { body } => body.ty(),
            Expr::Break { expr } | Expr::Return { expr } => match expr {
                Some(expr) => expr.ty(),
                None => Ty::Unit,
            },
            Expr::ClassLiteral { class, .. } => Ty::Class {
                id: class.id,
                name: Rc::from(class.name.as_str()),
            },
            Expr::Field { ty, .. } => ty.clone(),
            Expr::Intrinsic(_) => Ty::Unit,
            Expr::Err => Ty::Err,
        }
    }

    /// Returns true for the error placeholder.
    pub fn is_err(&self) -> bool {
        matches!(self, Expr::Err)
    }
}
