use std::fmt;
use std::rc::Rc;

use crate::bir::{ClassDef, FnDef, Intrinsic};

/// Runtime value representation.
///
/// Values may be freely aliased: collections are reference-counted and
/// never mutated after construction, so sharing them between bindings is
/// a pointer copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    Str(String),
    /// Array of values (reference-counted).
    Array(Rc<Vec<Value>>),
    /// A user function.
    Fn(Rc<FnDef>),
    /// A class instance; fields are stored in declaration order.
    Instance {
        /// The instantiated class.
        class: Rc<ClassDef>,
        /// Field values, aligned with the class's field declarations.
        fields: Rc<Vec<Value>>,
    },
    /// A built-in callable provided by the host.
    Intrinsic(Intrinsic),
    /// The unit value, `()`.
    Unit,
}

impl Value {
    /// Creates an array value from a vector of values.
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(values))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Array(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            Value::Fn(_) => write!(f, "fn"),
            Value::Instance { class, fields } => {
                write!(f, "{}{{", class.name)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}")
            }
            Value::Intrinsic(intrinsic) => write!(f, "{intrinsic}"),
            Value::Unit => write!(f, "()"),
        }
    }
}
