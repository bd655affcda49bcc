use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::bir::{BinOpKind, DeclId, Expr, Intrinsic, Program};
use crate::error::{Error, Result};
use crate::runtime::kernel::Kernel;
use crate::runtime::value::Value;

/// Result channel of a single evaluation step.
///
/// `return` and `break` travel as distinguished results that unwind
/// through block evaluation until they reach their boundary: a call
/// unwraps `Ret`, a `for` loop unwraps `Break`. They are never observable
/// as program values.
#[derive(Debug)]
enum Flow {
    /// An ordinary value.
    Val(Value),
    /// Unwinding toward the enclosing call.
    Ret(Value),
    /// Unwinding toward the enclosing loop.
    Break(Value),
}

/// Unwraps an ordinary value, propagating `return`/`break` unwinding to
/// the caller.
macro_rules! value {
    ($flow:expr) => {
        match $flow {
            Flow::Val(v) => v,
            flow => return Ok(flow),
        }
    };
}

/// Tree-walking evaluator.
///
/// Holds a stack of call frames, each mapping declaration identities to
/// values. Blocks do not push frames: scoping was fully resolved by the
/// binder, and because bindings are keyed by [`DeclId`] rather than by
/// name, shadowing within one frame never collides.
pub struct Evaluator<'a> {
    program: &'a Program,
    kernel: &'a mut dyn Kernel,
    frames: Vec<HashMap<DeclId, Value>>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator for a bound program.
    pub fn new(program: &'a Program, kernel: &'a mut dyn Kernel) -> Self {
        Evaluator {
            program,
            kernel,
            frames: Vec::new(),
        }
    }

    /// Locates `main` and evaluates its body in a fresh frame.
    ///
    /// A missing `main` is reported through the kernel, matching the
    /// behavior of the reference machine.
    pub fn run(&mut self) -> Result<Value> {
        let Some(main) = self.program.fns.get("main") else {
            self.kernel.println("no `main` function found");
            return Err(Error::MissingMain);
        };
        let main = main.clone();

        self.frames.push(HashMap::new());
        let flow = self.eval_expr(&main.body);
        self.frames.pop();

        match flow? {
            Flow::Val(v) | Flow::Ret(v) => Ok(v),
            Flow::Break(_) => unreachable!("break escaped `main`"),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Flow> {
        let value = match expr {
            Expr::Fn(sig) => Value::Fn(self.program.fns[sig.name.as_str()].clone()),
            Expr::Var(decl) => self.frame()[&decl.id].clone(),
            Expr::Integer(v) => Value::Int(*v),
            Expr::Boolean(v) => Value::Bool(*v),
            Expr::Str(v) => Value::Str(v.clone()),
            Expr::Binary { x, op, y } => {
                let x = value!(self.eval_expr(x)?);
                let y = value!(self.eval_expr(y)?);
                self.eval_bin_op(op.kind, x, y)?
            }
            Expr::Let { decl, init } => {
                let v = value!(self.eval_expr(init)?);
                self.frame_mut().insert(decl.id, v);
                Value::Unit
            }
            Expr::Assign { decl, value } => {
                let v = value!(self.eval_expr(value)?);
                self.frame_mut().insert(decl.id, v);
                Value::Unit
            }
            Expr::If { cond, then, els } => {
                let cond = value!(self.eval_expr(cond)?);
                let Value::Bool(cond) = cond else {
                    unreachable!("non-bool condition survived binding")
                };
                return if cond {
                    self.eval_expr(then)
                } else if let Some(els) = els {
                    self.eval_expr(els)
                } else {
                    Ok(Flow::Val(Value::Unit))
                };
            }
            Expr::Block { exprs } => {
                let mut last = Value::Unit;
                for expr in exprs {
                    // Return/break stop the block and unwind further.
                    last = value!(self.eval_expr(expr)?);
                }
                last
            }
            Expr::Call { callee, args } => return self.eval_call_expr(callee, args),
            Expr::Array { exprs } => {
                let mut elems = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    elems.push(value!(self.eval_expr(expr)?));
                }
                Value::array(elems)
            }
            Expr::Index { arr, index, .. } => {
                let arr = value!(self.eval_expr(arr)?);
                let index = value!(self.eval_expr(index)?);
                let (Value::Array(elems), Value::Int(i)) = (arr, index) else {
                    unreachable!("non-array indexing survived binding")
                };
                if i < 0 || i as usize >= elems.len() {
                    return Err(Error::IndexOutOfBounds {
                        index: i,
                        len: elems.len(),
                    });
                }
                elems[i as usize].clone()
            }
            Expr::For { body } => loop {
                match self.eval_expr(body)? {
                    Flow::Break(v) => break v,
                    ret @ Flow::Ret(_) => return Ok(ret),
                    Flow::Val(_) => {}
                }
            },
            Expr::Break { expr } => {
                let v = match expr {
                    Some(expr) => value!(self.eval_expr(expr)?),
                    None => Value::Unit,
                };
                return Ok(Flow::Break(v));
            }
            Expr::Return { expr } => {
                let v = match expr {
                    Some(expr) => value!(self.eval_expr(expr)?),
                    None => Value::Unit,
                };
                return Ok(Flow::Ret(v));
            }
            Expr::ClassLiteral { class, fields } => {
                let mut values = vec![Value::Unit; class.fields.len()];
                // Initializers run in literal order, landing in slots in
                // declaration order.
                for (idx, init) in fields {
                    values[*idx] = value!(self.eval_expr(init)?);
                }
                Value::Instance {
                    class: class.clone(),
                    fields: Rc::new(values),
                }
            }
            Expr::Field { expr, index, .. } => {
                let receiver = value!(self.eval_expr(expr)?);
                let Value::Instance { fields, .. } = receiver else {
                    unreachable!("non-instance field access survived binding")
                };
                fields[*index].clone()
            }
            Expr::Intrinsic(intrinsic) => Value::Intrinsic(*intrinsic),
            Expr::Err => return Err(Error::Erroneous),
        };

        Ok(Flow::Val(value))
    }

    fn eval_call_expr(&mut self, callee: &Expr, args: &[Expr]) -> Result<Flow> {
        let callee = value!(self.eval_expr(callee)?);

        match callee {
            Value::Intrinsic(Intrinsic::Println) => {
                let arg = value!(self.eval_expr(&args[0])?);
                self.kernel.println(&arg.to_string());
                Ok(Flow::Val(Value::Unit))
            }
            Value::Fn(def) => {
                let mut frame = HashMap::with_capacity(args.len());
                for (param, arg) in def.params.iter().zip(args) {
                    let v = value!(self.eval_expr(arg)?);
                    frame.insert(param.id, v);
                }

                trace!(function = %def.sig.name, "calling");
                self.frames.push(frame);
                let flow = self.eval_expr(&def.body);
                // The frame is popped on every exit path, error included.
                self.frames.pop();

                match flow? {
                    Flow::Ret(v) | Flow::Val(v) => Ok(Flow::Val(v)),
                    Flow::Break(_) => unreachable!("break escaped a function body"),
                }
            }
            other => unreachable!("call of non-function `{other}` survived binding"),
        }
    }

    fn eval_bin_op(&mut self, op: BinOpKind, x: Value, y: Value) -> Result<Value> {
        let value = match (x, y) {
            (Value::Int(x), Value::Int(y)) => match op {
                BinOpKind::Add => Value::Int(x.wrapping_add(y)),
                BinOpKind::Sub => Value::Int(x.wrapping_sub(y)),
                BinOpKind::Mul => Value::Int(x.wrapping_mul(y)),
                BinOpKind::Div => {
                    if y == 0 {
                        return Err(Error::DivisionByZero);
                    }
                    Value::Int(x.wrapping_div(y))
                }
                BinOpKind::Gt => Value::Bool(x > y),
                BinOpKind::Lt => Value::Bool(x < y),
                BinOpKind::Ge => Value::Bool(x >= y),
                BinOpKind::Le => Value::Bool(x <= y),
                BinOpKind::Eq => Value::Bool(x == y),
                BinOpKind::Ne => Value::Bool(x != y),
            },
            (Value::Bool(x), Value::Bool(y)) => match op {
                BinOpKind::Eq => Value::Bool(x == y),
                BinOpKind::Ne => Value::Bool(x != y),
                _ => unreachable!("non-equality boolean op survived binding"),
            },
            (Value::Str(x), Value::Str(y)) => match op {
                BinOpKind::Eq => Value::Bool(x == y),
                BinOpKind::Ne => Value::Bool(x != y),
                _ => unreachable!("non-equality string op survived binding"),
            },
            (x, y) => unreachable!("operands `{x}` and `{y}` survived binding"),
        };

        Ok(value)
    }

    fn frame(&self) -> &HashMap<DeclId, Value> {
        self.frames.last().expect("no active frame")
    }

    fn frame_mut(&mut self) -> &mut HashMap<DeclId, Value> {
        self.frames.last_mut().expect("no active frame")
    }
}
