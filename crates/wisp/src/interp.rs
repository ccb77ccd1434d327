//! The tree-walking evaluator.
//!
//! Evaluation is a single match over the node kinds, strictly left-to-right
//! and depth-first. Lvalue-capable nodes (identifiers, member accesses,
//! array indexings) evaluate to a [`Place`] — a live storage location — so
//! assignment writes through to the shared collection or variable slot,
//! while any read clones the value out.

use smallvec::SmallVec;

use crate::{
    error::{CodeLoc, Exception, RunResult},
    expressions::{Ast, BinOp, Expr, NodeId, UnOp},
    function::FnId,
    heap::{Heap, HeapId},
    io::PrintWriter,
    natives::{Natives, NativeFnId},
    scopes::Vars,
    value::{format_number_short, Value},
};

/// Per-activation evaluation context.
///
/// `forced_result` is the sticky sentinel set by `return`: while it is set,
/// every remaining evaluation in the activation short-circuits and yields
/// it. Calling a function installs a fresh context, so the short-circuit
/// never crosses a function boundary.
#[derive(Debug, Default)]
pub(crate) struct EvalCtx {
    forced_result: Option<Value>,
}

/// A live storage location.
#[derive(Debug, Clone)]
enum Place {
    /// A variable, by qualified name.
    Var(String),
    /// A member of a table.
    Member(HeapId, String),
    /// A slot of an array.
    Slot(HeapId, usize),
}

/// The outcome of evaluating a node: an owned value or a place that can be
/// read from and written through.
#[derive(Debug, Clone)]
enum Evaluated {
    Value(Value),
    Place(Place),
}

pub(crate) struct Interp<'a> {
    ast: &'a Ast,
    heap: &'a mut Heap,
    vars: &'a mut Vars,
    natives: &'a Natives,
    print: &'a mut dyn PrintWriter,
}

impl<'a> Interp<'a> {
    pub fn new(
        ast: &'a Ast,
        heap: &'a mut Heap,
        vars: &'a mut Vars,
        natives: &'a Natives,
        print: &'a mut dyn PrintWriter,
    ) -> Self {
        Self {
            ast,
            heap,
            vars,
            natives,
            print,
        }
    }

    /// Evaluates the program root in a fresh context.
    pub fn eval_root(&mut self) -> RunResult<()> {
        let mut ctx = EvalCtx::default();
        self.eval(self.ast.root(), &mut ctx)?;
        Ok(())
    }

    /// Invokes a callable value with already-evaluated arguments. This is
    /// the path the host uses to call script functions by name.
    pub fn call_value(
        &mut self,
        callee: Value,
        args: &[Value],
        location: CodeLoc,
    ) -> RunResult<Value> {
        match callee {
            Value::Fn(fn_id) => self.call_function(fn_id, args, location),
            Value::NativeFn(id) => self.call_native(id, args, location),
            other => Err(Exception::eval(
                location,
                format!("{} is not callable", other.type_name()),
            )),
        }
    }

    fn eval(&mut self, node_id: NodeId, ctx: &mut EvalCtx) -> RunResult<Evaluated> {
        if let Some(forced) = &ctx.forced_result {
            return Ok(Evaluated::Value(forced.clone()));
        }

        let ast = self.ast;
        let node = ast.get(node_id);
        let location = node.location;
        match &node.expr {
            Expr::Number(n) => Ok(Evaluated::Value(Value::Number(*n))),
            Expr::Str(s) => Ok(Evaluated::Value(Value::Str(s.clone()))),
            Expr::FnDecl(fn_id) => Ok(Evaluated::Value(Value::Fn(*fn_id))),

            Expr::Ident(name) => {
                let key = match self.vars.resolve(name) {
                    Some(key) => key,
                    None => {
                        // Unresolved names materialize in the innermost
                        // scope as undefined entries.
                        let key = self.vars.innermost_key(name);
                        self.vars.insert(key.clone(), Value::Undefined);
                        key
                    }
                };
                Ok(Evaluated::Place(Place::Var(key)))
            }

            Expr::Member { object, name } => {
                let object_value = self.eval_value(*object, ctx)?;
                let Value::Table(id) = object_value else {
                    return Err(Exception::eval(
                        location,
                        format!("only tables have members, not {}", object_value.type_name()),
                    ));
                };
                let Some(table) = self.heap.table_mut(id) else {
                    return Err(Exception::eval(location, "internal error: table storage missing"));
                };
                // The member handle is live; create the entry if absent.
                if !table.contains_key(name) {
                    table.insert(name.clone(), Value::Undefined);
                }
                Ok(Evaluated::Place(Place::Member(id, name.clone())))
            }

            Expr::TableMaker { members } => {
                let id = self.heap.alloc_table();
                for (name, init) in members {
                    let value = self.eval_value(*init, ctx)?;
                    if let Some(table) = self.heap.table_mut(id) {
                        table.insert(name.clone(), value);
                    }
                }
                Ok(Evaluated::Value(Value::Table(id)))
            }

            Expr::ArrayMaker { elements } => {
                let id = self.heap.alloc_array();
                for element in elements {
                    let value = self.eval_value(*element, ctx)?;
                    if let Some(slots) = self.heap.array_mut(id) {
                        slots.push(value);
                    }
                }
                Ok(Evaluated::Value(Value::Array(id)))
            }

            Expr::BinOp { op, left, right } => {
                let left_value = self.eval_value(*left, ctx)?;
                let right_value = self.eval_value(*right, ctx)?;
                apply_binop(*op, &left_value, &right_value, location).map(Evaluated::Value)
            }

            Expr::UnOp { op, operand } => {
                let value = self.eval_value(*operand, ctx)?;
                let Value::Number(n) = value else {
                    return Err(Exception::eval(
                        location,
                        format!("unary `{op}` expects a number, not {}", value.type_name()),
                    ));
                };
                let result = match op {
                    UnOp::Neg => -n,
                    UnOp::Plus => n,
                    UnOp::Not => {
                        if n == 0.0 {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                Ok(Evaluated::Value(Value::Number(result)))
            }

            Expr::Assign { target, value } => {
                // The left side is evaluated first so its structural side
                // effects (member creation, index checks) are visible to
                // the right side.
                let target_eval = self.eval(*target, ctx)?;
                let Evaluated::Place(place) = target_eval else {
                    return Err(Exception::eval(location, "cannot assign to this expression"));
                };
                let rhs = self.eval_value(*value, ctx)?;
                self.write_place(&place, rhs.clone(), location)?;
                Ok(Evaluated::Value(rhs))
            }

            Expr::Call { callee, args } => {
                let callee_value = self.eval_value(*callee, ctx)?;
                // Arguments evaluate in the caller's scope, in order,
                // before any callee scope is pushed.
                let mut arg_values: SmallVec<[Value; 8]> = SmallVec::new();
                for &arg in args {
                    arg_values.push(self.eval_value(arg, ctx)?);
                }
                self.call_value(callee_value, &arg_values, location)
                    .map(Evaluated::Value)
            }

            Expr::Index { array, index } => {
                let array_value = self.eval_value(*array, ctx)?;
                let Value::Array(id) = array_value else {
                    return Err(Exception::eval(
                        location,
                        format!("only arrays can be indexed, not {}", array_value.type_name()),
                    ));
                };
                let index_value = self.eval_value(*index, ctx)?;
                let Value::Number(n) = index_value else {
                    return Err(Exception::eval(
                        location,
                        format!("array index must be a number, not {}", index_value.type_name()),
                    ));
                };
                let idx = n as i64;
                let len = self.heap.array(id).map_or(0, Vec::len);
                if idx < 0 || idx as usize >= len {
                    return Err(Exception::eval(
                        location,
                        format!("array index {idx} out of range (len {len})"),
                    ));
                }
                Ok(Evaluated::Place(Place::Slot(id, idx as usize)))
            }

            Expr::StatementList { statements, own_scope } => {
                if *own_scope {
                    self.vars.push_scope(node_id, None);
                }
                let mut last = Evaluated::Value(Value::Undefined);
                let mut failure = None;
                for &statement in statements {
                    match self.eval(statement, ctx) {
                        Ok(value) => last = value,
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                if *own_scope {
                    self.vars.pop_scope()?;
                }
                match failure {
                    Some(err) => Err(err),
                    None => Ok(last),
                }
            }

            Expr::If { cond, then, or_else } => {
                let cond_value = self.eval_value(*cond, ctx)?;
                if cond_value.is_truthy() {
                    self.vars.push_scope(node_id, Some("true"));
                    let result = self.eval(*then, ctx);
                    self.vars.pop_scope()?;
                    result
                } else if let Some(or_else) = or_else {
                    self.vars.push_scope(node_id, Some("false"));
                    let result = self.eval(*or_else, ctx);
                    self.vars.pop_scope()?;
                    result
                } else {
                    Ok(Evaluated::Value(Value::Undefined))
                }
            }

            Expr::While { cond, body } => {
                self.vars.push_scope(node_id, None);
                let result = self.eval_while(*cond, *body, ctx);
                self.vars.pop_scope()?;
                result?;
                Ok(Evaluated::Value(Value::Undefined))
            }

            Expr::For { init, cond, post, body } => {
                self.vars.push_scope(node_id, None);
                let result = self.eval_for(*init, *cond, *post, *body, ctx);
                self.vars.pop_scope()?;
                result?;
                Ok(Evaluated::Value(Value::Undefined))
            }

            Expr::Return(value) => {
                let result = match value {
                    Some(expr) => self.eval_value(*expr, ctx)?,
                    None => Value::Undefined,
                };
                ctx.forced_result = Some(result.clone());
                Ok(Evaluated::Value(result))
            }

            Expr::Print(expr) => {
                let value = self.eval_value(*expr, ctx)?;
                let rendering = value.render(self.heap);
                self.print.write_str(&rendering);
                self.print.push('\n');
                Ok(Evaluated::Value(Value::Undefined))
            }
        }
    }

    /// Evaluates a node and reads the result out of its place, if any.
    fn eval_value(&mut self, node_id: NodeId, ctx: &mut EvalCtx) -> RunResult<Value> {
        let location = self.ast.get(node_id).location;
        let evaluated = self.eval(node_id, ctx)?;
        self.read(&evaluated, location)
    }

    fn read(&self, evaluated: &Evaluated, location: CodeLoc) -> RunResult<Value> {
        match evaluated {
            Evaluated::Value(value) => Ok(value.clone()),
            Evaluated::Place(place) => self.read_place(place, location),
        }
    }

    fn read_place(&self, place: &Place, location: CodeLoc) -> RunResult<Value> {
        match place {
            Place::Var(key) => Ok(self.vars.get(key).cloned().unwrap_or(Value::Undefined)),
            Place::Member(id, name) => {
                let Some(table) = self.heap.table(*id) else {
                    return Err(Exception::eval(location, "internal error: table storage missing"));
                };
                Ok(table.get(name).cloned().unwrap_or(Value::Undefined))
            }
            Place::Slot(id, index) => {
                let Some(elements) = self.heap.array(*id) else {
                    return Err(Exception::eval(location, "internal error: array storage missing"));
                };
                elements
                    .get(*index)
                    .cloned()
                    .ok_or_else(|| Exception::eval(location, format!("array index {index} out of range")))
            }
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, location: CodeLoc) -> RunResult<()> {
        match place {
            Place::Var(key) => {
                self.vars.insert(key.clone(), value);
                Ok(())
            }
            Place::Member(id, name) => {
                let Some(table) = self.heap.table_mut(*id) else {
                    return Err(Exception::eval(location, "internal error: table storage missing"));
                };
                table.insert(name.clone(), value);
                Ok(())
            }
            Place::Slot(id, index) => {
                let Some(elements) = self.heap.array_mut(*id) else {
                    return Err(Exception::eval(location, "internal error: array storage missing"));
                };
                // The array may have shrunk between indexing and the write.
                match elements.get_mut(*index) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(Exception::eval(
                        location,
                        format!("array index {index} out of range"),
                    )),
                }
            }
        }
    }

    fn eval_while(&mut self, cond: NodeId, body: NodeId, ctx: &mut EvalCtx) -> RunResult<()> {
        loop {
            if !self.eval_value(cond, ctx)?.is_nonzero_number() {
                return Ok(());
            }
            self.eval(body, ctx)?;
            // A `return` inside the body ends the loop so the enclosing
            // activation can unwind.
            if ctx.forced_result.is_some() {
                return Ok(());
            }
        }
    }

    fn eval_for(
        &mut self,
        init: NodeId,
        cond: NodeId,
        post: NodeId,
        body: NodeId,
        ctx: &mut EvalCtx,
    ) -> RunResult<()> {
        self.eval(init, ctx)?;
        loop {
            if !self.eval_value(cond, ctx)?.is_nonzero_number() {
                return Ok(());
            }
            self.eval(body, ctx)?;
            if ctx.forced_result.is_some() {
                return Ok(());
            }
            self.eval(post, ctx)?;
        }
    }

    fn call_function(&mut self, fn_id: FnId, args: &[Value], location: CodeLoc) -> RunResult<Value> {
        let ast = self.ast;
        let Some(function) = ast.function(fn_id) else {
            return Err(Exception::eval(
                location,
                format!("call to unknown function {}", fn_id.raw()),
            ));
        };
        if args.len() != function.params.len() {
            return Err(Exception::eval(
                location,
                format!(
                    "function takes {} argument(s), {} were given",
                    function.params.len(),
                    args.len()
                ),
            ));
        }
        // The activation scope is keyed by the function body, so recursion
        // nests distinct prefixes.
        self.vars.push_scope(function.body, None);
        for (param, value) in function.params.iter().zip(args) {
            let key = self.vars.innermost_key(param);
            self.vars.insert(key, value.clone());
        }
        let mut fn_ctx = EvalCtx::default();
        let body_result = self.eval(function.body, &mut fn_ctx);
        self.vars.pop_scope()?;
        body_result?;
        Ok(fn_ctx.forced_result.unwrap_or(Value::Undefined))
    }

    fn call_native(&mut self, id: NativeFnId, args: &[Value], location: CodeLoc) -> RunResult<Value> {
        let Some(callable) = self.natives.get(id) else {
            return Err(Exception::eval(location, "call to an unregistered native function"));
        };
        callable(&mut *self.heap, args).map_err(|message| {
            let name = self.natives.name(id).unwrap_or("native function");
            Exception::eval(location, format!("{name}: {message}"))
        })
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value, location: CodeLoc) -> RunResult<Value> {
    let value = match (op, left, right) {
        (_, Value::Number(a), Value::Number(b)) => match op {
            BinOp::Add => Value::Number(a + b),
            BinOp::Sub => Value::Number(a - b),
            BinOp::Mul => Value::Number(a * b),
            BinOp::Div => Value::Number(a / b),
            BinOp::Eq => bool_number(a == b),
            BinOp::NotEq => bool_number(a != b),
            BinOp::Less => bool_number(a < b),
            BinOp::LessEq => bool_number(a <= b),
            BinOp::Greater => bool_number(a > b),
            BinOp::GreaterEq => bool_number(a >= b),
        },
        (BinOp::Eq, Value::Str(a), Value::Str(b)) => bool_number(a == b),
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        (BinOp::Add, Value::Str(a), Value::Number(b)) => {
            Value::Str(format!("{a}{}", format_number_short(*b)))
        }
        (BinOp::Add, Value::Number(a), Value::Str(b)) => {
            Value::Str(format!("{}{b}", format_number_short(*a)))
        }
        _ => {
            return Err(Exception::eval(
                location,
                format!(
                    "unsupported operands for `{op}`: {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            ));
        }
    };
    Ok(value)
}

fn bool_number(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}
