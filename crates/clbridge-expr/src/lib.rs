//! The bridge worker's built-in evaluation engine.
//!
//! A small expression language with a familiar surface: `None`, `True`
//! and `False`, integer and float literals, strings, `(…)` tuples,
//! `[…]` lists, `{…}` maps, arithmetic with numeric promotion, `#`
//! comments, and `name = value` assignment statements against the
//! session's persistent namespace. A handful of built-in functions
//! cover value construction and the host callback bridge.

pub mod error;
pub mod lexer;
pub mod parser;

use std::io::Write;

use tracing::trace;

use clbridge_session::{CallArgs, Engine, EngineError, EvalContext};
use clbridge_value::{encode, NdArray, Value};

pub use error::ExprError;
pub use parser::{parse_expression, parse_program, BinOp, Expr, Stmt};

/// [`Engine`] over the built-in expression language.
///
/// Stateless: all persistence lives in the session's namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEngine;

impl ExprEngine {
    pub fn new() -> Self {
        ExprEngine
    }

    fn eval_expr(&mut self, expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Value, EngineError> {
        match expr {
            Expr::None => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Name(name) => ctx
                .ns
                .get(name)
                .ok_or_else(|| fail(ExprError::Undefined(name.clone()))),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items, ctx)?)),
            Expr::List(items) => Ok(Value::List(self.eval_all(items, ctx)?)),
            Expr::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval_expr(key, ctx)?;
                    let value = self.eval_expr(value, ctx)?;
                    pairs.push((key, value));
                }
                Ok(Value::Mapping(pairs))
            }
            Expr::Neg(inner) => {
                let value = self.eval_expr(inner, ctx)?;
                negate(value).map_err(fail)
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval_expr(lhs, ctx)?;
                let rhs = self.eval_expr(rhs, ctx)?;
                binary(*op, lhs, rhs).map_err(fail)
            }
            Expr::Call {
                target,
                args,
                kwargs,
            } => {
                let positional = self.eval_all(args, ctx)?;
                let mut keywords = Vec::with_capacity(kwargs.len());
                for (name, value) in kwargs {
                    keywords.push((name.clone(), self.eval_expr(value, ctx)?));
                }
                self.call_builtin(
                    target,
                    CallArgs {
                        positional,
                        keywords,
                    },
                    ctx,
                )
            }
        }
    }

    fn eval_all(
        &mut self,
        exprs: &[Expr],
        ctx: &mut EvalContext<'_>,
    ) -> Result<Vec<Value>, EngineError> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval_expr(expr, ctx)?);
        }
        Ok(values)
    }

    fn call_builtin(
        &mut self,
        target: &str,
        args: CallArgs,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Value, EngineError> {
        match target {
            "callback" => self.callback(args, ctx),
            "Symbol" => one_string("Symbol", &args)
                .map(Value::Symbol)
                .map_err(fail),
            "complex" => complex(&args).map_err(fail),
            "array" => array(&args).map_err(fail),
            "str" => one_arg("str", &args).map(stringify).map_err(fail),
            "len" => one_arg("len", &args).and_then(length).map_err(fail),
            "sum" => one_arg("sum", &args).and_then(sum).map_err(fail),
            "print" => self.print(&args, ctx),
            other => Err(fail(ExprError::UnknownFunction(other.to_string()))),
        }
    }

    /// `callback(name, args…, kw=…)`: call a host-side function and
    /// block for its result.
    fn callback(&mut self, args: CallArgs, ctx: &mut EvalContext<'_>) -> Result<Value, EngineError> {
        let ident = match args.positional.first() {
            Some(Value::Str(name)) => name.clone(),
            Some(Value::Symbol(name)) => name.clone(),
            Some(other) => {
                return Err(fail(ExprError::bad_arguments(
                    "callback",
                    format!("function name must be a string or symbol, got {}", other.kind()),
                )));
            }
            None => {
                return Err(fail(ExprError::bad_arguments(
                    "callback",
                    "missing function name",
                )));
            }
        };
        trace!(%ident, "callback builtin");
        let value = ctx
            .host
            .invoke(self, &ident, &args.positional[1..], &args.keywords)?;
        Ok(value)
    }

    fn print(&mut self, args: &CallArgs, ctx: &mut EvalContext<'_>) -> Result<Value, EngineError> {
        let rendered: Vec<String> = args
            .positional
            .iter()
            .map(|v| match v {
                Value::Str(s) => s.clone(),
                other => encode(other),
            })
            .collect();
        writeln!(ctx.out, "{}", rendered.join(" "))
            .map_err(|err| EngineError::failure(err.to_string()))?;
        Ok(Value::Null)
    }
}

impl Engine for ExprEngine {
    fn eval(&mut self, code: &str, ctx: &mut EvalContext<'_>) -> Result<Value, EngineError> {
        let expr = parse_expression(code).map_err(fail)?;
        self.eval_expr(&expr, ctx)
    }

    fn exec(&mut self, code: &str, ctx: &mut EvalContext<'_>) -> Result<(), EngineError> {
        let stmts = parse_program(code).map_err(fail)?;
        trace!(statements = stmts.len(), "executing program");
        for stmt in &stmts {
            match stmt {
                Stmt::Assign(name, expr) => {
                    let value = self.eval_expr(expr, ctx)?;
                    ctx.ns.set(name.as_str(), value);
                }
                Stmt::Expr(expr) => {
                    self.eval_expr(expr, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn call(
        &mut self,
        target: &str,
        args: CallArgs,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Value, EngineError> {
        self.call_builtin(target, args, ctx)
    }
}

fn fail(err: ExprError) -> EngineError {
    EngineError::failure(err.to_string())
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn negate(value: Value) -> Result<Value, ExprError> {
    match value {
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(ExprError::Overflow("unary minus")),
        Value::Float(x) => Ok(Value::Float(-x)),
        other => Err(ExprError::BadUnary(other.kind())),
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return int_binary(op, *a, *b);
    }
    if let (Some(a), Some(b)) = (as_float(&lhs), as_float(&rhs)) {
        return float_binary(op, a, b);
    }
    if op == BinOp::Add {
        match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => return Ok(Value::Str(a + &b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                return Ok(Value::List(a));
            }
            (Value::Tuple(mut a), Value::Tuple(b)) => {
                a.extend(b);
                return Ok(Value::Tuple(a));
            }
            (lhs, rhs) => {
                return Err(ExprError::BadOperands {
                    op: op.symbol(),
                    lhs: lhs.kind(),
                    rhs: rhs.kind(),
                });
            }
        }
    }
    Err(ExprError::BadOperands {
        op: op.symbol(),
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    })
}

fn int_binary(op: BinOp, a: i64, b: i64) -> Result<Value, ExprError> {
    match op {
        BinOp::Add => a.checked_add(b).map(Value::Int).ok_or(ExprError::Overflow("+")),
        BinOp::Sub => a.checked_sub(b).map(Value::Int).ok_or(ExprError::Overflow("-")),
        BinOp::Mul => a.checked_mul(b).map(Value::Int).ok_or(ExprError::Overflow("*")),
        // Division is always float-valued.
        BinOp::Div => float_binary(op, a as f64, b as f64),
    }
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Result<Value, ExprError> {
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                Err(ExprError::DivisionByZero)
            } else {
                Ok(Value::Float(a / b))
            }
        }
    }
}

fn one_arg(func: &'static str, args: &CallArgs) -> Result<Value, ExprError> {
    if !args.keywords.is_empty() {
        return Err(ExprError::bad_arguments(func, "takes no keyword arguments"));
    }
    match args.positional.as_slice() {
        [value] => Ok(value.clone()),
        other => Err(ExprError::bad_arguments(
            func,
            format!("expected 1 argument, got {}", other.len()),
        )),
    }
}

fn one_string(func: &'static str, args: &CallArgs) -> Result<String, ExprError> {
    match one_arg(func, args)? {
        Value::Str(s) => Ok(s),
        other => Err(ExprError::bad_arguments(
            func,
            format!("expected a string, got {}", other.kind()),
        )),
    }
}

/// `str(x)`: the string itself for strings, the host literal otherwise.
fn stringify(value: Value) -> Value {
    match value {
        Value::Str(s) => Value::Str(s),
        other => Value::Str(encode(&other)),
    }
}

fn length(value: Value) -> Result<Value, ExprError> {
    let len = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Mapping(entries) => entries.len(),
        Value::Array(array) => array.elements().len(),
        other => {
            return Err(ExprError::bad_arguments(
                "len",
                format!("{} has no length", other.kind()),
            ));
        }
    };
    Ok(Value::Int(len as i64))
}

fn sum(value: Value) -> Result<Value, ExprError> {
    let items = match &value {
        Value::List(items) | Value::Tuple(items) => items.as_slice(),
        other => {
            return Err(ExprError::bad_arguments(
                "sum",
                format!("expected a sequence, got {}", other.kind()),
            ));
        }
    };

    let mut acc = Value::Int(0);
    for item in items {
        match item {
            Value::Int(_) | Value::Float(_) => {
                acc = binary(BinOp::Add, acc, item.clone())?;
            }
            other => {
                return Err(ExprError::bad_arguments(
                    "sum",
                    format!("sequence contains {}", other.kind()),
                ));
            }
        }
    }
    Ok(acc)
}

fn complex(args: &CallArgs) -> Result<Value, ExprError> {
    if !args.keywords.is_empty() {
        return Err(ExprError::bad_arguments(
            "complex",
            "takes no keyword arguments",
        ));
    }
    match args.positional.as_slice() {
        [re, im] => match (as_float(re), as_float(im)) {
            (Some(re), Some(im)) => Ok(Value::Complex { re, im }),
            _ => Err(ExprError::bad_arguments(
                "complex",
                format!("expected numbers, got {} and {}", re.kind(), im.kind()),
            )),
        },
        other => Err(ExprError::bad_arguments(
            "complex",
            format!("expected 2 arguments, got {}", other.len()),
        )),
    }
}

/// `array(nested)`: derive the shape from the nesting of a sequence
/// literal and flatten row-major, rejecting ragged rows.
fn array(args: &CallArgs) -> Result<Value, ExprError> {
    let source = one_arg("array", args)?;

    let mut shape = Vec::new();
    let mut cursor = &source;
    loop {
        match cursor {
            Value::List(items) | Value::Tuple(items) => {
                shape.push(items.len());
                match items.first() {
                    Some(first) => cursor = first,
                    None => break,
                }
            }
            _ => break,
        }
    }

    let mut data = Vec::new();
    flatten(&source, &shape, 0, &mut data)?;
    Ok(Value::Array(NdArray::new(shape, data)?))
}

fn flatten(value: &Value, shape: &[usize], depth: usize, out: &mut Vec<Value>) -> Result<(), ExprError> {
    if depth == shape.len() {
        out.push(value.clone());
        return Ok(());
    }
    match value {
        Value::List(items) | Value::Tuple(items) if items.len() == shape[depth] => {
            for item in items {
                flatten(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        _ => Err(ExprError::bad_arguments(
            "array",
            "rows are ragged or not sequences",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clbridge_session::{Host, HostError, Namespace};

    /// Host that records callback requests and answers from a script.
    #[derive(Default)]
    struct ScriptedHost {
        calls: Vec<(String, Vec<Value>, Vec<(String, Value)>)>,
        replies: Vec<Value>,
    }

    impl Host for ScriptedHost {
        fn invoke(
            &mut self,
            _engine: &mut dyn Engine,
            ident: &str,
            positional: &[Value],
            keywords: &[(String, Value)],
        ) -> Result<Value, HostError> {
            self.calls
                .push((ident.to_string(), positional.to_vec(), keywords.to_vec()));
            Ok(self.replies.remove(0))
        }
    }

    struct Fixture {
        engine: ExprEngine,
        ns: Namespace,
        host: ScriptedHost,
        out: Vec<u8>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                engine: ExprEngine::new(),
                ns: Namespace::new(),
                host: ScriptedHost::default(),
                out: Vec::new(),
            }
        }

        fn eval(&mut self, code: &str) -> Result<Value, EngineError> {
            let mut ctx = EvalContext {
                ns: self.ns.clone(),
                host: &mut self.host,
                out: &mut self.out,
            };
            self.engine.eval(code, &mut ctx)
        }

        fn exec(&mut self, code: &str) -> Result<(), EngineError> {
            let mut ctx = EvalContext {
                ns: self.ns.clone(),
                host: &mut self.host,
                out: &mut self.out,
            };
            self.engine.exec(code, &mut ctx)
        }
    }

    fn eval(code: &str) -> Value {
        Fixture::new().eval(code).unwrap()
    }

    fn eval_err(code: &str) -> String {
        match Fixture::new().eval(code).unwrap_err() {
            EngineError::Failure(message) => message,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn literals() {
        assert_eq!(eval("None"), Value::Null);
        assert_eq!(eval("True"), Value::Bool(true));
        assert_eq!(eval("42"), Value::Int(42));
        assert_eq!(eval("2.5"), Value::Float(2.5));
        assert_eq!(eval("\"hi\""), Value::Str("hi".to_string()));
    }

    #[test]
    fn arithmetic_promotes_to_float() {
        assert_eq!(eval("1 + 2"), Value::Int(3));
        assert_eq!(eval("1 + 2.0"), Value::Float(3.0));
        assert_eq!(eval("2 * 3 + 1"), Value::Int(7));
        assert_eq!(eval("-(1 + 2)"), Value::Int(-3));
    }

    #[test]
    fn division_is_float_valued() {
        assert_eq!(eval("7 / 2"), Value::Float(3.5));
        assert_eq!(eval_err("1 / 0"), "division by zero");
    }

    #[test]
    fn integer_overflow_reported() {
        let mut fixture = Fixture::new();
        fixture.ns.set("big", Value::Int(i64::MAX));
        let err = fixture.eval("big + 1").unwrap_err();
        assert!(matches!(err, EngineError::Failure(m) if m.contains("overflow")));
    }

    #[test]
    fn concatenation() {
        assert_eq!(eval("\"a\" + \"b\""), Value::Str("ab".to_string()));
        assert_eq!(
            eval("[1] + [2]"),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            eval("(1,) + (2,)"),
            Value::Tuple(vec![Value::Int(1), Value::Int(2)])
        );
        assert!(eval_err("[1] + (2,)").contains("unsupported operands"));
    }

    #[test]
    fn collections_evaluate_elementwise() {
        assert_eq!(
            eval("[1 + 1, 3]"),
            Value::List(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            eval("{\"k\": 1 + 1}"),
            Value::Mapping(vec![(Value::Str("k".into()), Value::Int(2))])
        );
    }

    #[test]
    fn undefined_name_reported() {
        assert_eq!(eval_err("nope"), "name \"nope\" is not defined");
    }

    #[test]
    fn exec_assigns_into_namespace() {
        let mut fixture = Fixture::new();
        fixture.exec("x = 2\ny = x * 3").unwrap();
        assert_eq!(fixture.ns.get("y"), Some(Value::Int(6)));
        assert_eq!(fixture.eval("y + 1").unwrap(), Value::Int(7));
    }

    #[test]
    fn exec_with_comments_and_semicolons() {
        let mut fixture = Fixture::new();
        fixture.exec("# setup\na = 1; b = a + 1 # done").unwrap();
        assert_eq!(fixture.ns.get("b"), Some(Value::Int(2)));
    }

    #[test]
    fn builtin_symbol() {
        assert_eq!(eval("Symbol(\"pi\")"), Value::Symbol("pi".to_string()));
        assert!(eval_err("Symbol(1)").contains("expected a string"));
    }

    #[test]
    fn builtin_complex() {
        assert_eq!(eval("complex(3, 4)"), Value::Complex { re: 3.0, im: 4.0 });
        assert_eq!(
            eval("complex(1.5, 0)"),
            Value::Complex { re: 1.5, im: 0.0 }
        );
    }

    #[test]
    fn builtin_array_derives_shape() {
        let value = eval("array([[1, 2], [3, 4]])");
        match value {
            Value::Array(array) => {
                assert_eq!(array.shape(), &[2, 2]);
                assert_eq!(
                    array.elements(),
                    &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
                );
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn builtin_array_rejects_ragged_and_scalar() {
        assert!(eval_err("array([[1], [2, 3]])").contains("ragged"));
        assert!(eval_err("array(5)").contains("rank"));
    }

    #[test]
    fn builtin_str_len_sum() {
        assert_eq!(eval("str(12)"), Value::Str("12".to_string()));
        assert_eq!(eval("str(\"x\")"), Value::Str("x".to_string()));
        assert_eq!(eval("len([1, 2, 3])"), Value::Int(3));
        assert_eq!(eval("len(\"héllo\")"), Value::Int(5));
        assert_eq!(eval("sum([1, 2, 3])"), Value::Int(6));
        assert_eq!(eval("sum((1, 2.5))"), Value::Float(3.5));
        assert_eq!(eval("sum([])"), Value::Int(0));
    }

    #[test]
    fn unknown_function_reported() {
        assert_eq!(eval_err("mystery()"), "unknown function \"mystery\"");
    }

    #[test]
    fn print_writes_to_the_sink_only() {
        let mut fixture = Fixture::new();
        let value = fixture.eval("print(\"total\", 1 + 2)").unwrap();
        assert_eq!(value, Value::Null);
        assert_eq!(fixture.out, b"total 3\n");
    }

    #[test]
    fn callback_routes_through_host() {
        let mut fixture = Fixture::new();
        fixture.host.replies.push(Value::Int(10));
        let value = fixture.eval("callback(\"lisp-fn\", 1, scale=2) + 1").unwrap();

        assert_eq!(value, Value::Int(11));
        assert_eq!(
            fixture.host.calls,
            vec![(
                "lisp-fn".to_string(),
                vec![Value::Int(1)],
                vec![("scale".to_string(), Value::Int(2))],
            )]
        );
    }

    #[test]
    fn callback_requires_a_name() {
        assert!(eval_err("callback()").contains("missing function name"));
        assert!(eval_err("callback(1)").contains("string or symbol"));
    }
}
