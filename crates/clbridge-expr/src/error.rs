use clbridge_value::ShapeError;

/// Failures raised while lexing, parsing, or evaluating source text.
///
/// All of these are recoverable at the session level; they become
/// error responses and never end the worker.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExprError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name {0:?} is not defined")]
    Undefined(String),

    #[error("unsupported operands for {op}: {lhs} and {rhs}")]
    BadOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("bad operand for unary minus: {0}")]
    BadUnary(&'static str),

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("invalid arguments to {func}: {reason}")]
    BadArguments { func: &'static str, reason: String },

    #[error("invalid array: {0}")]
    Shape(#[from] ShapeError),
}

impl ExprError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ExprError::Syntax(message.into())
    }

    pub(crate) fn bad_arguments(func: &'static str, reason: impl Into<String>) -> Self {
        ExprError::BadArguments {
            func,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;
