//! Condition Evaluator
//!
//! A practice's `condition` is a small boolean expression over the IDs of its
//! qualifying questions, e.g. `internet && !legacy`. Callers resolve each
//! qualifying answer to a boolean before evaluation; the evaluator never sees
//! N/A or Unanswered.

mod lexer;
mod parser;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Number(f64),
    Text(String),
    Var(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
}

/// Result of evaluating a sub-expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// A parsed condition. Parsing happens once; evaluation is pure.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let expr = parser::parse_expr(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Every variable name the condition refers to
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut vars = BTreeSet::new();
        collect_vars(&self.expr, &mut vars);
        vars
    }

    pub fn evaluate(&self, params: &BTreeMap<String, bool>) -> Result<bool, ExpressionError> {
        match eval(&self.expr, params)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExpressionError::NotBoolean(other.to_string())),
        }
    }
}

/// Parses and evaluates `condition` against the resolved qualifying answers.
pub fn evaluate(condition: &str, params: &BTreeMap<String, bool>) -> Result<bool, ExpressionError> {
    Condition::parse(condition)?.evaluate(params)
}

fn collect_vars<'a>(expr: &'a Expr, out: &mut BTreeSet<&'a str>) {
    match expr {
        Expr::Var(name) => {
            out.insert(name.as_str());
        }
        Expr::Not(inner) => collect_vars(inner, out),
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) | Expr::Compare(_, lhs, rhs) => {
            collect_vars(lhs, out);
            collect_vars(rhs, out);
        }
        Expr::Bool(_) | Expr::Number(_) | Expr::Text(_) => {}
    }
}

fn eval(expr: &Expr, params: &BTreeMap<String, bool>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Var(name) => params
            .get(name)
            .map(|b| Value::Bool(*b))
            .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
        Expr::Not(inner) => Ok(Value::Bool(!as_bool("!", eval(inner, params)?)?)),
        Expr::And(lhs, rhs) => {
            if !as_bool("&&", eval(lhs, params)?)? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(as_bool("&&", eval(rhs, params)?)?))
        }
        Expr::Or(lhs, rhs) => {
            if as_bool("||", eval(lhs, params)?)? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(as_bool("||", eval(rhs, params)?)?))
        }
        Expr::Compare(op, lhs, rhs) => {
            let equal = eval(lhs, params)? == eval(rhs, params)?;
            Ok(Value::Bool(match op {
                CmpOp::Eq => equal,
                CmpOp::Ne => !equal,
            }))
        }
    }
}

fn as_bool(operator: &str, value: Value) -> Result<bool, ExpressionError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExpressionError::TypeMismatch {
            operator: operator.to_string(),
            found: other.to_string(),
        }),
    }
}
