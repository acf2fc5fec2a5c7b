use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use super::parser::{BinaryOp, Expr};
use crate::error::ConditionError;

pub(crate) fn evaluate(expr: &Expr, context: &Map<String, Value>) -> Result<Value, ConditionError> {
  match expr {
    Expr::Literal(value) => Ok(value.clone()),
    Expr::Ident(name) => context
      .get(name)
      .cloned()
      .ok_or_else(|| ConditionError::UnknownIdentifier(name.clone())),
    Expr::Member { target, field } => {
      let target = evaluate(target, context)?;
      member(&target, field)
    }
    Expr::Call {
      target,
      method,
      args,
    } => {
      let target = evaluate(target, context)?;
      let args = args
        .iter()
        .map(|arg| evaluate(arg, context))
        .collect::<Result<Vec<_>, _>>()?;
      call(&target, method, &args)
    }
    Expr::Not(inner) => Ok(Value::Bool(!truthy(&evaluate(inner, context)?))),
    Expr::And(left, right) => {
      let left = evaluate(left, context)?;
      if !truthy(&left) {
        return Ok(left);
      }
      evaluate(right, context)
    }
    Expr::Or(left, right) => {
      let left = evaluate(left, context)?;
      if truthy(&left) {
        return Ok(left);
      }
      evaluate(right, context)
    }
    Expr::Compare { op, left, right } => {
      let left = evaluate(left, context)?;
      let right = evaluate(right, context)?;
      compare(op, &left, &right).map(Value::Bool)
    }
  }
}

/// JavaScript-style truthiness.
pub(crate) fn truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

fn number(n: usize) -> Value {
  Value::Number(serde_json::Number::from(n))
}

fn member(target: &Value, field: &str) -> Result<Value, ConditionError> {
  match (target, field) {
    (Value::String(s), "length") => Ok(number(s.chars().count())),
    (Value::Array(items), "length") => Ok(number(items.len())),
    (Value::Object(map), field) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
    (Value::Null, field) => Err(ConditionError::TypeMismatch {
      operation: format!(".{}", field),
      message: "cannot read a property of null".to_string(),
    }),
    _ => Ok(Value::Null),
  }
}

fn string_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a str, ConditionError> {
  match args {
    [Value::String(s), ..] => Ok(s),
    [other, ..] => Err(ConditionError::TypeMismatch {
      operation: method.to_string(),
      message: format!("expected a string argument, found {}", type_name(other)),
    }),
    [] => Err(ConditionError::TypeMismatch {
      operation: method.to_string(),
      message: "expected a string argument".to_string(),
    }),
  }
}

fn call(target: &Value, method: &str, args: &[Value]) -> Result<Value, ConditionError> {
  match target {
    Value::String(s) => match method {
      "includes" => Ok(Value::Bool(s.contains(string_arg(method, args)?))),
      "startsWith" => Ok(Value::Bool(s.starts_with(string_arg(method, args)?))),
      "endsWith" => Ok(Value::Bool(s.ends_with(string_arg(method, args)?))),
      "matches" | "test" => {
        let pattern = string_arg(method, args)?;
        let regex = Regex::new(pattern).map_err(|e| ConditionError::InvalidRegex(e.to_string()))?;
        Ok(Value::Bool(regex.is_match(s)))
      }
      "toLowerCase" => Ok(Value::String(s.to_lowercase())),
      "toUpperCase" => Ok(Value::String(s.to_uppercase())),
      "trim" => Ok(Value::String(s.trim().to_string())),
      _ => Err(unknown_method(method, target)),
    },
    Value::Array(items) => match method {
      "includes" => {
        let needle = args.first().unwrap_or(&Value::Null);
        Ok(Value::Bool(items.iter().any(|item| loose_eq(item, needle))))
      }
      _ => Err(unknown_method(method, target)),
    },
    _ => Err(unknown_method(method, target)),
  }
}

fn unknown_method(method: &str, target: &Value) -> ConditionError {
  ConditionError::UnknownMethod {
    method: method.to_string(),
    target: type_name(target).to_string(),
  }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
  match (left, right) {
    (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
    _ => left == right,
  }
}

fn compare(op: &BinaryOp, left: &Value, right: &Value) -> Result<bool, ConditionError> {
  match op {
    BinaryOp::Eq => return Ok(loose_eq(left, right)),
    BinaryOp::NotEq => return Ok(!loose_eq(left, right)),
    _ => {}
  }

  let ordering = match (left, right) {
    (Value::Number(a), Value::Number(b)) => {
      let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
      match a.partial_cmp(&b) {
        Some(ordering) => ordering,
        None => return Ok(false),
      }
    }
    (Value::String(a), Value::String(b)) => a.cmp(b),
    _ => {
      return Err(ConditionError::TypeMismatch {
        operation: op.symbol().to_string(),
        message: format!(
          "cannot compare {} with {}",
          type_name(left),
          type_name(right)
        ),
      });
    }
  };

  Ok(match op {
    BinaryOp::Lt => ordering == Ordering::Less,
    BinaryOp::LtEq => ordering != Ordering::Greater,
    BinaryOp::Gt => ordering == Ordering::Greater,
    BinaryOp::GtEq => ordering != Ordering::Less,
    BinaryOp::Eq | BinaryOp::NotEq => unreachable!("equality handled above"),
  })
}
