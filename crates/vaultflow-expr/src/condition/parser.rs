//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, lowest first: `||`, `&&`, comparisons, unary `!`, postfix
//! member access and method calls.

use serde_json::Value;

use super::lexer::{Spanned, Token};
use crate::error::ConditionError;

/// Deepest nesting of `!`, parentheses, operator chains and member access
/// a condition may use.
pub(crate) const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BinaryOp {
  Eq,
  NotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
}

impl BinaryOp {
  pub fn symbol(&self) -> &'static str {
    match self {
      BinaryOp::Eq => "==",
      BinaryOp::NotEq => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::LtEq => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::GtEq => ">=",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
  Literal(Value),
  Ident(String),
  Member {
    target: Box<Expr>,
    field: String,
  },
  Call {
    target: Box<Expr>,
    method: String,
    args: Vec<Expr>,
  },
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  Compare {
    op: BinaryOp,
    left: Box<Expr>,
    right: Box<Expr>,
  },
}

pub(crate) struct Parser {
  tokens: Vec<Spanned>,
  pos: usize,
  end: usize,
  depth: usize,
}

impl Parser {
  pub fn new(tokens: Vec<Spanned>, source_len: usize) -> Self {
    Self {
      tokens,
      pos: 0,
      end: source_len,
      depth: 0,
    }
  }

  pub fn parse(mut self) -> Result<Expr, ConditionError> {
    let expr = self.parse_or()?;
    if let Some(extra) = self.tokens.get(self.pos) {
      return Err(ConditionError::Syntax {
        position: extra.position,
        message: "unexpected trailing input".to_string(),
      });
    }
    Ok(expr)
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos).map(|s| &s.token)
  }

  fn position(&self) -> usize {
    self.tokens.get(self.pos).map(|s| s.position).unwrap_or(self.end)
  }

  fn advance(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.pos).map(|s| s.token.clone());
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn eat(&mut self, expected: &Token) -> bool {
    if self.peek() == Some(expected) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, expected: Token, what: &str) -> Result<(), ConditionError> {
    if self.eat(&expected) {
      Ok(())
    } else {
      Err(self.error(format!("expected {}", what)))
    }
  }

  /// Enter one more level of nesting. Callers reset `depth` when they return.
  fn descend(&mut self) -> Result<(), ConditionError> {
    self.depth += 1;
    if self.depth > MAX_DEPTH {
      return Err(self.error("condition nested too deeply"));
    }
    Ok(())
  }

  fn error(&self, message: impl Into<String>) -> ConditionError {
    ConditionError::Syntax {
      position: self.position(),
      message: message.into(),
    }
  }

  fn parse_or(&mut self) -> Result<Expr, ConditionError> {
    let base = self.depth;
    let mut left = self.parse_and()?;
    while self.eat(&Token::Or) {
      self.descend()?;
      let right = self.parse_and()?;
      left = Expr::Or(Box::new(left), Box::new(right));
    }
    self.depth = base;
    Ok(left)
  }

  fn parse_and(&mut self) -> Result<Expr, ConditionError> {
    let base = self.depth;
    let mut left = self.parse_comparison()?;
    while self.eat(&Token::And) {
      self.descend()?;
      let right = self.parse_comparison()?;
      left = Expr::And(Box::new(left), Box::new(right));
    }
    self.depth = base;
    Ok(left)
  }

  fn parse_comparison(&mut self) -> Result<Expr, ConditionError> {
    let base = self.depth;
    let mut left = self.parse_unary()?;
    loop {
      let op = match self.peek() {
        Some(Token::Eq) => BinaryOp::Eq,
        Some(Token::NotEq) => BinaryOp::NotEq,
        Some(Token::Lt) => BinaryOp::Lt,
        Some(Token::LtEq) => BinaryOp::LtEq,
        Some(Token::Gt) => BinaryOp::Gt,
        Some(Token::GtEq) => BinaryOp::GtEq,
        _ => {
          self.depth = base;
          return Ok(left);
        }
      };
      self.pos += 1;
      self.descend()?;
      let right = self.parse_unary()?;
      left = Expr::Compare {
        op,
        left: Box::new(left),
        right: Box::new(right),
      };
    }
  }

  fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
    if self.eat(&Token::Not) {
      self.descend()?;
      let inner = self.parse_unary()?;
      self.depth -= 1;
      return Ok(Expr::Not(Box::new(inner)));
    }
    self.parse_postfix()
  }

  fn parse_postfix(&mut self) -> Result<Expr, ConditionError> {
    let base = self.depth;
    let mut expr = self.parse_primary()?;
    while self.eat(&Token::Dot) {
      self.descend()?;
      let name = match self.advance() {
        Some(Token::Ident(name)) => name,
        _ => {
          self.pos = self.pos.saturating_sub(1);
          return Err(self.error("expected a property or method name after '.'"));
        }
      };

      if self.eat(&Token::LParen) {
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
          loop {
            args.push(self.parse_or()?);
            if self.eat(&Token::RParen) {
              break;
            }
            self.expect(Token::Comma, "',' or ')'")?;
          }
        }
        expr = Expr::Call {
          target: Box::new(expr),
          method: name,
          args,
        };
      } else {
        expr = Expr::Member {
          target: Box::new(expr),
          field: name,
        };
      }
    }
    self.depth = base;
    Ok(expr)
  }

  fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
    let start = self.position();
    match self.advance() {
      Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
      Some(Token::Num(n)) => Ok(Expr::Literal(
        serde_json::Number::from_f64(n)
          .map(Value::Number)
          .unwrap_or(Value::Null),
      )),
      Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
      Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
      Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
      Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
      Some(Token::LParen) => {
        self.descend()?;
        let inner = self.parse_or()?;
        self.expect(Token::RParen, "')'")?;
        self.depth -= 1;
        Ok(inner)
      }
      Some(_) => Err(ConditionError::Syntax {
        position: start,
        message: "expected an expression".to_string(),
      }),
      None => Err(ConditionError::Syntax {
        position: start,
        message: "unexpected end of condition".to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::condition::lexer::tokenize;

  fn parse(source: &str) -> Result<Expr, ConditionError> {
    Parser::new(tokenize(source)?, source.len()).parse()
  }

  #[test]
  fn test_and_binds_tighter_than_or() {
    let expr = parse("a || b && c").unwrap();
    assert_eq!(
      expr,
      Expr::Or(
        Box::new(Expr::Ident("a".to_string())),
        Box::new(Expr::And(
          Box::new(Expr::Ident("b".to_string())),
          Box::new(Expr::Ident("c".to_string())),
        )),
      )
    );
  }

  #[test]
  fn test_method_chain() {
    let expr = parse("file.name.toLowerCase().endsWith('.png')").unwrap();
    match expr {
      Expr::Call { method, target, args } => {
        assert_eq!(method, "endsWith");
        assert_eq!(args, vec![Expr::Literal(Value::String(".png".to_string()))]);
        assert!(matches!(*target, Expr::Call { ref method, .. } if method == "toLowerCase"));
      }
      other => panic!("unexpected expression: {:?}", other),
    }
  }

  #[test]
  fn test_syntax_errors_carry_positions() {
    assert_eq!(
      parse("content.includes('x'").unwrap_err(),
      ConditionError::Syntax {
        position: 20,
        message: "expected ',' or ')'".to_string(),
      }
    );
    assert!(matches!(
      parse("a &&"),
      Err(ConditionError::Syntax { position: 4, .. })
    ));
    assert!(matches!(
      parse("a b"),
      Err(ConditionError::Syntax { position: 2, .. })
    ));
    assert!(matches!(
      parse("a.'x'"),
      Err(ConditionError::Syntax { position: 2, .. })
    ));
  }

  fn too_deep(result: Result<Expr, ConditionError>) -> bool {
    matches!(result, Err(ConditionError::Syntax { message, .. }) if message == "condition nested too deeply")
  }

  #[test]
  fn test_nesting_is_bounded() {
    assert!(too_deep(parse(&format!("{}true", "!".repeat(200_000)))));
    assert!(too_deep(parse(&format!("{}true{}", "(".repeat(10_000), ")".repeat(10_000)))));
    assert!(too_deep(parse(&vec!["a"; 10_000].join(" && "))));
    assert!(too_deep(parse(&format!("a{}", ".b".repeat(10_000)))));
    assert!(too_deep(parse(&vec!["1"; 10_000].join(" < "))));
  }

  #[test]
  fn test_nesting_within_limit_parses() {
    assert!(parse(&format!("{}true", "!".repeat(MAX_DEPTH))).is_ok());
    assert!(parse(&format!("{}true{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH))).is_ok());
    assert!(parse(&vec!["a"; 20].join(" || ")).is_ok());
    assert!(parse(&format!("content{}", ".b".repeat(30))).is_ok());
  }
}
