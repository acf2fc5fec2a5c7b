use crate::error::ConditionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
  Ident(String),
  Str(String),
  Num(f64),
  True,
  False,
  Null,
  Dot,
  Comma,
  LParen,
  RParen,
  Not,
  And,
  Or,
  Eq,
  NotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
  pub token: Token,
  pub position: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> ConditionError {
  ConditionError::Syntax {
    position,
    message: message.into(),
  }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ConditionError> {
  let chars: Vec<(usize, char)> = source.char_indices().collect();
  let mut tokens = Vec::new();
  let mut i = 0;

  let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

  while i < chars.len() {
    let (position, c) = chars[i];

    if c.is_whitespace() {
      i += 1;
      continue;
    }

    let (token, consumed) = match c {
      '.' => (Token::Dot, 1),
      ',' => (Token::Comma, 1),
      '(' => (Token::LParen, 1),
      ')' => (Token::RParen, 1),
      '&' if peek(i + 1) == Some('&') => (Token::And, 2),
      '|' if peek(i + 1) == Some('|') => (Token::Or, 2),
      '=' if peek(i + 1) == Some('=') => {
        // `===` is accepted as a synonym for `==`.
        if peek(i + 2) == Some('=') {
          (Token::Eq, 3)
        } else {
          (Token::Eq, 2)
        }
      }
      '!' if peek(i + 1) == Some('=') => {
        if peek(i + 2) == Some('=') {
          (Token::NotEq, 3)
        } else {
          (Token::NotEq, 2)
        }
      }
      '!' => (Token::Not, 1),
      '<' if peek(i + 1) == Some('=') => (Token::LtEq, 2),
      '<' => (Token::Lt, 1),
      '>' if peek(i + 1) == Some('=') => (Token::GtEq, 2),
      '>' => (Token::Gt, 1),
      '"' | '\'' => {
        let (text, consumed) = read_string(&chars, i, c)?;
        (Token::Str(text), consumed)
      }
      c if c.is_ascii_digit() => {
        let mut end = i;
        while end < chars.len() && (chars[end].1.is_ascii_digit() || chars[end].1 == '.') {
          end += 1;
        }
        let text: String = chars[i..end].iter().map(|(_, c)| *c).collect();
        let number = text
          .parse::<f64>()
          .map_err(|_| syntax(position, format!("invalid number '{}'", text)))?;
        (Token::Num(number), end - i)
      }
      c if c.is_alphabetic() || c == '_' || c == '$' => {
        let mut end = i;
        while end < chars.len()
          && (chars[end].1.is_alphanumeric() || chars[end].1 == '_' || chars[end].1 == '$')
        {
          end += 1;
        }
        let word: String = chars[i..end].iter().map(|(_, c)| *c).collect();
        let token = match word.as_str() {
          "true" => Token::True,
          "false" => Token::False,
          "null" | "undefined" => Token::Null,
          _ => Token::Ident(word),
        };
        (token, end - i)
      }
      other => return Err(syntax(position, format!("unexpected character '{}'", other))),
    };

    tokens.push(Spanned { token, position });
    i += consumed;
  }

  Ok(tokens)
}

fn read_string(
  chars: &[(usize, char)],
  start: usize,
  quote: char,
) -> Result<(String, usize), ConditionError> {
  let mut text = String::new();
  let mut i = start + 1;

  while i < chars.len() {
    let c = chars[i].1;
    if c == quote {
      return Ok((text, i + 1 - start));
    }
    if c == '\\' {
      let escaped = chars
        .get(i + 1)
        .map(|(_, c)| *c)
        .ok_or_else(|| syntax(chars[i].0, "dangling escape"))?;
      text.push(match escaped {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
      });
      i += 2;
      continue;
    }
    text.push(c);
    i += 1;
  }

  Err(syntax(chars[start].0, "unterminated string literal"))
}
