//! `${...}` interpolation for file path templates.
//!
//! A placeholder holds a path into the context object, written with dots
//! (`${input.title}`), quoted brackets for keys that contain dots
//! (`${input["notes.md"]}`) or numeric brackets for array items
//! (`${output.records[0].title}`). Nothing else is evaluated.
//!
//! Strings render as-is, `null` renders as `null`, other scalars render
//! with their JSON representation and objects/arrays render as compact JSON.
//! A `$` that is not followed by `{` is copied literally.

use serde_json::Value;

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
  Key(String),
  Index(usize),
}

/// Render `template` against `context`.
pub fn render_template(template: &str, context: &Value) -> Result<String, TemplateError> {
  let mut rendered = String::with_capacity(template.len());
  let mut cursor = 0;

  while let Some(offset) = template[cursor..].find("${") {
    let start = cursor + offset;
    rendered.push_str(&template[cursor..start]);

    let body_start = start + 2;
    let close = find_close(template, body_start).ok_or(TemplateError::Unclosed { position: start })?;
    let placeholder = template[body_start..close].trim();

    let path = parse_path(placeholder)?;
    let value = lookup(context, &path).ok_or_else(|| TemplateError::MissingValue {
      path: placeholder.to_string(),
    })?;
    rendered.push_str(&to_text(value));

    cursor = close + 1;
  }

  rendered.push_str(&template[cursor..]);
  Ok(rendered)
}

/// Find the `}` closing a placeholder, skipping braces inside quotes.
fn find_close(template: &str, from: usize) -> Option<usize> {
  let mut quote: Option<char> = None;
  for (i, c) in template[from..].char_indices() {
    match (quote, c) {
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '"' | '\'') => quote = Some(c),
      (None, '}') => return Some(from + i),
      _ => {}
    }
  }
  None
}

fn invalid(placeholder: &str, message: impl Into<String>) -> TemplateError {
  TemplateError::InvalidPlaceholder {
    placeholder: placeholder.to_string(),
    message: message.into(),
  }
}

fn parse_path(placeholder: &str) -> Result<Vec<Segment>, TemplateError> {
  if placeholder.is_empty() {
    return Err(invalid(placeholder, "empty placeholder"));
  }

  let mut segments = Vec::new();
  let mut current = String::new();
  let mut chars = placeholder.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '.' => {
        if current.is_empty() && segments.is_empty() {
          return Err(invalid(placeholder, "path cannot start with '.'"));
        }
        if !current.is_empty() {
          segments.push(Segment::Key(std::mem::take(&mut current)));
        }
        if chars.peek().is_none() {
          return Err(invalid(placeholder, "path cannot end with '.'"));
        }
      }
      '[' => {
        if !current.is_empty() {
          segments.push(Segment::Key(std::mem::take(&mut current)));
        }
        if segments.is_empty() {
          return Err(invalid(placeholder, "path cannot start with '['"));
        }
        segments.push(parse_bracket(placeholder, &mut chars)?);
      }
      c if c.is_whitespace() => {
        return Err(invalid(placeholder, "only field lookups are allowed"));
      }
      '(' | ')' | '+' | '*' | '?' | ':' | '`' | ',' | ';' | '=' | '!' | '<' | '>' => {
        return Err(invalid(placeholder, "only field lookups are allowed"));
      }
      c => current.push(c),
    }
  }

  if !current.is_empty() {
    segments.push(Segment::Key(current));
  }
  Ok(segments)
}

fn parse_bracket(
  placeholder: &str,
  chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Segment, TemplateError> {
  match chars.peek().copied() {
    Some(q @ ('"' | '\'')) => {
      chars.next();
      let mut key = String::new();
      loop {
        match chars.next() {
          Some(c) if c == q => break,
          Some(c) => key.push(c),
          None => return Err(invalid(placeholder, "unterminated quoted key")),
        }
      }
      if chars.next() != Some(']') {
        return Err(invalid(placeholder, "expected ']' after quoted key"));
      }
      Ok(Segment::Key(key))
    }
    _ => {
      let mut digits = String::new();
      loop {
        match chars.next() {
          Some(']') => break,
          Some(c) if c.is_ascii_digit() => digits.push(c),
          _ => return Err(invalid(placeholder, "expected an array index or a quoted key")),
        }
      }
      digits
        .parse()
        .map(Segment::Index)
        .map_err(|_| invalid(placeholder, "empty array index"))
    }
  }
}

fn lookup<'a>(context: &'a Value, path: &[Segment]) -> Option<&'a Value> {
  path.iter().try_fold(context, |value, segment| match segment {
    Segment::Key(key) => value.as_object()?.get(key),
    Segment::Index(index) => value.as_array()?.get(*index),
  })
}

fn to_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
