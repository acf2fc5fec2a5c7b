use serde_json::{Value, json};
use tracing::debug;

/// Extract YAML front matter from a markdown document.
///
/// Returns `{"frontmatter": {...}}` when the document opens with a `---`
/// block that parses as YAML, `None` otherwise.
pub fn parse_front_matter(content: &str) -> Option<Value> {
  let rest = content
    .strip_prefix("---\n")
    .or_else(|| content.strip_prefix("---\r\n"))?;

  let mut offset = 0;
  let mut block = None;
  for line in rest.split_inclusive('\n') {
    if line.trim_end() == "---" {
      block = Some(&rest[..offset]);
      break;
    }
    offset += line.len();
  }
  let block = block?;

  match serde_yaml::from_str::<serde_yaml::Value>(block) {
    Ok(serde_yaml::Value::Null) => Some(json!({ "frontmatter": {} })),
    Ok(yaml) => match serde_json::to_value(yaml) {
      Ok(frontmatter) => Some(json!({ "frontmatter": frontmatter })),
      Err(e) => {
        debug!(error = %e, "front matter is not representable as JSON");
        None
      }
    },
    Err(e) => {
      debug!(error = %e, "ignoring malformed front matter");
      None
    }
  }
}
