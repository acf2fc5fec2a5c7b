use serde_json::json;
use vaultflow_expr::{Condition, ConditionError, TemplateError, render_template};

#[test]
fn test_condition_is_reusable_across_files() {
  let condition = Condition::compile("file.extension == 'md' && content.includes('#todo')").unwrap();

  let files = [
    (json!({ "file": { "extension": "md" }, "content": "- [ ] #todo" }), true),
    (json!({ "file": { "extension": "md" }, "content": "done" }), false),
    (json!({ "file": { "extension": "png" }, "content": "#todo" }), false),
  ];

  for (context, expected) in files {
    assert_eq!(condition.evaluate(&context).unwrap(), expected, "{}", context);
  }
  assert_eq!(
    condition.source(),
    "file.extension == 'md' && content.includes('#todo')"
  );
}

#[test]
fn test_short_circuit_skips_failing_branch() {
  // `missing` would raise UnknownIdentifier if evaluated.
  let condition = Condition::compile("false && missing || true").unwrap();
  assert!(condition.evaluate(&json!({})).unwrap());

  let condition = Condition::compile("true || missing").unwrap();
  assert!(condition.evaluate(&json!({})).unwrap());
}

#[test]
fn test_non_object_context_is_rejected() {
  let condition = Condition::compile("content").unwrap();
  assert!(matches!(
    condition.evaluate(&json!("text")),
    Err(ConditionError::TypeMismatch { .. })
  ));
}

#[test]
fn test_template_with_auxiliary_keys() {
  let context = json!({
    "input": {
      "title": "demo",
      "image/workspace/fileBaseName": "receipt"
    },
    "output": { "constants": { "total": "12.50" } }
  });

  assert_eq!(
    render_template("notes/${input.title}.md", &context).unwrap(),
    "notes/demo.md"
  );
  assert_eq!(
    render_template(
      "scans/${input.image/workspace/fileBaseName} (${output.constants.total}).md",
      &context
    )
    .unwrap(),
    "scans/receipt (12.50).md"
  );
}

#[test]
fn test_template_never_evaluates_code() {
  let context = json!({ "input": {} });
  let err = render_template("${require('fs')}", &context).unwrap_err();
  assert!(matches!(err, TemplateError::InvalidPlaceholder { .. }));
}

#[test]
fn test_deeply_nested_condition_is_rejected() {
  for source in [
    format!("{}true", "!".repeat(200_000)),
    format!("{}true{}", "(".repeat(50_000), ")".repeat(50_000)),
    vec!["content.includes('x')"; 5_000].join(" || "),
  ] {
    let err = Condition::compile(&source).unwrap_err();
    assert!(
      matches!(&err, ConditionError::Syntax { message, .. } if message == "condition nested too deeply"),
      "{}",
      err
    );
  }

  let moderate = Condition::compile("!(!(content.includes('a') || content.includes('b')))").unwrap();
  assert!(moderate.evaluate(&json!({ "content": "b" })).unwrap());
}
