//! Vaultflow Expressions
//!
//! Configuration documents carry two kinds of small expressions:
//!
//! - `filePath` templates on file-writing result actions, rendered by
//!   [`render_template`]. Only `${path.to.field}` lookups are supported.
//! - trigger `condition`s, compiled by [`Condition::compile`] into a tiny
//!   boolean expression language (comparisons, string predicates and the
//!   `&&`, `||`, `!` operators).
//!
//! Neither can execute arbitrary code. Both evaluate against a
//! [`serde_json::Value`] context supplied by the caller.

mod condition;
mod error;
mod template;

pub use condition::Condition;
pub use error::{ConditionError, TemplateError};
pub use template::render_template;
