//! Prompt templates with named parameters.
//!
//! A [`PromptTemplate`] is parsed once into literal and placeholder
//! segments, so the set of parameters it needs is known up front and a
//! render with a missing value fails instead of leaking `{name}` into the
//! prompt.

use crate::{error::Result, types::PipelineContext, PipelineError};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed prompt template.
///
/// `{name}` is a placeholder when `name` is made of ASCII letters, digits
/// and underscores. Use `{{` and `}}` for literal braces. Any other brace is
/// kept as-is.
///
/// # Example
///
/// ```
/// use article_topics::prompt::PromptTemplate;
/// use article_topics::types::PipelineContext;
///
/// let ctx = PipelineContext::new().insert("name", "Alice");
/// let tpl = PromptTemplate::new("Hello {name}, JSON: {{\"key\": 1}}");
/// assert_eq!(tpl.render(&ctx).unwrap(), r#"Hello Alice, JSON: {"key": 1}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse(&source);
        Self { source, segments }
    }

    /// The unparsed template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Names of every placeholder in the template.
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every placeholder from `context`.
    ///
    /// Fails with [`PipelineError::InvalidConfig`] naming the first
    /// placeholder that has no value.
    pub fn render(&self, context: &PipelineContext) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(name) => {
                    let value = context.get(name).ok_or_else(|| {
                        PipelineError::InvalidConfig(format!(
                            "Missing value for placeholder '{{{}}}'",
                            name
                        ))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("{{") {
            literal.push('{');
            rest = &rest[2..];
            continue;
        }
        if rest.starts_with("}}") {
            literal.push('}');
            rest = &rest[2..];
            continue;
        }
        if c == '{' {
            if let Some(end) = rest[1..].find('}') {
                let name = &rest[1..1 + end];
                if !name.is_empty() && name.chars().all(is_param_char) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                    rest = &rest[end + 2..];
                    continue;
                }
            }
        }
        literal.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Wrap text in a labeled section for structured prompts.
pub fn section(label: &str, content: &str) -> String {
    format!("## {}\n{}", label, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let ctx = PipelineContext::new()
            .insert("theme", "Robotics")
            .insert("topic_count", "7");
        let tpl = PromptTemplate::new("List {topic_count} topics about {theme}.");
        assert_eq!(tpl.render(&ctx).unwrap(), "List 7 topics about Robotics.");
    }

    #[test]
    fn test_render_no_placeholders() {
        let tpl = PromptTemplate::new("static prompt");
        assert!(tpl.placeholders().is_empty());
        assert_eq!(tpl.render(&PipelineContext::new()).unwrap(), "static prompt");
    }

    #[test]
    fn test_missing_value_fails() {
        let tpl = PromptTemplate::new("About {theme}");
        let err = tpl.render(&PipelineContext::new()).unwrap_err();
        match err {
            PipelineError::InvalidConfig(msg) => assert!(msg.contains("{theme}")),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholders_collected() {
        let tpl = PromptTemplate::new("{a} and {b} and {a} again");
        let names: Vec<_> = tpl.placeholders().into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_escaped_braces() {
        let ctx = PipelineContext::new();
        let tpl = PromptTemplate::new("Output format: {{\"result\": {{\"value\": 42}}}}");
        assert_eq!(tpl.render(&ctx).unwrap(), r#"Output format: {"result": {"value": 42}}"#);
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let ctx = PipelineContext::new();
        let tpl = PromptTemplate::new("keep { this } and {not-a-param}");
        assert!(tpl.placeholders().is_empty());
        assert_eq!(tpl.render(&ctx).unwrap(), "keep { this } and {not-a-param}");
    }

    #[test]
    fn test_unicode_literal_preserved() {
        let ctx = PipelineContext::new().insert("x", "ü");
        let tpl = PromptTemplate::new("café → {x} ✓");
        assert_eq!(tpl.render(&ctx).unwrap(), "café → ü ✓");
    }

    #[test]
    fn test_section() {
        let result = section("Context", "Some knowledge here");
        assert_eq!(result, "## Context\nSome knowledge here");
    }
}
