//! URI templates with `{placeholder}` variables.
//!
//! Only simple string expansion is supported. A variable matches one or
//! more characters up to the next literal part, never crossing a `/`.
//! Values are returned exactly as they appear in the URI.

use std::collections::BTreeMap;
use std::fmt;

use super::ResourceError;

/// Variable name to value, as extracted from a concrete URI.
pub type TemplateParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Variable(String),
}

/// A parsed URI template such as `greeting://{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, ResourceError> {
        let invalid = |reason: &str| ResourceError::InvalidTemplate(format!("{}: {}", raw, reason));

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(invalid("unclosed `{`"));
                    }
                    let well_formed = !name.is_empty()
                        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                    if !well_formed {
                        return Err(invalid("variable names must be non-empty [A-Za-z0-9_]"));
                    }
                    if literal.is_empty() && matches!(parts.last(), Some(Part::Variable(_))) {
                        return Err(invalid("adjacent variables are ambiguous"));
                    }
                    if parts.iter().any(|p| *p == Part::Variable(name.clone())) {
                        return Err(invalid("duplicate variable"));
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Variable(name));
                }
                '}' => return Err(invalid("unmatched `}`")),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the variables, in template order.
    pub fn variables(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Variable(name) => Some(name.as_str()),
                Part::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete URI, returning the extracted variables.
    pub fn matches(&self, uri: &str) -> Option<TemplateParams> {
        let mut rest = uri;
        let mut params = TemplateParams::new();
        let mut parts = self.parts.iter().peekable();

        while let Some(part) = parts.next() {
            match part {
                Part::Literal(lit) => rest = rest.strip_prefix(lit.as_str())?,
                Part::Variable(name) => {
                    let end = match parts.peek() {
                        Some(Part::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_variable() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        assert_eq!(template.variables(), vec!["name"]);

        let params = template.matches("greeting://World").unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("World"));
    }

    #[test]
    fn test_values_are_verbatim() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        let params = template.matches("greeting://Jane%20Doe").unwrap();
        assert_eq!(params["name"], "Jane%20Doe");

        let params = template.matches("greeting://Zoë").unwrap();
        assert_eq!(params["name"], "Zoë");
    }

    #[test]
    fn test_non_matching_uris() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        assert!(template.matches("greeting://").is_none());
        assert!(template.matches("greeting://a/b").is_none());
        assert!(template.matches("farewell://World").is_none());
        assert!(template.matches("greeting:/World").is_none());
    }

    #[test]
    fn test_multiple_variables_and_suffix() {
        let template = UriTemplate::parse("repo://{owner}/{name}/readme").unwrap();
        let params = template.matches("repo://rust-lang/rust/readme").unwrap();
        assert_eq!(params["owner"], "rust-lang");
        assert_eq!(params["name"], "rust");

        assert!(template.matches("repo://rust-lang/rust/license").is_none());
        assert!(template.matches("repo://rust-lang/rust/readme/extra").is_none());
    }

    #[test]
    fn test_literal_only_template() {
        let template = UriTemplate::parse("status://server").unwrap();
        assert!(template.variables().is_empty());
        assert_eq!(template.matches("status://server"), Some(TemplateParams::new()));
        assert!(template.matches("status://server2").is_none());
    }

    #[test]
    fn test_invalid_templates() {
        for raw in [
            "greeting://{name",
            "greeting://name}",
            "greeting://{}",
            "greeting://{first name}",
            "pair://{a}{b}",
            "pair://{a}/{a}",
        ] {
            let err = UriTemplate::parse(raw).unwrap_err();
            assert!(matches!(err, ResourceError::InvalidTemplate(_)), "{raw}");
        }
    }
}
