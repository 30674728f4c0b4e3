//! Prompt templates with `{name}` placeholders.
//!
//! Rendering is a single left-to-right pass: substituted values are never
//! re-scanned, so code containing `{context}` or other braces passes through
//! untouched. Braces that do not name a declared variable are kept literally.

use crate::error::RagError;

pub const DOCUMENTATION_TEMPLATE: &str = r#"Based on the following code snippet and its broader context from the codebase, generate a comprehensive, well-formatted docstring for it.
Write the docstring in the conventional style of the snippet's language (for Python, open and close it with three double-quotes).
Explain the purpose of the code, its arguments (if any), and what it returns.

CONTEXT:
{context}

CODE:
{code}

DOCSTRING:
"#;

pub const REVIEW_TEMPLATE: &str = r#"As an expert code reviewer, analyze the following code snippet.
Use the provided context from the codebase and the established best practices to give a constructive review.
Format the review in Markdown. Focus on clarity, potential bugs, and adherence to the best practices.

BEST PRACTICES:
{practices}

CODE CONTEXT:
{context}

CODE TO REVIEW:
{code}

MARKDOWN REVIEW:
"#;

/// A template and the variables it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Build a template, checking that every declared variable appears in it.
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Result<Self, RagError> {
        let template = template.into();
        for var in input_variables {
            if !template.contains(&format!("{{{}}}", var)) {
                return Err(RagError::Prompt(format!(
                    "template does not contain the {{{}}} placeholder",
                    var
                )));
            }
        }
        Ok(Self {
            template,
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        })
    }

    /// Default docstring template over `{context, code}`.
    pub fn documentation() -> Self {
        Self {
            template: DOCUMENTATION_TEMPLATE.to_string(),
            input_variables: vec!["context".to_string(), "code".to_string()],
        }
    }

    /// Default review template over `{practices, context, code}`.
    pub fn review() -> Self {
        Self {
            template: REVIEW_TEMPLATE.to_string(),
            input_variables: vec![
                "practices".to_string(),
                "context".to_string(),
                "code".to_string(),
            ],
        }
    }

    /// Fill the placeholders.
    ///
    /// # Errors
    ///
    /// [`RagError::Prompt`] if a declared variable has no value.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, RagError> {
        for name in &self.input_variables {
            if !vars.iter().any(|(k, _)| *k == name.as_str()) {
                return Err(RagError::Prompt(format!("missing value for '{}'", name)));
            }
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                self.input_variables
                    .iter()
                    .any(|v| v == name)
                    .then(|| vars.iter().find(|(k, _)| *k == name))
                    .flatten()
                    .map(|(_, v)| (*v, close))
            });
            match value {
                Some((v, close)) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}
