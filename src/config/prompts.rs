//! Prompt templates for Sanko.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompts for question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System preamble sent with every query, in both modes.
    pub system: String,
    /// Grounding template. Must contain `{{context}}` and `{{question}}`.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a sincere and capable assistant. Unless instructed otherwise, always answer in {{language}}.".to_string(),
            user: r#"You are a sincere and capable assistant. Unless instructed otherwise, always answer in {{language}}.
Answer the user's question using the reference information below.
If the question is unrelated to the reference information, answer "No relevant information found."

Reference information:
{{context}}

Question: {{question}}
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the defaults from an optional custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single left-to-right pass: inserted values are never
    /// scanned for placeholders again. Unknown placeholders are left in place.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };

            let name = &after_open[..end];
            match vars.get(name.trim()) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(name);
                    result.push_str("}}");
                }
            }
            rest = &after_open[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Names of the placeholders in a template, in order of appearance.
    pub fn placeholders(template: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };
            names.push(after_open[..end].trim().to_string());
            rest = &after_open[end + 2..];
        }

        names
    }
}
