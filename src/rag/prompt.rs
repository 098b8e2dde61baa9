//! Grounding prompt assembly.

use crate::config::Prompts;
use crate::error::{Result, SankoError};
use std::collections::HashMap;

const CONTEXT: &str = "context";
const QUESTION: &str = "question";

/// Renders the grounding template with retrieved context and the user's question.
///
/// Configuration variables are substituted when the assembler is built, so the
/// stored template only contains `{{context}}` and `{{question}}`.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
}

impl PromptAssembler {
    /// Build an assembler, filling in configuration variables such as `{{language}}`.
    ///
    /// Fails if the resulting template lacks either placeholder or still holds
    /// any other one.
    pub fn new(template: &str, variables: &HashMap<String, String>) -> Result<Self> {
        let vars: HashMap<String, String> = variables
            .iter()
            .filter(|(k, _)| k.as_str() != CONTEXT && k.as_str() != QUESTION)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let template = Prompts::render(template, &vars);

        let names = Prompts::placeholders(&template);
        if let Some(unknown) = names.iter().find(|n| n.as_str() != CONTEXT && n.as_str() != QUESTION) {
            return Err(SankoError::Config(format!(
                "Unknown placeholder {{{{{}}}}} in prompt template",
                unknown
            )));
        }
        for required in [CONTEXT, QUESTION] {
            if !names.iter().any(|n| n == required) {
                return Err(SankoError::Config(format!(
                    "Prompt template is missing {{{{{}}}}}",
                    required
                )));
            }
        }

        Ok(Self { template })
    }

    /// Render the prompt. Substituted text is not scanned for placeholders.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::with_capacity(2);
        vars.insert(CONTEXT.to_string(), context.to_string());
        vars.insert(QUESTION.to_string(), question.to_string());
        Prompts::render(&self.template, &vars)
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}
