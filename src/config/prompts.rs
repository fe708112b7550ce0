//! Prompt templates for vidask.
//!
//! Templates use `{name}` placeholders. They can be customized by placing `summary.toml`
//! or `qa.toml` (each with a single `template` key) in the custom prompts directory.

use crate::error::{Result, VidaskError};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("Invalid regex"));

/// Default summary prompt.
pub const SUMMARY_TEMPLATE: &str = r#"You are a helpful AI assistant. Your task is to provide a concise, single-paragraph summary of the provided YouTube video transcript.
Focus on the main topics and key points of the video.

Please summarize the following transcript:

{transcript}"#;

/// Default question-answering prompt.
pub const QA_TEMPLATE: &str = r#"You are an expert Q&A assistant. Use the provided context from a video transcript to answer the question accurately.
If the answer is not available in the context, clearly state that.

Context: {context}

Question: {question}

Answer:"#;

/// The two prompt templates plus user-defined variables.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub summary: String,
    pub qa: String,
    /// Custom variables from config, available in all prompts.
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            summary: SUMMARY_TEMPLATE.to_string(),
            qa: QA_TEMPLATE.to_string(),
            variables: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct PromptFile {
    template: String,
}

impl Prompts {
    /// Load prompts, optionally overriding them from a custom directory.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str::<PromptFile>(&content)?.template;
            }

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str::<PromptFile>(&content)?.template;
            }
        }

        Ok(prompts)
    }

    /// Check that each template carries the placeholders it is rendered with.
    pub fn validate(&self) -> Result<()> {
        require_placeholders("summary", &self.summary, &["transcript"])?;
        require_placeholders("qa", &self.qa, &["context", "question"])?;
        Ok(())
    }

    /// Render the summary prompt for a transcript.
    pub fn render_summary(&self, transcript: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        self.render_with_custom(&self.summary, &vars)
    }

    /// Render the question-answering prompt.
    pub fn render_qa(&self, context: &str, question: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.render_with_custom(&self.qa, &vars)
    }

    /// Substitute every `{name}` placeholder in a single pass.
    ///
    /// Fails if the template names a placeholder with no value.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String> {
        let missing: Vec<&str> = placeholders(template)
            .into_iter()
            .filter(|name| !vars.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(VidaskError::Template(format!(
                "no value for placeholder(s): {}",
                missing.join(", ")
            )));
        }

        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Render with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String> {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

/// Names of the placeholders in a template, in order of first appearance.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn require_placeholders(name: &str, template: &str, required: &[&str]) -> Result<()> {
    let found = placeholders(template);
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|r| !found.contains(r))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(VidaskError::Template(format!(
            "{} template is missing placeholder(s): {}",
            name,
            missing
                .iter()
                .map(|m| format!("{{{}}}", m))
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts_are_valid() {
        let prompts = Prompts::default();
        assert!(prompts.validate().is_ok());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {name}, you have {count} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars).unwrap();
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_missing_placeholder_fails() {
        let vars = HashMap::new();
        let err = Prompts::render("Summarize {transcript}", &vars).unwrap_err();
        assert!(matches!(err, VidaskError::Template(_)));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let prompts = Prompts::default();
        let rendered = prompts.render_qa("the {question} token", "why?").unwrap();
        assert!(rendered.contains("Context: the {question} token"));
        assert!(rendered.contains("Question: why?"));
    }

    #[test]
    fn test_custom_variables() {
        let mut prompts = Prompts::default();
        prompts.summary = "As a {persona}, summarize: {transcript}".to_string();
        prompts
            .variables
            .insert("persona".to_string(), "tutor".to_string());

        let rendered = prompts.render_summary("text").unwrap();
        assert_eq!(rendered, "As a tutor, summarize: text");
    }

    #[test]
    fn test_validate_detects_missing_question() {
        let prompts = Prompts {
            qa: "Context: {context}".to_string(),
            ..Prompts::default()
        };
        let err = prompts.validate().unwrap_err();
        assert!(err.to_string().contains("{question}"));
    }

    #[test]
    fn test_load_from_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("qa.toml"),
            "template = \"Q: {question}\\nC: {context}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.qa, "Q: {question}\nC: {context}");
        assert_eq!(prompts.summary, SUMMARY_TEMPLATE);
        assert!(prompts.validate().is_ok());
    }
}
