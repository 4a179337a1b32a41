//! SQL generation: prompt rendering, model invocation and statement
//! extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlpilot_core::PromptContext;
use std::sync::Arc;

pub mod client;
pub mod error;

pub use client::{ChatModel, GroqClient};
pub use error::LlmError;

/// First case-insensitive `SELECT ... ;` statement in a model reply,
/// spanning newlines.
static SELECT_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)SELECT.*?;").expect("select pattern is valid"));

/// Turns a natural-language question into a SQL statement via a chat model.
pub struct SqlGenerator {
    model: Arc<dyn ChatModel>,
    context: Arc<PromptContext>,
}

impl SqlGenerator {
    pub fn new(model: Arc<dyn ChatModel>, context: Arc<PromptContext>) -> Self {
        Self { model, context }
    }

    /// Render the full instruction prompt for a question.
    pub fn render_prompt(&self, frontend_schema: Option<&str>, question: &str) -> String {
        let schema = self.context.build_schema_description(frontend_schema);
        format!(
            "You are an expert SQL generator.\n\
             \n\
             Use the combined schema + metadata + business rules:\n\
             \n\
             {schema}\n\
             \n\
             User Question:\n\
             {question}\n\
             \n\
             Return ONLY a valid SQL query ending with a semicolon.\n\
             No explanation. No markdown.\n"
        )
    }

    /// Generate SQL for a question. Model errors propagate; a reply without
    /// a recognizable statement is returned trimmed as-is.
    pub async fn generate_sql(
        &self,
        frontend_schema: Option<&str>,
        question: &str,
    ) -> Result<String, LlmError> {
        let prompt = self.render_prompt(frontend_schema, question);
        tracing::debug!(model = self.model.name(), "requesting SQL generation");
        let reply = self.model.complete(&prompt).await?;
        Ok(extract_select(&reply))
    }
}

/// Best-effort extraction of the generated statement: the first
/// `SELECT ... ;` match, or the trimmed full reply when nothing matches.
pub fn extract_select(reply: &str) -> String {
    match SELECT_STATEMENT.find(reply) {
        Some(found) => found.as_str().trim().to_string(),
        None => reply.trim().to_string(),
    }
}
