//! Prompt context: the static inputs every generation prompt is built from.
//!
//! The context is populated once at startup (metadata document, optional
//! fallback schema document, table name, business rules) and then shared
//! read-only behind an `Arc`. It also owns schema assembly: merging a
//! caller-supplied schema (or the fallback) with the stored metadata and
//! rules into a single labeled text block.

use crate::config::PromptConfig;
use crate::error::CoreError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Section markers, emitted in this order by [`PromptContext::build_schema_description`].
const SCHEMA_MARKER: &str = "### SCHEMA DESCRIPTION ###";
const TABLE_MARKER: &str = "### TABLE NAME ###";
const METADATA_MARKER: &str = "### LOCAL METADATA ###";
const RULES_MARKER: &str = "### BUSINESS RULES ###";

/// Static prompt inputs, immutable once startup completes.
#[derive(Debug)]
pub struct PromptContext {
    metadata: Value,
    fallback_schema: Value,
    table_name: Option<String>,
    business_rules: Vec<String>,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            metadata: Value::Object(serde_json::Map::new()),
            fallback_schema: Value::Object(serde_json::Map::new()),
            table_name: None,
            business_rules: Vec::new(),
        }
    }
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fully populated context from the prompt configuration.
    pub fn from_config(cfg: &PromptConfig) -> Result<Self, CoreError> {
        let mut ctx = Self::new();
        ctx.load_metadata(&cfg.metadata_file)?;
        if let Some(path) = &cfg.fallback_schema_file {
            ctx.load_fallback_schema(path)?;
        }
        ctx.set_table_name(&cfg.table_name)?;
        ctx.set_business_rules(cfg.business_rules.clone());
        Ok(ctx)
    }

    /// Load the metadata JSON document from a local file.
    pub fn load_metadata(&mut self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        self.metadata = load_json_document(path.as_ref())?;
        Ok(())
    }

    /// Load the schema document used when the caller supplies none.
    pub fn load_fallback_schema(&mut self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        self.fallback_schema = load_json_document(path.as_ref())?;
        Ok(())
    }

    /// Set the table generated queries run against.
    pub fn set_table_name(&mut self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "table name cannot be empty".to_string(),
            ));
        }
        self.table_name = Some(name.to_string());
        Ok(())
    }

    /// Set the business rules injected into every prompt. An empty list is
    /// valid and yields an empty rules section.
    pub fn set_business_rules(&mut self, rules: Vec<String>) {
        self.business_rules = rules;
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    pub fn fallback_schema(&self) -> &Value {
        &self.fallback_schema
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn business_rules(&self) -> &[String] {
        &self.business_rules
    }

    /// Merge the caller-supplied schema (or the fallback document) with the
    /// stored table name, metadata and business rules into one labeled text
    /// block.
    ///
    /// A blank caller schema is not an error: the fallback document is used
    /// instead and a warning is emitted.
    pub fn build_schema_description(&self, frontend_schema: Option<&str>) -> String {
        let schema_section = match frontend_schema {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => {
                tracing::warn!("frontend schema missing; using fallback schema from local file");
                pretty_json(&self.fallback_schema)
            }
        };

        let mut description = String::new();
        description.push_str(SCHEMA_MARKER);
        description.push('\n');
        description.push_str(&schema_section);
        description.push_str("\n\n");

        description.push_str(TABLE_MARKER);
        description.push('\n');
        description.push_str(self.table_name.as_deref().unwrap_or(""));
        description.push_str("\n\n");

        description.push_str(METADATA_MARKER);
        description.push('\n');
        description.push_str(&pretty_json(&self.metadata));
        description.push_str("\n\n");

        description.push_str(RULES_MARKER);
        description.push('\n');
        for rule in &self.business_rules {
            description.push_str("- ");
            description.push_str(rule);
            description.push('\n');
        }
        description
    }
}

fn load_json_document(path: &Path) -> Result<Value, CoreError> {
    if !path.exists() {
        return Err(CoreError::FileNotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn context_with(table: &str, rules: &[&str]) -> PromptContext {
        let mut ctx = PromptContext::new();
        ctx.set_table_name(table).unwrap();
        ctx.set_business_rules(rules.iter().map(|r| r.to_string()).collect());
        ctx
    }

    #[test]
    fn set_table_name_rejects_empty() {
        let mut ctx = PromptContext::new();
        assert!(matches!(
            ctx.set_table_name(""),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            ctx.set_table_name("   "),
            Err(CoreError::Validation(_))
        ));
        assert!(ctx.table_name().is_none());
    }

    #[test]
    fn set_table_name_stores_value() {
        let mut ctx = PromptContext::new();
        ctx.set_table_name("Orders").unwrap();
        assert_eq!(ctx.table_name(), Some("Orders"));
    }

    #[test]
    fn load_metadata_missing_file() {
        let mut ctx = PromptContext::new();
        let err = ctx.load_metadata("/no/such/file.json").unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound(_)));
    }

    #[test]
    fn load_metadata_rejects_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json at all").unwrap();
        let mut ctx = PromptContext::new();
        let err = ctx.load_metadata(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn load_metadata_reads_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"INVVALUE": "invoice total per row"}}"#).unwrap();
        let mut ctx = PromptContext::new();
        ctx.load_metadata(file.path()).unwrap();
        assert_eq!(
            ctx.metadata()["INVVALUE"],
            Value::String("invoice total per row".to_string())
        );
    }

    #[test]
    fn description_uses_frontend_schema_verbatim() {
        let ctx = context_with("invoices", &[]);
        let schema = "CREATE TABLE invoices (id int, total numeric)";
        let description = ctx.build_schema_description(Some(schema));
        assert!(description.contains(schema));
    }

    #[test]
    fn blank_frontend_schema_falls_back() {
        let mut ctx = context_with("invoices", &[]);
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"columns": ["id", "total"]}}"#).unwrap();
        ctx.load_fallback_schema(file.path()).unwrap();

        for input in [None, Some(""), Some("   \n")] {
            let description = ctx.build_schema_description(input);
            assert!(description.contains(r#""columns""#), "input {input:?}");
        }
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let ctx = context_with("invoices", &["rule one"]);
        let description = ctx.build_schema_description(Some("schema text"));

        let positions: Vec<usize> = [SCHEMA_MARKER, TABLE_MARKER, METADATA_MARKER, RULES_MARKER]
            .iter()
            .map(|marker| description.find(marker).expect(marker))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sections_survive_empty_sources() {
        // No metadata, no fallback loaded, no rules: markers still present.
        let ctx = context_with("invoices", &[]);
        let description = ctx.build_schema_description(None);
        for marker in [SCHEMA_MARKER, TABLE_MARKER, METADATA_MARKER, RULES_MARKER] {
            assert!(description.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn rules_render_as_bullets() {
        let ctx = context_with("invoices", &["use SUM(INVVALUE)", "ignore repeated totals"]);
        let description = ctx.build_schema_description(Some("s"));
        assert!(description.contains("- use SUM(INVVALUE)\n"));
        assert!(description.contains("- ignore repeated totals\n"));
    }

    #[test]
    fn empty_rules_yield_empty_section() {
        let ctx = context_with("invoices", &[]);
        let description = ctx.build_schema_description(Some("s"));
        let rules_at = description.find(RULES_MARKER).unwrap();
        let after = &description[rules_at + RULES_MARKER.len()..];
        assert_eq!(after.trim(), "");
    }

    #[test]
    fn from_config_populates_everything() {
        let mut meta = NamedTempFile::new().unwrap();
        write!(meta, r#"{{"k": 1}}"#).unwrap();
        let cfg = PromptConfig {
            metadata_file: meta.path().to_path_buf(),
            fallback_schema_file: None,
            table_name: "invoices".to_string(),
            business_rules: vec!["r1".to_string()],
        };
        let ctx = PromptContext::from_config(&cfg).unwrap();
        assert_eq!(ctx.table_name(), Some("invoices"));
        assert_eq!(ctx.business_rules(), ["r1".to_string()]);
        assert_eq!(ctx.metadata()["k"], Value::from(1));
    }

    #[test]
    fn from_config_requires_table_name() {
        let mut meta = NamedTempFile::new().unwrap();
        write!(meta, "{{}}").unwrap();
        let cfg = PromptConfig {
            metadata_file: meta.path().to_path_buf(),
            ..Default::default()
        };
        assert!(matches!(
            PromptContext::from_config(&cfg),
            Err(CoreError::Validation(_))
        ));
    }
}
