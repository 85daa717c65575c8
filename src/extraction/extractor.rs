//! Structured extraction through a forced function call

use super::models::{extraction_tool, ContactRecord};
use super::validation::{validate, ValidationReport};
use crate::llm::{ChatMessage, FunctionCallBackend, LlmError, ToolDefinition};
use crate::metrics::METRICS;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const EXTRACTION_INSTRUCTION: &str = "Extract personal info. Use null for missing.";
const REPORT_PREVIEW_CHARS: usize = 50;

/// Extracts a [`ContactRecord`] from free text
pub struct InfoExtractor {
    backend: Arc<dyn FunctionCallBackend>,
    model: String,
    tool: ToolDefinition,
}

impl InfoExtractor {
    pub fn new(backend: Arc<dyn FunctionCallBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            tool: extraction_tool(),
        }
    }

    /// Extract the five contact fields.
    ///
    /// Never fails: any backend or decoding error yields the all-null record.
    pub async fn extract(&self, text: &str) -> ContactRecord {
        match self.try_extract(text).await {
            Ok(record) => {
                METRICS.record_extraction(true);
                debug!("Extracted {} fields", record.extracted_count());
                record
            }
            Err(e) => {
                METRICS.record_extraction(false);
                warn!(error = %e, "Extraction failed, returning empty record");
                ContactRecord::default()
            }
        }
    }

    async fn try_extract(&self, text: &str) -> Result<ContactRecord, LlmError> {
        let messages = vec![
            ChatMessage::system(EXTRACTION_INSTRUCTION),
            ChatMessage::user(format!("Extract from: {}", text)),
        ];

        let arguments = self
            .backend
            .call_function(&messages, &self.model, &self.tool)
            .await?;

        // Derived struct decoding also accepts positional arrays.
        if !arguments.is_object() {
            return Err(LlmError::InvalidResponse(format!(
                "Arguments are not a JSON object: {}",
                arguments
            )));
        }

        serde_json::from_value(arguments)
            .map_err(|e| LlmError::InvalidResponse(format!("Arguments do not match schema: {}", e)))
    }

    pub fn validate(&self, record: &ContactRecord) -> ValidationReport {
        validate(record)
    }

    /// Extract and validate in one step
    pub async fn report(&self, text: &str) -> ExtractionReport {
        let record = self.extract(text).await;
        let validation = validate(&record);
        ExtractionReport {
            text: text.to_string(),
            record,
            validation,
        }
    }
}

/// Source text with its extracted record and validation
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub text: String,
    pub record: ContactRecord,
    pub validation: ValidationReport,
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.text.chars().take(REPORT_PREVIEW_CHARS).collect();
        writeln!(f, "EXTRACTION: {}...", head)?;

        for (field, value) in self.record.reported_fields() {
            match value {
                Some(value) => writeln!(f, "  ✅ {}: {}", field, value)?,
                None => writeln!(f, "  ❌ {}: Not found", field)?,
            }
        }

        write!(
            f,
            "Validation: {}/5 fields, {}",
            self.validation.extracted_count,
            if self.validation.is_valid { "Valid" } else { "Invalid" }
        )?;
        if !self.validation.errors.is_empty() {
            write!(f, "\nErrors: {}", self.validation.errors.join(", "))?;
        }
        if !self.validation.warnings.is_empty() {
            write!(f, "\nWarnings: {}", self.validation.warnings.join(", "))?;
        }
        Ok(())
    }
}
