//! Contact-field extraction and validation

pub mod extractor;
pub mod models;
pub mod validation;

pub use extractor::{ExtractionReport, InfoExtractor};
pub use models::{AgeValue, ContactRecord};
pub use validation::{validate, ValidationReport};
