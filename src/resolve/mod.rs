//! Field resolver - picks the display value of a logical field across the
//! two schema generations.
//!
//! Every renderer and exporter goes through [`resolve`]; nothing else reads
//! record fields for display. When both generations hold conflicting values
//! the first source in the table wins silently.

mod fields;
mod time;

pub use fields::{
    FieldSpec, Generation, LogicalField, SourcePath, ValueFormat, DEFAULT_INVOCATION,
    FIELD_TABLE, NOT_AVAILABLE,
};
pub use time::format_time;

use serde::Serialize;

use crate::record::Record;

/// What a layout should print for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayValue {
    pub text: String,
    /// True when `text` is the configured placeholder rather than record data.
    pub placeholder: bool,
}

impl DisplayValue {
    fn data(text: String) -> Self {
        Self {
            text,
            placeholder: false,
        }
    }

    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            placeholder: true,
        }
    }
}

/// First present source value, formatted, without falling back to the
/// placeholder. Also reports which path supplied it.
pub fn resolve_source(record: &Record, field: LogicalField) -> Option<(SourcePath, String)> {
    let spec = field.spec();
    spec.sources.iter().find_map(|source| {
        source.extract(record).map(|raw| {
            let value = match spec.format {
                ValueFormat::Text => raw.into_owned(),
                ValueFormat::Time => format_time(&raw),
            };
            (*source, value)
        })
    })
}

/// Display value of `field`, or `None` when nothing should be rendered.
pub fn resolve(record: &Record, field: LogicalField) -> Option<DisplayValue> {
    match resolve_source(record, field) {
        Some((_, value)) => Some(DisplayValue::data(value)),
        None => field.spec().placeholder.map(DisplayValue::placeholder),
    }
}

/// Shorthand for callers that only need the text.
pub fn resolve_text(record: &Record, field: LogicalField) -> Option<String> {
    resolve(record, field).map(|value| value.text)
}
