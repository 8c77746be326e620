//! Download filenames derived from the resolved display name.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::record::Record;
use crate::resolve::{resolve_source, LogicalField};

pub const FALLBACK_STEM: &str = "biodata";

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static pattern");
}

/// Name with whitespace runs collapsed to `_` and filename-illegal
/// characters removed. `None` when no usable name resolves.
fn name_stem(record: &Record) -> Option<String> {
    let (_, name) = resolve_source(record, LogicalField::Name)?;
    let collapsed = WHITESPACE.replace_all(name.trim(), "_");
    let stem = sanitize_filename::sanitize(collapsed.as_ref());
    if stem.trim_matches('_').is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// `<Name>_biodata.pdf`, or `biodata.pdf` without a name.
pub fn pdf_filename(record: &Record) -> String {
    match name_stem(record) {
        Some(stem) => format!("{stem}_{FALLBACK_STEM}.pdf"),
        None => format!("{FALLBACK_STEM}.pdf"),
    }
}

/// `<Name>_<YYYY-MM-DD>.pdf`, or `biodata_<YYYY-MM-DD>.pdf` without a name.
pub fn dated_pdf_filename(record: &Record, date: NaiveDate) -> String {
    let stem = name_stem(record).unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{}_{}.pdf", stem, date.format("%Y-%m-%d"))
}
