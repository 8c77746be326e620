//! Template renderer.
//!
//! A record is resolved once into a [`Document`] and then laid out by one of
//! the closed set of [`TemplateStyle`]s.

mod document;
mod layout;
mod modern;
mod photo;
mod plain;
mod traditional;

pub use document::{
    Document, HeaderBlock, Row, Section, SectionBody, SectionKind, DOCUMENT_TITLE, FOOTER_TEXT,
};
pub use layout::{display_width, escape_html, walk, LabelColumn, Layout};
pub use plain::BLANK;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TemplateStyle {
    #[serde(rename = "template-1")]
    Traditional,
    #[serde(rename = "template-2")]
    Modern,
    #[serde(rename = "template-3")]
    Photo,
    #[serde(rename = "template-4")]
    Plain,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 4] = [
        TemplateStyle::Traditional,
        TemplateStyle::Modern,
        TemplateStyle::Photo,
        TemplateStyle::Plain,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Traditional => "template-1",
            Self::Modern => "template-2",
            Self::Photo => "template-3",
            Self::Plain => "template-4",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Traditional => "Traditional",
            Self::Modern => "Modern",
            Self::Photo => "Photo Frame",
            Self::Plain => "Plain Text",
        }
    }

    /// Unknown ids fall back to the traditional layout.
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|style| style.id() == id)
            .unwrap_or_else(|| {
                log::debug!("Unknown template id '{}', using {}", id, Self::Traditional.id());
                Self::Traditional
            })
    }

    pub fn for_record(record: &Record) -> Self {
        Self::from_id(&record.template_id)
    }
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self::Traditional
    }
}

/// Render `record` as an HTML fragment rooted at `#biodata-preview`.
pub fn render(record: &Record, style: TemplateStyle) -> String {
    render_document(&Document::build(record), style)
}

pub fn render_document(doc: &Document, style: TemplateStyle) -> String {
    match style {
        TemplateStyle::Traditional => walk(traditional::Traditional::default(), doc),
        TemplateStyle::Modern => walk(modern::Modern::default(), doc),
        TemplateStyle::Photo => walk(photo::Bordered::default(), doc),
        TemplateStyle::Plain => format!(
            r#"<div id="biodata-preview" class="biodata plain"><pre>{}</pre></div>"#,
            escape_html(&walk(plain::Plain::default(), doc))
        ),
    }
}

/// Plain-text body of the fill-in-the-blank layout.
pub fn render_text(record: &Record) -> String {
    walk(plain::Plain::default(), &Document::build(record))
}
