//! Direct PDF construction with Typst.
//!
//! The Typst source is produced by walking the same [`Document`] the HTML
//! templates use, so every row here is the resolver's string verbatim.

use crate::photo::PhotoFrame;
use crate::record::Record;
use crate::template::{walk, Document, HeaderBlock, LabelColumn, Layout, Row, SectionKind};

use super::common::{image_extension, typst_str};
use super::engine::{TypstJob, TypstRenderEngine};
use super::filename::pdf_filename;
use super::{ExportError, ExportedDocument, Exporter};

const LABEL_WIDTH_PT: u32 = 170;
const COLON_WIDTH_PT: u32 = 15;
const ACCENT: &str = "#8b0000";

/// Photo bytes for the declarative layout, already fetched by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAsset {
    file_name: String,
    bytes: Vec<u8>,
}

impl PhotoAsset {
    /// `None` when the bytes are not an image format Typst can embed.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let extension = image_extension(&bytes)?;
        Some(Self {
            file_name: format!("photo.{extension}"),
            bytes,
        })
    }
}

struct TypstLayout<'a> {
    source: String,
    photo: Option<&'a str>,
}

impl TypstLayout<'_> {
    fn line(&mut self, line: &str) {
        self.source.push_str(line);
        self.source.push('\n');
    }
}

impl Layout for TypstLayout<'_> {
    type Output = String;

    fn begin(&mut self, _doc: &Document, _column: LabelColumn) {
        self.line(r#"#set page(paper: "a4", margin: (x: 18mm, y: 16mm))"#);
        self.line(r#"#set text(font: ("Noto Sans Devanagari", "Noto Sans"), size: 11pt, lang: "mr")"#);
        self.line("#set par(justify: false)");
    }

    fn header(&mut self, header: &HeaderBlock) {
        self.line(&format!(
            "#align(center)[#text(size: 13pt, fill: rgb(\"{}\"), {})]",
            ACCENT,
            typst_str(&header.invocation)
        ));
        self.line(&format!(
            "#align(center)[#text(size: 16pt, weight: \"bold\", {})]",
            typst_str(header.title)
        ));
        self.line(&format!("#line(length: 100%, stroke: 1pt + rgb(\"{ACCENT}\"))"));
    }

    fn photo(&mut self, _url: Option<&str>) {
        // The URL was already turned into an asset; an undecodable photo is skipped.
        if let Some(file) = self.photo {
            let frame = PhotoFrame::print();
            self.line(&format!(
                "#place(top + right, dy: 8pt, box(stroke: 1pt + rgb(\"{}\"), image({}, width: {}pt, height: {}pt, fit: \"cover\")))",
                ACCENT,
                typst_str(file),
                frame.width,
                frame.height
            ));
        }
    }

    fn section_start(&mut self, kind: SectionKind) {
        self.line(&format!(
            "#v(8pt)\n#text(size: 12pt, weight: \"bold\", fill: rgb(\"{}\"), {})",
            ACCENT,
            typst_str(kind.title())
        ));
        if !kind.is_paragraph() {
            self.line(&format!(
                "#grid(columns: ({LABEL_WIDTH_PT}pt, {COLON_WIDTH_PT}pt, 1fr), row-gutter: 6pt,"
            ));
        }
    }

    fn row(&mut self, row: &Row, _column: LabelColumn) {
        self.line(&format!(
            "  {}, \":\", {},",
            typst_str(row.label),
            typst_str(&row.value.text)
        ));
    }

    fn paragraph(&mut self, _kind: SectionKind, text: &str) {
        self.line(&format!("#par({})", typst_str(text)));
    }

    fn section_end(&mut self, kind: SectionKind) {
        if !kind.is_paragraph() {
            self.line(")");
        }
    }

    fn finish(mut self, footer: &str) -> String {
        self.line(&format!(
            "#place(bottom + center, text(size: 8pt, fill: gray, {}))",
            typst_str(footer)
        ));
        self.source
    }
}

/// Typst source and assets for `record`.
pub fn build_job(record: &Record, photo: Option<PhotoAsset>) -> TypstJob {
    let doc = Document::build(record);
    let layout = TypstLayout {
        source: String::new(),
        photo: photo.as_ref().map(|asset| asset.file_name.as_str()),
    };
    let source = walk(layout, &doc);

    let job = TypstJob::new(source);
    match photo {
        Some(asset) => job.with_asset(asset.file_name, asset.bytes),
        None => job,
    }
}

pub struct DeclarativeExporter {
    engine: TypstRenderEngine,
    photo: Option<PhotoAsset>,
}

impl DeclarativeExporter {
    pub fn new(engine: TypstRenderEngine) -> Self {
        Self {
            engine,
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: Option<PhotoAsset>) -> Self {
        self.photo = photo;
        self
    }
}

impl Exporter for DeclarativeExporter {
    fn export(&self, record: &Record) -> Result<ExportedDocument, ExportError> {
        let job = build_job(record, self.photo.clone());
        let pdf = self.engine.render(&job)?;
        log::info!("Declarative export produced {} bytes", pdf.len());
        Ok(ExportedDocument {
            filename: pdf_filename(record),
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LegacyPersonal, PersonalInfo};

    fn scenario() -> Record {
        Record {
            personal_info: Some(PersonalInfo {
                name: Some("राम".into()),
                ..Default::default()
            }),
            legacy_personal: Some(LegacyPersonal {
                full_name: Some("Ram".into()),
                ..Default::default()
            }),
            ..Record::default()
        }
    }

    #[test]
    fn test_name_row_is_the_resolved_string() {
        let job = build_job(&scenario(), None);
        assert!(job.source.contains(r#"  "नाव", ":", "राम","#));
        assert!(!job.source.contains("Ram"));
        assert!(job.source.contains("(170pt, 15pt, 1fr)"));
    }

    #[test]
    fn test_absent_rows_and_sections_are_omitted() {
        let job = build_job(&scenario(), None);
        assert!(!job.source.contains("रक्तगट"));
        assert!(!job.source.contains(SectionKind::EducationCareer.title()));
        assert!(job.source.contains(SectionKind::Personal.title()));
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let record = scenario();
        let photo = PhotoAsset::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);
        let first = build_job(&record, photo.clone());
        let second = build_job(&record, photo);
        assert_eq!(first, second);
    }

    #[test]
    fn test_photo_asset_is_embedded() {
        let photo = PhotoAsset::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]).unwrap();
        let job = build_job(&scenario(), Some(photo));
        assert_eq!(job.assets[0].name, "photo.jpg");
        assert!(job.source.contains(r#"image("photo.jpg", width: 120pt, height: 160pt"#));
        assert!(PhotoAsset::from_bytes(b"not an image".to_vec()).is_none());
    }
}
