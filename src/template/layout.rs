//! Shared traversal over a [`Document`].
//!
//! A presentation variant only decides how a header, a row or a section
//! frame looks. Which rows exist and in what order is fixed by
//! [`Document::build`], so variants cannot drift apart on content.

use super::document::{Document, HeaderBlock, Row, SectionBody, SectionKind};

/// Width of the label column, computed once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelColumn {
    /// Display columns taken by the widest label.
    pub width: usize,
}

impl LabelColumn {
    pub fn for_document(doc: &Document) -> Self {
        let width = doc
            .rows()
            .map(|row| display_width(row.label))
            .max()
            .unwrap_or(0);
        Self { width }
    }

    /// `label` right-padded with spaces to the column width.
    pub fn pad(&self, label: &str) -> String {
        let padding = self.width.saturating_sub(display_width(label));
        format!("{}{}", label, " ".repeat(padding))
    }
}

/// Layout hooks. Every hook is required, so a new variant has to decide
/// what each part of the document looks like.
pub trait Layout {
    type Output;

    fn begin(&mut self, doc: &Document, column: LabelColumn);
    fn header(&mut self, header: &HeaderBlock);
    fn photo(&mut self, url: Option<&str>);
    fn section_start(&mut self, kind: SectionKind);
    fn row(&mut self, row: &Row, column: LabelColumn);
    fn paragraph(&mut self, kind: SectionKind, text: &str);
    fn section_end(&mut self, kind: SectionKind);
    fn finish(self, footer: &str) -> Self::Output;
}

/// Drive `layout` over the document in canonical order.
pub fn walk<L: Layout>(mut layout: L, doc: &Document) -> L::Output {
    let column = LabelColumn::for_document(doc);

    layout.begin(doc, column);
    layout.header(&doc.header);
    layout.photo(doc.photo.as_deref());

    for section in &doc.sections {
        layout.section_start(section.kind);
        match &section.body {
            SectionBody::Rows(rows) => {
                for row in rows {
                    layout.row(row, column);
                }
            }
            SectionBody::Paragraph(text) => layout.paragraph(section.kind, text),
        }
        layout.section_end(section.kind);
    }

    layout.finish(doc.footer)
}

/// Monospace display width. Spacing vowel signs (ा, ि, ी, ो, ौ) and the
/// visarga take a column; signs drawn above or below the consonant (ु, ू,
/// े, ै, anusvara, virama, nukta) do not.
pub fn display_width(text: &str) -> usize {
    text.chars().filter(|c| !is_zero_width(*c)).count()
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c as u32,
        0x0900..=0x0902
            | 0x093A
            | 0x093C
            | 0x0941..=0x0948
            | 0x094D
            | 0x0951..=0x0957
            | 0x0962..=0x0963
            | 0x200C..=0x200D
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `<img>` for a 3:4 photo box, shared by the HTML variants.
pub(crate) fn photo_img(url: &str, class: &str) -> String {
    let frame = crate::photo::PhotoFrame::preview();
    format!(
        r#"<img class="{}" src="{}" alt="photo" style="width:{}px;height:{}px;object-fit:cover" />"#,
        class,
        escape_html(url),
        frame.width,
        frame.height
    )
}
