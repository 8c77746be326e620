//! Card-based layout. Each section is a card; rows are grid lines sharing
//! one label track width.

use super::document::{Document, HeaderBlock, Row, SectionKind};
use super::layout::{escape_html, photo_img, Layout, LabelColumn};

#[derive(Default)]
pub struct Modern {
    html: String,
}

impl Layout for Modern {
    type Output = String;

    fn begin(&mut self, _doc: &Document, column: LabelColumn) {
        self.html.push_str(&format!(
            r#"<div id="biodata-preview" class="biodata modern" style="--label-width:{}ch">"#,
            column.width + 2
        ));
    }

    fn header(&mut self, header: &HeaderBlock) {
        self.html.push_str(r#"<header class="banner">"#);
        if let Some(image) = &header.deity_image {
            self.html.push_str(&format!(
                r#"<img class="deity" src="{}" alt="deity" />"#,
                escape_html(image)
            ));
        }
        self.html.push_str(&format!(
            r#"<p class="invocation">{}</p><h1>{}</h1></header>"#,
            escape_html(&header.invocation),
            escape_html(header.title)
        ));
    }

    fn photo(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            self.html.push_str(&format!(
                r#"<div class="card photo-card">{}</div>"#,
                photo_img(url, "photo rounded")
            ));
        }
    }

    fn section_start(&mut self, kind: SectionKind) {
        self.html.push_str(&format!(
            r#"<div class="card"><h2>{} <small>{}</small></h2>"#,
            escape_html(kind.title()),
            escape_html(kind.title_en())
        ));
    }

    fn row(&mut self, row: &Row, _column: LabelColumn) {
        let class = if row.value.placeholder {
            "row empty"
        } else {
            "row"
        };
        self.html.push_str(&format!(
            r#"<div class="{}" style="display:grid;grid-template-columns:var(--label-width) 2ch 1fr"><span class="label">{}</span><span class="colon">:</span><span class="value">{}</span></div>"#,
            class,
            escape_html(row.label),
            escape_html(&row.value.text)
        ));
    }

    fn paragraph(&mut self, _kind: SectionKind, text: &str) {
        self.html.push_str(&format!(
            r#"<p class="about">{}</p>"#,
            escape_html(text).replace('\n', "<br />")
        ));
    }

    fn section_end(&mut self, _kind: SectionKind) {
        self.html.push_str("</div>");
    }

    fn finish(mut self, footer: &str) -> String {
        self.html.push_str(&format!(
            r#"<footer class="muted">{}</footer></div>"#,
            escape_html(footer)
        ));
        self.html
    }
}
